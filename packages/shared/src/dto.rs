//! JSON wire shapes shared by the client and the server.
//!
//! A stream snapshot is sent as the stream's own fields with the chat
//! `messages` list next to them:
//!
//! ```text
//! { "ok": true,
//!   "stream": { "id": 1, "name": "A", "price": 100, "description": "d",
//!               "messages": [ { "id": 1, "message": "hi", "user": { "id": 9 } } ] } }
//! ```

use serde::{Deserialize, Serialize};

/// Stream metadata. Read-only from the client's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub description: String,
}

/// Reference to a message author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Author {
    /// Author used for messages written while not signed in.
    pub fn anonymous() -> Self {
        Self {
            id: 0,
            avatar: None,
        }
    }
}

/// A single chat message as displayed in the stream's chat panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub message: String,
    pub user: Author,
    /// Token generated by the sending client, echoed back on the persisted copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
}

/// A stream together with its chat history, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    #[serde(flatten)]
    pub stream: Stream,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Response body of `GET /streams/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamSnapshot>,
}

impl StreamResponse {
    pub fn found(stream: StreamSnapshot) -> Self {
        Self {
            ok: true,
            stream: Some(stream),
        }
    }

    pub fn not_found() -> Self {
        Self {
            ok: false,
            stream: None,
        }
    }

    /// The snapshot to display, if this response carries a usable one.
    pub fn into_snapshot(self) -> Option<StreamSnapshot> {
        if self.ok { self.stream } else { None }
    }
}

/// Request body of `POST /streams/{id}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
    /// Avatar of the author, stored with the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Response body of `POST /streams/{id}/messages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub ok: bool,
}

/// Header carrying the author id on writes.
pub const USER_ID_HEADER: &str = "x-user-id";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_response_parses_flattened_snapshot() {
        // テスト項目: ストリームのフィールドとメッセージが同じ階層にある JSON をパースできる
        // given (前提条件):
        let json = r#"{
            "ok": true,
            "stream": {
                "id": 1, "name": "A", "price": 100, "description": "d",
                "messages": [{"id": 1, "message": "hi", "user": {"id": 9}}]
            }
        }"#;

        // when (操作):
        let response: StreamResponse = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        let snapshot = response.into_snapshot().unwrap();
        assert_eq!(snapshot.stream.name, "A");
        assert_eq!(snapshot.stream.price, 100);
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].user.id, 9);
        assert_eq!(snapshot.messages[0].user.avatar, None);
        assert_eq!(snapshot.messages[0].client_token, None);
    }

    #[test]
    fn test_not_ok_response_yields_no_snapshot() {
        // テスト項目: ok=false のレスポンスはストリームを含んでいても表示対象にならない
        // given (前提条件):
        let json = r#"{
            "ok": false,
            "stream": {"id": 1, "name": "A", "price": 1, "description": "", "messages": []}
        }"#;

        // when (操作):
        let response: StreamResponse = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert!(response.into_snapshot().is_none());
    }

    #[test]
    fn test_not_found_response_omits_stream() {
        // テスト項目: not_found レスポンスは stream フィールドを出力しない
        // given (前提条件):
        let response = StreamResponse::not_found();

        // when (操作):
        let json = serde_json::to_string(&response).unwrap();

        // then (期待する結果):
        assert_eq!(json, r#"{"ok":false}"#);
    }

    #[test]
    fn test_send_message_request_without_token() {
        // テスト項目: client_token なしのリクエストは message のみ出力される
        // given (前提条件):
        let request = SendMessageRequest {
            message: "yo".to_string(),
            client_token: None,
            avatar: None,
        };

        // when (操作):
        let json = serde_json::to_string(&request).unwrap();

        // then (期待する結果):
        assert_eq!(json, r#"{"message":"yo"}"#);
    }
}
