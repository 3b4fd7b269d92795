//! InMemory Stream Repository 実装
//!
//! ドメイン層が定義する StreamRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。メッセージ ID は
//! 全ストリーム共通の連番で採番します。

use std::collections::HashMap;

use async_trait::async_trait;
use streamchat_shared::dto::{Author, ChatMessage, Stream, StreamSnapshot};
use tokio::sync::Mutex;

use crate::domain::{AuthorId, MessageContent, RepositoryError, StreamRepository};

struct Store {
    streams: HashMap<i64, StreamSnapshot>,
    next_message_id: i64,
}

/// インメモリ Stream Repository 実装
pub struct InMemoryStreamRepository {
    store: Mutex<Store>,
}

impl InMemoryStreamRepository {
    /// チャット履歴が空のストリームで初期化
    pub fn new(streams: Vec<Stream>) -> Self {
        let streams = streams
            .into_iter()
            .map(|stream| {
                (
                    stream.id,
                    StreamSnapshot {
                        stream,
                        messages: Vec::new(),
                    },
                )
            })
            .collect();

        Self {
            store: Mutex::new(Store {
                streams,
                next_message_id: 1,
            }),
        }
    }
}

#[async_trait]
impl StreamRepository for InMemoryStreamRepository {
    async fn find_stream(&self, stream_id: i64) -> Result<StreamSnapshot, RepositoryError> {
        let store = self.store.lock().await;
        store
            .streams
            .get(&stream_id)
            .cloned()
            .ok_or(RepositoryError::StreamNotFound(stream_id))
    }

    async fn add_message(
        &self,
        stream_id: i64,
        author: AuthorId,
        avatar: Option<String>,
        content: MessageContent,
        client_token: Option<String>,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut store = self.store.lock().await;
        let id = store.next_message_id;
        let snapshot = store
            .streams
            .get_mut(&stream_id)
            .ok_or(RepositoryError::StreamNotFound(stream_id))?;

        let message = ChatMessage {
            id,
            message: content.into_string(),
            user: Author {
                id: author.value(),
                avatar,
            },
            client_token,
        };
        snapshot.messages.push(message.clone());
        store.next_message_id += 1;

        Ok(message)
    }
}
