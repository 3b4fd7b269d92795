//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use streamchat_shared::dto::{
    SendMessageRequest, SendMessageResponse, StreamResponse, USER_ID_HEADER,
};

use crate::{
    ui::state::AppState,
    usecase::{GetStreamError, SendMessageError},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get a stream with its chat messages
pub async fn get_stream(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<i64>,
) -> (StatusCode, Json<StreamResponse>) {
    match state.get_stream_usecase.execute(stream_id).await {
        Ok(snapshot) => (StatusCode::OK, Json(StreamResponse::found(snapshot))),
        Err(GetStreamError::StreamNotFound(_)) => {
            (StatusCode::NOT_FOUND, Json(StreamResponse::not_found()))
        }
    }
}

/// Append a chat message to a stream
///
/// The author is taken from the `x-user-id` header.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<i64>,
    headers: HeaderMap,
    Json(request): Json<SendMessageRequest>,
) -> (StatusCode, Json<SendMessageResponse>) {
    let user_id = user_id_from_headers(&headers);

    match state
        .send_message_usecase
        .execute(stream_id, user_id, request)
        .await
    {
        Ok(_) => (StatusCode::OK, Json(SendMessageResponse { ok: true })),
        Err(e) => {
            tracing::warn!("Rejected message for stream {}: {}", stream_id, e);
            let status = match e {
                SendMessageError::Unauthenticated => StatusCode::UNAUTHORIZED,
                SendMessageError::InvalidMessage(_) => StatusCode::BAD_REQUEST,
                SendMessageError::StreamNotFound(_) => StatusCode::NOT_FOUND,
            };
            (status, Json(SendMessageResponse { ok: false }))
        }
    }
}

fn user_id_from_headers(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
