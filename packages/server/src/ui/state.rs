//! Server state shared by the handlers.

use std::sync::Arc;

use crate::usecase::{GetStreamUseCase, SendMessageUseCase};

/// Shared application state
pub struct AppState {
    /// GetStreamUseCase（ストリーム取得のユースケース）
    pub get_stream_usecase: Arc<GetStreamUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
}
