//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use streamchat_shared::dto::{ChatMessage, StreamSnapshot};

use super::{AuthorId, MessageContent, RepositoryError};

/// Stream Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamRepository: Send + Sync {
    /// ストリームとチャット履歴を取得
    async fn find_stream(&self, stream_id: i64) -> Result<StreamSnapshot, RepositoryError>;

    /// メッセージを末尾に追加し、採番済みのメッセージを返す
    async fn add_message(
        &self,
        stream_id: i64,
        author: AuthorId,
        avatar: Option<String>,
        content: MessageContent,
        client_token: Option<String>,
    ) -> Result<ChatMessage, RepositoryError>;
}
