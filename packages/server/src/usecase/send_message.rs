//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 認証・本文の検証と、Repository へのメッセージ追加
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージがチャット履歴の末尾に追加される
//! - 異常系：未ログイン、空メッセージ、存在しないストリーム

use std::sync::Arc;

use streamchat_shared::dto::{ChatMessage, SendMessageRequest};

use crate::domain::{AuthorId, MessageContent, StreamRepository};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn StreamRepository>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(repository: Arc<dyn StreamRepository>) -> Self {
        Self { repository }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `stream_id` - 送信先のストリーム ID
    /// * `user_id` - 送信者のユーザー ID（未ログインの場合は None）
    /// * `request` - クライアントから受け取ったリクエスト
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 採番済みの保存されたメッセージ
    /// * `Err(SendMessageError)` - 送信失敗
    pub async fn execute(
        &self,
        stream_id: i64,
        user_id: Option<i64>,
        request: SendMessageRequest,
    ) -> Result<ChatMessage, SendMessageError> {
        let author = user_id
            .and_then(|id| AuthorId::new(id).ok())
            .ok_or(SendMessageError::Unauthenticated)?;
        let content =
            MessageContent::new(request.message).map_err(SendMessageError::InvalidMessage)?;

        let message = self
            .repository
            .add_message(
                stream_id,
                author,
                request.avatar,
                content,
                request.client_token,
            )
            .await?;

        tracing::debug!(
            "Message {} added to stream {} by user {}",
            message.id,
            stream_id,
            author.value()
        );
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockStreamRepository, RepositoryError, ValueObjectError},
        infrastructure::repository::InMemoryStreamRepository,
    };
    use streamchat_shared::dto::Stream;

    fn create_test_repository() -> Arc<InMemoryStreamRepository> {
        Arc::new(InMemoryStreamRepository::new(vec![Stream {
            id: 1,
            name: "A".to_string(),
            price: 100,
            description: "d".to_string(),
        }]))
    }

    fn create_test_request(text: &str, token: Option<&str>) -> SendMessageRequest {
        SendMessageRequest {
            message: text.to_string(),
            client_token: token.map(str::to_string),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn test_send_message_success() {
        // テスト項目: メッセージがチャット履歴の末尾に追加され、トークンが保持される
        // given (前提条件):
        let repository = create_test_repository();
        let usecase = SendMessageUseCase::new(repository.clone());

        // when (操作):
        let result = usecase
            .execute(1, Some(5), create_test_request("yo", Some("abc")))
            .await;

        // then (期待する結果):
        let message = result.unwrap();
        assert_eq!(message.id, 1);
        assert_eq!(message.user.id, 5);
        assert_eq!(message.client_token.as_deref(), Some("abc"));

        let snapshot = repository.find_stream(1).await.unwrap();
        assert_eq!(snapshot.messages, vec![message]);
    }

    #[tokio::test]
    async fn test_send_message_keeps_avatar() {
        // テスト項目: リクエストのアバターが保存されたメッセージの作成者に含まれる
        // given (前提条件):
        let repository = create_test_repository();
        let usecase = SendMessageUseCase::new(repository);
        let request = SendMessageRequest {
            avatar: Some("cat.png".to_string()),
            ..create_test_request("yo", Some("abc"))
        };

        // when (操作):
        let result = usecase.execute(1, Some(5), request).await;

        // then (期待する結果):
        let user = result.unwrap().user;
        assert_eq!(user.id, 5);
        assert_eq!(user.avatar.as_deref(), Some("cat.png"));
    }

    #[tokio::test]
    async fn test_send_message_unauthenticated() {
        // テスト項目: 未ログインの場合、Repository に触れずにエラーが返される
        // given (前提条件):
        let mut repository = MockStreamRepository::new();
        repository.expect_add_message().times(0);
        let usecase = SendMessageUseCase::new(Arc::new(repository));

        // when (操作):
        let anonymous = usecase
            .execute(1, None, create_test_request("yo", None))
            .await;
        let invalid = usecase
            .execute(1, Some(0), create_test_request("yo", None))
            .await;

        // then (期待する結果):
        assert_eq!(anonymous, Err(SendMessageError::Unauthenticated));
        assert_eq!(invalid, Err(SendMessageError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_send_message_empty() {
        // テスト項目: 空のメッセージは保存されない
        // given (前提条件):
        let repository = create_test_repository();
        let usecase = SendMessageUseCase::new(repository.clone());

        // when (操作):
        let result = usecase
            .execute(1, Some(5), create_test_request("", None))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(SendMessageError::InvalidMessage(ValueObjectError::EmptyMessage))
        );
        assert!(repository.find_stream(1).await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_send_message_unknown_stream() {
        // テスト項目: 存在しないストリームへの送信は StreamNotFound になる
        // given (前提条件):
        let mut repository = MockStreamRepository::new();
        repository
            .expect_add_message()
            .times(1)
            .returning(|id, _, _, _, _| Err(RepositoryError::StreamNotFound(id)));
        let usecase = SendMessageUseCase::new(Arc::new(repository));

        // when (操作):
        let result = usecase
            .execute(7, Some(5), create_test_request("yo", None))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(SendMessageError::StreamNotFound(7)));
    }
}
