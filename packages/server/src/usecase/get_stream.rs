//! UseCase: ストリーム取得処理

use std::sync::Arc;

use streamchat_shared::dto::StreamSnapshot;

use crate::domain::StreamRepository;

use super::error::GetStreamError;

/// ストリーム取得のユースケース
pub struct GetStreamUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn StreamRepository>,
}

impl GetStreamUseCase {
    /// 新しい GetStreamUseCase を作成
    pub fn new(repository: Arc<dyn StreamRepository>) -> Self {
        Self { repository }
    }

    /// ストリームとチャット履歴を取得
    pub async fn execute(&self, stream_id: i64) -> Result<StreamSnapshot, GetStreamError> {
        Ok(self.repository.find_stream(stream_id).await?)
    }
}
