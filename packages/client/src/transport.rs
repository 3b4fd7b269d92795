//! HTTP access to the stream endpoints.
//!
//! [`StreamApi`] is the seam between the synchronization core and the network.
//! [`HttpStreamApi`] implements it with `reqwest`.

use async_trait::async_trait;
use reqwest::StatusCode;
use streamchat_shared::dto::{
    SendMessageRequest, SendMessageResponse, StreamResponse, USER_ID_HEADER,
};

use crate::{
    domain::{StreamId, Viewer},
    error::ClientError,
};

/// Fetch and write contracts consumed by the client
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamApi: Send + Sync {
    /// `GET /streams/{id}`
    async fn fetch_stream(&self, stream_id: StreamId) -> Result<StreamResponse, ClientError>;

    /// `POST /streams/{id}/messages`
    async fn post_message(
        &self,
        stream_id: StreamId,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, ClientError>;
}

/// `reqwest` implementation of [`StreamApi`]
#[derive(Debug, Clone)]
pub struct HttpStreamApi {
    client: reqwest::Client,
    base_url: String,
    viewer_id: Option<i64>,
}

impl HttpStreamApi {
    /// Create a new API client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Server origin, e.g. "http://127.0.0.1:8080"
    /// * `viewer` - Signed-in viewer; writes carry its id in the `x-user-id` header
    pub fn new(base_url: impl Into<String>, viewer: Option<&Viewer>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            viewer_id: viewer.map(|v| v.id),
        }
    }

    fn stream_url(&self, stream_id: StreamId) -> String {
        format!("{}/streams/{}", self.base_url, stream_id)
    }
}

#[async_trait]
impl StreamApi for HttpStreamApi {
    async fn fetch_stream(&self, stream_id: StreamId) -> Result<StreamResponse, ClientError> {
        let response = self.client.get(self.stream_url(stream_id)).send().await?;
        let status = response.status();

        // The server reports a missing stream as 404 with `{ok:false}`
        match response.json::<StreamResponse>().await {
            Ok(body) => Ok(body),
            Err(_) if !status.is_success() => Err(ClientError::UnexpectedStatus(status.as_u16())),
            Err(e) => Err(e.into()),
        }
    }

    async fn post_message(
        &self,
        stream_id: StreamId,
        request: SendMessageRequest,
    ) -> Result<SendMessageResponse, ClientError> {
        let url = format!("{}/messages", self.stream_url(stream_id));
        let mut builder = self.client.post(url).json(&request);
        if let Some(viewer_id) = self.viewer_id {
            builder = builder.header(USER_ID_HEADER, viewer_id.to_string());
        }

        let response = builder.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus(status.as_u16()));
        }

        Ok(response.json::<SendMessageResponse>().await?)
    }
}
