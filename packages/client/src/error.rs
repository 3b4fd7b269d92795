//! Error types for the streamchat client.

use thiserror::Error;

/// Transport and dispatch errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP request could not be completed or its body could not be decoded
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a status the client does not accept
    #[error("Server responded with status {0}")]
    UnexpectedStatus(u16),

    /// The write queue has been torn down
    #[error("Message dispatcher is closed")]
    DispatcherClosed,
}

/// Reasons a chat submission is rejected before anything is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("No stream is selected")]
    NoStream,

    #[error("Failed to queue message: {0}")]
    Dispatch(String),
}
