//! Domain error types.

use thiserror::Error;

/// Errors raised by a [`super::StreamRepository`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Stream {0} not found")]
    StreamNotFound(i64),
}

/// Validation errors of value objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("Message content must not be empty")]
    EmptyMessage,

    #[error("Message content is too long ({len} > {max} characters)")]
    MessageTooLong { len: usize, max: usize },

    #[error("Author id must be positive, got {0}")]
    InvalidAuthorId(i64),
}
