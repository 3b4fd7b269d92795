//! UseCase error types.

use thiserror::Error;

use crate::domain::{RepositoryError, ValueObjectError};

/// Errors of [`super::GetStreamUseCase`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetStreamError {
    #[error("Stream {0} not found")]
    StreamNotFound(i64),
}

impl From<RepositoryError> for GetStreamError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::StreamNotFound(id) => Self::StreamNotFound(id),
        }
    }
}

/// Errors of [`super::SendMessageUseCase`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// The request carried no valid user id
    #[error("Sign in to send messages")]
    Unauthenticated,

    #[error("Invalid message: {0}")]
    InvalidMessage(ValueObjectError),

    #[error("Stream {0} not found")]
    StreamNotFound(i64),
}

impl From<RepositoryError> for SendMessageError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::StreamNotFound(id) => Self::StreamNotFound(id),
        }
    }
}
