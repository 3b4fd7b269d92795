//! UseCase layer: application operations built on the repository.

mod error;
mod get_stream;
mod send_message;

pub use error::{GetStreamError, SendMessageError};
pub use get_stream::GetStreamUseCase;
pub use send_message::SendMessageUseCase;
