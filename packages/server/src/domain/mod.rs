//! Domain layer: value objects and the repository interface.

mod error;
mod repository;
mod value_object;

pub use error::{RepositoryError, ValueObjectError};
pub use repository::StreamRepository;
pub use value_object::{AuthorId, MessageContent};

#[cfg(test)]
pub use repository::MockStreamRepository;
