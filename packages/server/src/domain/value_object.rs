//! Value objects with validation.

use super::ValueObjectError;

/// Validated chat message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub const MAX_CHARS: usize = 1000;

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyMessage);
        }
        let len = value.chars().count();
        if len > Self::MAX_CHARS {
            return Err(ValueObjectError::MessageTooLong {
                len,
                max: Self::MAX_CHARS,
            });
        }
        Ok(Self(value))
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Id of the signed-in user writing a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthorId(i64);

impl AuthorId {
    pub fn new(value: i64) -> Result<Self, ValueObjectError> {
        if value <= 0 {
            return Err(ValueObjectError::InvalidAuthorId(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i64 {
        self.0
    }
}
