//! View composition for the stream page.
//!
//! [`compose`] turns the current snapshot into what the page shows: the stream
//! header and the chat rows with their alignment. It has no side effects.

use streamchat_shared::dto::StreamSnapshot;

use crate::domain::{Viewer, is_reversed};

/// Demo messages shown above the real chat history. Never sent anywhere.
pub const ILLUSTRATIVE_MESSAGES: [(&str, bool); 3] = [
    ("Hi how much are you selling them for?", false),
    ("I want ￦20,000", true),
    ("미쳤어", false),
];

/// Single-line chat input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageInput {
    value: String,
}

impl MessageInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Take the current text out, leaving the input empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.value)
    }
}

/// Stream metadata as displayed; empty until the first successful fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamHeader {
    pub name: String,
    pub price: String,
    pub description: String,
}

/// Stable identity of a displayed row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    Illustrative(usize),
    Message(i64),
}

/// One chat bubble
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub key: RowKey,
    pub text: String,
    /// Written by the viewer; rendered right-aligned
    pub reversed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamView {
    pub header: StreamHeader,
    pub rows: Vec<MessageRow>,
}

impl StreamView {
    /// Rows that come from the snapshot, without the illustrative ones
    pub fn message_rows(&self) -> impl Iterator<Item = &MessageRow> {
        self.rows
            .iter()
            .filter(|row| matches!(row.key, RowKey::Message(_)))
    }
}

/// Format a price with the currency prefix
pub fn format_price(price: i64) -> String {
    format!("${price}")
}

/// Compose the page from the latest snapshot and the current viewer
pub fn compose(snapshot: Option<&StreamSnapshot>, viewer: Option<&Viewer>) -> StreamView {
    let header = snapshot
        .map(|s| StreamHeader {
            name: s.stream.name.clone(),
            price: format_price(s.stream.price),
            description: s.stream.description.clone(),
        })
        .unwrap_or_default();

    let illustrative = ILLUSTRATIVE_MESSAGES
        .iter()
        .enumerate()
        .map(|(i, (text, reversed))| MessageRow {
            key: RowKey::Illustrative(i),
            text: (*text).to_string(),
            reversed: *reversed,
        });

    let messages = snapshot
        .into_iter()
        .flat_map(|s| s.messages.iter())
        .map(|message| MessageRow {
            key: RowKey::Message(message.id),
            text: message.message.clone(),
            reversed: is_reversed(message, viewer),
        });

    StreamView {
        header,
        rows: illustrative.chain(messages).collect(),
    }
}
