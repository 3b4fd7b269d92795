//! Domain logic for client-side chat synchronization.
//!
//! This module contains pure functions that implement the optimistic-append
//! and alignment rules without side effects, making them easy to test.

use std::{
    fmt,
    sync::atomic::{AtomicI64, Ordering},
};

use streamchat_shared::dto::{Author, ChatMessage, StreamSnapshot};

/// Identifier of the stream being viewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(i64);

impl StreamId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The signed-in user watching the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: i64,
    pub avatar: Option<String>,
}

impl Viewer {
    pub fn new(id: i64, avatar: Option<String>) -> Self {
        Self { id, avatar }
    }

    /// The author reference attached to messages this viewer writes
    pub fn author(&self) -> Author {
        Author {
            id: self.id,
            avatar: self.avatar.clone(),
        }
    }
}

/// Author for a message written by `viewer`, anonymous when signed out.
pub fn author_for(viewer: Option<&Viewer>) -> Author {
    viewer.map_or_else(Author::anonymous, Viewer::author)
}

/// Check if a message was written by the current viewer.
///
/// Such messages render reversed (right-aligned). Without a viewer nothing is
/// self-authored.
pub fn is_reversed(message: &ChatMessage, viewer: Option<&Viewer>) -> bool {
    viewer.is_some_and(|viewer| viewer.id == message.user.id)
}

/// Build a provisional message that has not been confirmed by the server yet.
///
/// # Arguments
///
/// * `id` - Local display key, see [`ProvisionalIds`]
/// * `text` - The message text
/// * `viewer` - The author, if signed in
/// * `client_token` - Token carried through the write and echoed back by the server
pub fn provisional_message(
    id: i64,
    text: String,
    viewer: Option<&Viewer>,
    client_token: String,
) -> ChatMessage {
    ChatMessage {
        id,
        message: text,
        user: author_for(viewer),
        client_token: Some(client_token),
    }
}

/// Return a copy of `snapshot` with `message` appended at the end.
pub fn append_message(snapshot: &StreamSnapshot, message: ChatMessage) -> StreamSnapshot {
    let mut next = snapshot.clone();
    next.messages.push(message);
    next
}

/// Check if a server snapshot already contains the persisted copy of a
/// provisional message, matched by its client token.
pub fn is_confirmed(snapshot: &StreamSnapshot, client_token: &str) -> bool {
    snapshot
        .messages
        .iter()
        .any(|m| m.client_token.as_deref() == Some(client_token))
}

/// Client tokens of sent messages whose persisted copy has not shown up in a
/// server snapshot yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingConfirmations {
    tokens: Vec<String>,
}

impl PendingConfirmations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, message: &ChatMessage) {
        if let Some(token) = &message.client_token {
            self.tokens.push(token.clone());
        }
    }

    /// Forget every token present in `snapshot`. Returns how many were confirmed.
    pub fn reconcile(&mut self, snapshot: &StreamSnapshot) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|token| !is_confirmed(snapshot, token));
        before - self.tokens.len()
    }

    /// Stop waiting for writes that failed. Returns how many were dropped.
    pub fn forget(&mut self, failed_tokens: &[String]) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|token| !failed_tokens.contains(token));
        before - self.tokens.len()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}

/// Generator of provisional message ids.
///
/// Ids are the current time in milliseconds, bumped so that every id is
/// strictly greater than the previous one even when two messages are sent
/// within the same millisecond or the clock goes backwards.
#[derive(Debug, Default)]
pub struct ProvisionalIds {
    last: AtomicI64,
}

impl ProvisionalIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, now_millis: i64) -> i64 {
        let mut next = now_millis;
        // fetch_update only fails when the closure returns None
        let _ = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                next = now_millis.max(last + 1);
                Some(next)
            });
        next
    }
}
