//! Shared building blocks for the streamchat client and server.
//!
//! - `dto`: JSON shapes exchanged over `GET /streams/{id}` and
//!   `POST /streams/{id}/messages`
//! - `logger`: tracing subscriber setup for the binaries
//! - `time`: clock abstraction used for provisional message ids

pub mod dto;
pub mod logger;
pub mod time;
