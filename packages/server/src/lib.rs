//! In-memory live-stream server.
//!
//! Serves stream snapshots and accepts chat messages over HTTP:
//!
//! - `GET /streams/{id}`
//! - `POST /streams/{id}/messages`
//! - `GET /api/health`

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
