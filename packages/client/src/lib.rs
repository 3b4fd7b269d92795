//! Live-stream chat client built on interval polling.
//!
//! The client keeps the latest stream snapshot in a [`cache::SnapshotCache`],
//! re-fetched on a fixed interval. Messages typed by the viewer are appended
//! to the cached snapshot immediately and written to the server in the
//! background through a [`dispatcher::MutationDispatcher`]; the next successful
//! poll replaces the whole snapshot with the server's copy.

pub mod cache;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod session;
pub mod sync;
pub mod transport;
pub mod view;

pub use domain::{StreamId, Viewer};
pub use error::{ClientError, SubmitError};
pub use sync::{ChatSync, SyncConfig};
pub use transport::{HttpStreamApi, StreamApi};
