//! Request handlers.

mod http;

pub use http::{get_stream, health_check, send_message};
