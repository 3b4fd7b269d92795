//! Terminal chat client for a live stream.
//!
//! Polls the stream snapshot every second and shows the chat panel. Typed
//! messages appear immediately and are sent to the server in the background.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin streamchat-client -- --stream-id 1 --user-id 5
//! cargo run --bin streamchat-client -- -s 1 --url http://127.0.0.1:3000
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;

use streamchat_client::{
    ChatSync, HttpStreamApi, StreamId, SyncConfig, Viewer, session::run_client_session,
};
use streamchat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "streamchat-client")]
#[command(about = "Live-stream chat client with optimistic sends over HTTP polling", long_about = None)]
struct Args {
    /// Server base URL
    #[arg(short = 'u', long, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Stream to watch; without it nothing is fetched
    #[arg(short = 's', long)]
    stream_id: Option<i64>,

    /// Signed-in user id; omit to watch anonymously
    #[arg(short = 'i', long)]
    user_id: Option<i64>,

    /// Avatar of the signed-in user
    #[arg(long, requires = "user_id")]
    avatar: Option<String>,

    /// Milliseconds between two snapshot fetches
    #[arg(long, default_value = "1000")]
    poll_interval_ms: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let viewer = args.user_id.map(|id| Viewer::new(id, args.avatar.clone()));
    let stream_id = args.stream_id.map(StreamId::new);
    if stream_id.is_none() {
        tracing::warn!("No --stream-id given, nothing will be fetched");
    }

    let api = Arc::new(HttpStreamApi::new(args.url, viewer.as_ref()));
    let config = SyncConfig {
        poll_interval: Duration::from_millis(args.poll_interval_ms),
    };
    let sync = ChatSync::new(api, viewer, stream_id, config);

    run_client_session(sync).await;
}
