//! In-memory live-stream server.
//!
//! Hosts a single stream (id 1) whose chat history lives in memory and is lost
//! on restart.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin streamchat-server
//! cargo run --bin streamchat-server -- --port 3000 --stream-name "Vintage cameras" --stream-price 120
//! ```

use std::sync::Arc;

use clap::Parser;

use streamchat_server::{
    infrastructure::repository::InMemoryStreamRepository,
    ui::Server,
    usecase::{GetStreamUseCase, SendMessageUseCase},
};
use streamchat_shared::{dto::Stream, logger::setup_logger};

#[derive(Parser, Debug)]
#[command(name = "streamchat-server")]
#[command(about = "In-memory live-stream server with a polled chat", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Name of the hosted stream
    #[arg(long, default_value = "Live stream")]
    stream_name: String,

    /// Price shown for the hosted stream
    #[arg(long, default_value = "0")]
    stream_price: i64,

    /// Description of the hosted stream
    #[arg(long, default_value = "")]
    stream_description: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // 1. Create Repository (in-memory database)
    let stream = Stream {
        id: 1,
        name: args.stream_name,
        price: args.stream_price,
        description: args.stream_description,
    };
    tracing::info!("Stream {} '{}' created!", stream.id, stream.name);
    let repository = Arc::new(InMemoryStreamRepository::new(vec![stream]));

    // 2. Create UseCases
    let get_stream_usecase = Arc::new(GetStreamUseCase::new(repository.clone()));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(repository));

    // 3. Create and run the server
    let server = Server::new(get_stream_usecase, send_message_usecase);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
