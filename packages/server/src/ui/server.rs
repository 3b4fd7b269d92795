//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::usecase::{GetStreamUseCase, SendMessageUseCase};

use super::{
    handler::{get_stream, health_check, send_message},
    signal::shutdown_signal,
    state::AppState,
};

/// Live-stream HTTP server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(get_stream_usecase, send_message_usecase);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// GetStreamUseCase（ストリーム取得のユースケース）
    get_stream_usecase: Arc<GetStreamUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    send_message_usecase: Arc<SendMessageUseCase>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        get_stream_usecase: Arc<GetStreamUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
    ) -> Self {
        Self {
            get_stream_usecase,
            send_message_usecase,
        }
    }

    /// Build the router with all endpoints
    pub fn into_router(self) -> Router {
        let app_state = Arc::new(AppState {
            get_stream_usecase: self.get_stream_usecase,
            send_message_usecase: self.send_message_usecase,
        });

        Router::new()
            .route("/api/health", get(health_check))
            .route("/streams/{stream_id}", get(get_stream))
            .route("/streams/{stream_id}/messages", post(send_message))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the server until a shutdown signal is received
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), std::io::Error> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Stream server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
