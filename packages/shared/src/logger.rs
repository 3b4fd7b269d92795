//! Logging setup utilities for the streamchat binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers the workspace library crates and the binary itself.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "streamchat-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use streamchat_shared::logger::setup_logger;
///
/// setup_logger("streamchat-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the fallback filter directive used when `RUST_LOG` is unset.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let mut targets = vec!["streamchat_shared", "streamchat_client", "streamchat_server"];
    let binary_target = binary_name.replace('-', "_");
    if !targets.contains(&binary_target.as_str()) {
        targets.push(&binary_target);
    }

    targets
        .iter()
        .map(|target| format!("{target}={default_log_level}"))
        .collect::<Vec<_>>()
        .join(",")
}
