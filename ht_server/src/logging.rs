//! Structured logging configuration.
//!
//! The table library logs through the `log` facade; the subscriber installed
//! here picks those records up alongside the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging.
///
/// Log levels are configurable via the `RUST_LOG` env var and default to
/// `info`.
///
/// # Example
///
/// ```no_run
/// use ht_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a seat change or connection event with structured fields.
///
/// # Example
///
/// ```
/// use ht_server::logging::log_connection_event;
///
/// log_connection_event("join", "alice", "seat 2, 1000 chips");
/// ```
pub fn log_connection_event(event_type: &str, player: &str, detail: &str) {
    tracing::info!(
        event_type = event_type,
        player = player,
        "CONNECTION: {}",
        detail
    );
}

/// Log a request the table turned down.
pub fn log_rejection(player: &str, reason: &str, message: &str) {
    tracing::warn!(player = player, reason = reason, "REJECTED: {}", message);
}
