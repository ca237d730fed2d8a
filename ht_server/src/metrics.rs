//! Prometheus metrics for monitoring the table server.
//!
//! Metrics are exposed in Prometheus text format when `METRICS_BIND` is
//! set. Without an installed exporter every recorder call is a no-op.
//!
//! # Metrics Categories
//!
//! - **WebSocket Metrics**: Active connections, messages received
//! - **Table Metrics**: Actions accepted, dropped and rejected, refused seats
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ht_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::websocket_connections_total();
//! metrics::actions_accepted_total("raise");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

static ACTIVE_CONNECTIONS: AtomicU64 = AtomicU64::new(0);

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Track a socket opening. Returns the new active count.
pub fn websocket_opened() -> u64 {
    let count = ACTIVE_CONNECTIONS.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::gauge!("websocket_connections_active").set(count as f64);
    count
}

/// Track a socket closing. Returns the new active count.
pub fn websocket_closed() -> u64 {
    let count = ACTIVE_CONNECTIONS
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
            Some(n.saturating_sub(1))
        })
        .map_or(0, |prev| prev.saturating_sub(1));
    metrics::gauge!("websocket_connections_active").set(count as f64);
    count
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Table Metrics
// ============================================================================

/// Increment accepted actions counter.
pub fn actions_accepted_total(kind: &str) {
    metrics::counter!("actions_accepted_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Increment actions dropped because the table was busy.
pub fn actions_dropped_total() {
    metrics::counter!("actions_dropped_total").increment(1);
}

/// Increment actions the engine refused.
pub fn actions_rejected_total(reason: &str) {
    metrics::counter!("actions_rejected_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Increment refused seat requests.
pub fn connects_rejected_total(reason: &str) {
    metrics::counter!("connects_rejected_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Set the number of seated players.
pub fn seated_players(count: usize) {
    metrics::gauge!("seated_players").set(count as f64);
}
