//! HTTP/WebSocket API for the table server.
//!
//! # Endpoints Overview
//!
//! - `GET /health` - Server health status and table summary
//! - `GET /play` - WebSocket: join the table, act, receive snapshots
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ht_server::api::{create_router, AppState};
//! use holdem_table::{TableConfig, TableSession};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let state = AppState {
//!     session: TableSession::new(TableConfig::default()),
//! };
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use holdem_table::TableSession;
use serde_json::json;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloning is cheap: the session is a handle to one shared table.
#[derive(Clone)]
pub struct AppState {
    pub session: TableSession,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/play", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","table":{"name":"Hold'em","players":2,...},"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.session.snapshot();

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "table": {
            "name": snapshot.table_name,
            "players": snapshot.players.len(),
            "seats": snapshot.seats.len(),
            "hand_number": snapshot.hand_number,
            "hand_in_progress": snapshot.hand_in_progress,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
