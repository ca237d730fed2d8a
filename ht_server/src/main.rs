//! Single-table Hold'em server.
//!
//! Hosts one `TableSession` and exposes it over a WebSocket endpoint.

use std::net::SocketAddr;

use anyhow::Error;
use holdem_table::TableSession;
use ht_server::{api, config::ServerConfig, logging, metrics};
use log::{error, info};
use pico_args::Arguments;

const HELP: &str = "\
Run a single-table Hold'em server

USAGE:
  ht_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND             Prometheus scrape address (disabled when unset)
  TABLE_NAME               Table name shown to clients
  TABLE_SMALL_BLIND        Small blind [default: 25]
  TABLE_BIG_BLIND          Big blind [default: 50]
  TABLE_DEFAULT_BUY_IN     Chips for a join without a buy-in [default: 1000]
  TABLE_TURN_TIMEOUT_MS    Time to act before auto check/fold [default: 10500]
  TABLE_SHOWDOWN_DELAY_MS  Pause before the next hand [default: 4000]
  TABLE_HOLE_CARD_RULE     any_five or both_hole_cards [default: any_five]
  RUST_LOG                 Log filter [default: info]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let config = ServerConfig::from_env(bind_override)?;

    logging::init();
    info!("Starting table server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        match metrics::init_metrics(addr) {
            Ok(()) => info!("Prometheus metrics on http://{}/metrics", addr),
            Err(e) => error!("{}", e),
        }
    }

    let session = TableSession::new(config.table.clone());
    let app = api::create_router(api::AppState { session });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at ws://{}/play. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
