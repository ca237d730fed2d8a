//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use holdem_table::{HoleCardRule, TableConfig};
use std::net::SocketAddr;

const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus scrape address, if metrics are enabled
    pub metrics_bind: Option<SocketAddr>,
    /// The table this server hosts
    pub table: TableConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// `bind_override` comes from the command line and wins over `SERVER_BIND`.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to something unusable or the
    /// resulting table configuration doesn't validate.
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        Self::from_vars(bind_override, |key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(bind_override: Option<SocketAddr>, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match bind_override {
            Some(addr) => addr,
            None => {
                let value = var("SERVER_BIND");
                parse_addr("SERVER_BIND", value.as_deref().unwrap_or(DEFAULT_BIND))?
            }
        };

        let metrics_bind = var("METRICS_BIND")
            .filter(|v| !v.is_empty())
            .map(|v| parse_addr("METRICS_BIND", &v))
            .transpose()?;

        let hole_card_rule = match var("TABLE_HOLE_CARD_RULE").as_deref() {
            None | Some("any_five") => HoleCardRule::AnyFive,
            Some("both_hole_cards") => HoleCardRule::BothHoleCards,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "TABLE_HOLE_CARD_RULE".to_string(),
                    reason: format!(
                        "Unknown rule '{other}', expected any_five or both_hole_cards"
                    ),
                });
            }
        };

        let defaults = TableConfig::default();
        let table = TableConfig {
            name: var("TABLE_NAME").unwrap_or(defaults.name),
            max_seats: defaults.max_seats,
            small_blind: parse_or(&var, "TABLE_SMALL_BLIND", defaults.small_blind),
            big_blind: parse_or(&var, "TABLE_BIG_BLIND", defaults.big_blind),
            default_buy_in: parse_or(&var, "TABLE_DEFAULT_BUY_IN", defaults.default_buy_in),
            turn_timeout_ms: parse_or(&var, "TABLE_TURN_TIMEOUT_MS", defaults.turn_timeout_ms),
            showdown_delay_ms: parse_or(
                &var,
                "TABLE_SHOWDOWN_DELAY_MS",
                defaults.showdown_delay_ms,
            ),
            hole_card_rule,
        };

        table.validate().map_err(|reason| ConfigError::Invalid {
            var: "TABLE_*".to_string(),
            reason,
        })?;

        Ok(ServerConfig {
            bind,
            metrics_bind,
            table,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_addr(key: &str, value: &str) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("'{value}' is not an IP:PORT address"),
    })
}

/// Helper to parse a variable with default fallback
fn parse_or<F, T>(var: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    var(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}
