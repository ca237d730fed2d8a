//! Table configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{
    GameSettings, HoleCardRule,
    constants::{BIG_BLIND, MAX_SEATS, SMALL_BLIND},
    entities::Chips,
};

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Seats at the table (2..=5)
    pub max_seats: usize,

    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// Buy-in used when a connect doesn't name one
    pub default_buy_in: Chips,

    /// How long the player to act has before the table acts for them
    pub turn_timeout_ms: u64,

    /// Pause between a showdown and the next hand
    pub showdown_delay_ms: u64,

    /// Which five-card hands count at showdown
    pub hole_card_rule: HoleCardRule,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Hold'em".to_string(),
            max_seats: MAX_SEATS,
            small_blind: SMALL_BLIND,
            big_blind: BIG_BLIND,
            default_buy_in: 1000,
            turn_timeout_ms: 10_500,
            showdown_delay_ms: 4_000,
            hole_card_rule: HoleCardRule::AnyFive,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.small_blind <= 0 {
            return Err("Small blind must be positive".to_string());
        }

        if self.big_blind <= self.small_blind {
            return Err("Big blind must be greater than small blind".to_string());
        }

        if !(2..=MAX_SEATS).contains(&self.max_seats) {
            return Err(format!("Max seats must be between 2 and {MAX_SEATS}"));
        }

        if self.default_buy_in <= 0 {
            return Err("Default buy-in must be positive".to_string());
        }

        if self.turn_timeout_ms == 0 {
            return Err("Turn timeout must be positive".to_string());
        }

        Ok(())
    }

    #[must_use]
    pub fn game_settings(&self) -> GameSettings {
        GameSettings::new(self.small_blind, self.big_blind, self.hole_card_rule)
    }

    #[must_use]
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }

    #[must_use]
    pub fn showdown_delay(&self) -> Duration {
        Duration::from_millis(self.showdown_delay_ms)
    }
}
