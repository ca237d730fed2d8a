//! Hold'em game engine.
//!
//! - [`entities`]: cards, deck, players and their per-hand state
//! - [`tables`] and [`evaluator`]: lookup-table hand ranking
//! - [`pot`]: bet collection, side pots and payouts
//! - [`engine`]: the round engine driving a hand from blinds to showdown

pub mod constants;
pub mod engine;
pub mod entities;
pub mod evaluator;
pub mod pot;
pub mod tables;

pub use engine::{ActionFlags, Game, GameSettings, UserError};
pub use evaluator::{HoleCardRule, rank5, rank_best};
pub use pot::{Payout, Pot, PotLedger};
