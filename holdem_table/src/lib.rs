//! # Hold'em Table
//!
//! A single five-seat Texas Hold'em cash table.
//!
//! The crate has two layers:
//!
//! - [`game`]: a synchronous engine covering cards, hand evaluation, pots and
//!   the betting rounds of one hand. It performs no I/O.
//! - [`table`]: a [`TableSession`] that owns the engine behind an async
//!   mutex, seats and removes players, runs the turn and new-hand timers and
//!   publishes a [`TableSnapshot`] after every change.
//!
//! ## Example
//!
//! ```
//! use holdem_table::game::{Game, GameSettings};
//! use holdem_table::game::entities::{Player, PlayerId, User, Username};
//!
//! let mut game = Game::new(GameSettings::default());
//! for (seat, name) in ["alice", "bob"].into_iter().enumerate() {
//!     let user = User {
//!         id: PlayerId::from(name),
//!         name: Username::new(name),
//!         avatar: None,
//!     };
//!     game.seat_player(Player::new(user, 1000, seat));
//! }
//! assert!(game.start_hand());
//! assert_eq!(game.pot_total(), 75);
//! ```

/// Core game logic and entities.
pub mod game;
pub use game::{
    Game, GameSettings, HoleCardRule, UserError,
    constants::{self, BIG_BLIND, MAX_SEATS, SMALL_BLIND},
    entities::{self, Action, Card, Chips, PlayerId, Round},
};

/// Concurrent table session and snapshots.
pub mod table;
pub use table::{ActionKind, TableConfig, TableError, TableSession, TableSnapshot};
