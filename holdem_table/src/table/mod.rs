//! Table session: the concurrency layer around the game engine.
//!
//! A [`TableSession`] owns one [`Game`](crate::game::Game) behind a tokio
//! mutex. Connects, disconnects, rebuys, player actions and timer expiries
//! each run as one critical section that ends by publishing a
//! [`TableSnapshot`] to every subscriber.
//!
//! ## Example
//!
//! ```
//! use holdem_table::table::{ActionKind, TableConfig, TableSession};
//! use holdem_table::entities::PlayerId;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let session = TableSession::new(TableConfig::default());
//! let mut updates = session.subscribe();
//!
//! session.connect(PlayerId::from("alice"), "alice", Some(1000), None).await.unwrap();
//! session.connect(PlayerId::from("bob"), "bob", Some(1000), None).await.unwrap();
//! assert!(session.snapshot().hand_in_progress);
//!
//! session
//!     .submit_action(&PlayerId::from("alice"), ActionKind::Call, None)
//!     .await
//!     .unwrap();
//! assert!(updates.has_changed().unwrap());
//! # }
//! ```

pub mod config;
pub mod messages;
pub mod session;

pub use config::TableConfig;
pub use messages::{ActionKind, PlayerSnapshot, TableError, TableSnapshot};
pub use session::TableSession;
