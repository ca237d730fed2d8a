//! Table-wide constants.

use super::entities::Chips;

pub const SMALL_BLIND: Chips = 25;
pub const BIG_BLIND: Chips = 50;

/// Seats at the table. Also caps the number of players in a hand.
pub const MAX_SEATS: usize = 5;

pub const HOLE_CARDS: usize = 2;
pub const COMMUNITY_CARDS: usize = 5;
pub const HAND_SIZE: usize = 5;

/// Strength of 7-5-4-3-2 unsuited. Lower is stronger; 1 is a royal flush.
pub const WORST_STRENGTH: u16 = 7462;

/// Display names are truncated to this many characters.
pub const MAX_USERNAME_LENGTH: usize = 32;
