use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Self::Club, Self::Spade, Self::Diamond, Self::Heart];

    /// Suit bitmask carried in bits 12..16 of a card encoding.
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::Spade => 0x1000,
            Self::Heart => 0x2000,
            Self::Diamond => 0x4000,
            Self::Club => 0x8000,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Club => "clubs",
            Self::Spade => "spades",
            Self::Diamond => "diamonds",
            Self::Heart => "hearts",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Face value of a card, 2 for a deuce up to 14 for an ace.
pub type Value = u8;

/// One prime per rank, deuce through ace. The product of five of these
/// identifies a hand's rank multiset.
pub const RANK_PRIMES: [u32; 13] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41];

/// A face value and a suit. Ordering compares values first, so sorting a
/// hand puts low cards before high ones.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    /// Zero-based rank, deuce = 0 through ace = 12.
    #[must_use]
    pub const fn rank_index(self) -> u32 {
        let value = if self.0 < 2 {
            2
        } else if self.0 > 14 {
            14
        } else {
            self.0
        };
        (value - 2) as u32
    }

    /// Integer encoding used by the evaluator:
    ///
    /// ```text
    /// +--------+--------+--------+--------+
    /// |xxxbbbbb|bbbbbbbb|cdhsrrrr|xxpppppp|
    /// +--------+--------+--------+--------+
    /// ```
    ///
    /// `b` is one bit per rank, `cdhs` the suit, `r` the rank index and
    /// `p` the rank prime.
    #[must_use]
    pub const fn encoding(self) -> u32 {
        let rank = self.rank_index();
        (1 << (rank + 16)) | self.1.bit() | (rank << 8) | RANK_PRIMES[rank as usize]
    }

    /// Stable label such as `hearts_ace` or `spades_10`.
    #[must_use]
    pub fn label(self) -> String {
        let rank = match self.0 {
            11 => "jack".to_string(),
            12 => "queen".to_string(),
            13 => "king".to_string(),
            1 | 14 => "ace".to_string(),
            v => v.to_string(),
        };
        format!("{}_{rank}", self.1.label())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            1 | 14 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        let repr = format!("{value}/{}", self.1);
        write!(f, "{repr:>4}")
    }
}

/// Hand categories ordered best first, so `RoyalFlush < HighCard`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandRank {
    RoyalFlush,
    StraightFlush,
    FourOfAKind,
    FullHouse,
    Flush,
    Straight,
    ThreeOfAKind,
    TwoPair,
    OnePair,
    HighCard,
}

impl HandRank {
    /// Category of a strength in `1..=7462`.
    #[must_use]
    pub const fn from_strength(strength: u16) -> Self {
        match strength {
            0..=1 => Self::RoyalFlush,
            2..=10 => Self::StraightFlush,
            11..=166 => Self::FourOfAKind,
            167..=322 => Self::FullHouse,
            323..=1599 => Self::Flush,
            1600..=1609 => Self::Straight,
            1610..=2467 => Self::ThreeOfAKind,
            2468..=3325 => Self::TwoPair,
            3326..=6185 => Self::OnePair,
            _ => Self::HighCard,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::RoyalFlush => "ROYAL FLUSH",
            Self::StraightFlush => "STRAIGHT FLUSH",
            Self::FourOfAKind => "FOUR OF A KIND",
            Self::FullHouse => "FULL HOUSE",
            Self::Flush => "FLUSH",
            Self::Straight => "STRAIGHT",
            Self::ThreeOfAKind => "THREE OF A KIND",
            Self::TwoPair => "TWO PAIR",
            Self::OnePair => "ONE PAIR",
            Self::HighCard => "HIGH CARD",
        }
    }
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Evaluated hand. Lower strength wins, so the derived ordering sorts
/// the strongest hand first.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandStrength {
    pub rank: HandRank,
    pub strength: u16,
}

impl HandStrength {
    pub const WORST: Self = Self {
        rank: HandRank::HighCard,
        strength: constants::WORST_STRENGTH,
    };

    #[must_use]
    pub const fn new(strength: u16) -> Self {
        Self {
            rank: HandRank::from_strength(strength),
            strength,
        }
    }
}

impl fmt::Display for HandStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.rank, self.strength)
    }
}

#[derive(Debug, Clone)]
pub struct Deck {
    cards: [Card; 52],
    pub deck_idx: usize,
}

impl Deck {
    /// Deal up to `n` cards from the top of the deck.
    pub fn deal(&mut self, n: usize) -> Vec<Card> {
        let end = (self.deck_idx + n).min(self.cards.len());
        let cards = self.cards[self.deck_idx..end].to_vec();
        self.deck_idx = end;
        cards
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }

    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.deck_idx = 0;
    }

    /// A deck that deals `top` first, in order, followed by every other
    /// card in the default order. Duplicates in `top` are ignored.
    #[must_use]
    pub fn stacked(top: &[Card]) -> Self {
        let mut ordered: Vec<Card> = Vec::with_capacity(52);
        for card in top {
            if !ordered.contains(card) {
                ordered.push(*card);
            }
        }
        for card in Self::default().cards {
            if !ordered.contains(&card) {
                ordered.push(card);
            }
        }
        let mut cards = Self::default().cards;
        cards.copy_from_slice(&ordered[..52]);
        Self { cards, deck_idx: 0 }
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards: [Card; 52] = [Card(2, Suit::Club); 52];
        for (i, value) in (2u8..=14u8).enumerate() {
            for (j, suit) in Suit::ALL.into_iter().enumerate() {
                cards[4 * i + j] = Card(value, suit);
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

/// Type alias for whole chips. Signed because blinds are posted without
/// an all-in check, so a short stack can dip below zero.
pub type Chips = i64;

/// Type alias for positions in the seating-ordered player list.
pub type SeatIndex = usize;

/// Stable identity of a connected player.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let mut username: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .take(constants::MAX_USERNAME_LENGTH)
            .collect();
        username.shrink_to_fit();
        Self(username)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    pub id: PlayerId,
    pub name: Username,
    pub avatar: Option<String>,
}

/// Betting rounds of a hand.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Round {
    #[default]
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Round {
    /// Cyclic successor. Showdown wraps to preflop, though a new hand is
    /// only ever started through `Game::start_hand`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Preflop => Self::Flop,
            Self::Flop => Self::Turn,
            Self::Turn => Self::River,
            Self::River => Self::Showdown,
            Self::Showdown => Self::Preflop,
        }
    }

    /// Number of community cards face up during this round.
    #[must_use]
    pub const fn visible_cards(self) -> usize {
        match self {
            Self::Preflop => 0,
            Self::Flop => 3,
            Self::Turn => 4,
            Self::River | Self::Showdown => 5,
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Call,
    Check,
    Fold,
    /// Raise by this many chips on top of the call amount.
    Raise(Chips),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "calls"),
            Self::Check => write!(f, "checks"),
            Self::Fold => write!(f, "folds"),
            Self::Raise(amount) => write!(f, "raises by ${amount}"),
        }
    }
}

/// A seated player's standing in the current hand. Mostly the last action
/// they took this betting round.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerState {
    // Player is in the hand and still owes a decision this round.
    #[default]
    Inactive,
    // Player checks.
    Check,
    // Player calls.
    Call,
    // Player raises and is waiting for other player actions.
    Raise,
    // Player forfeited their stake in the pot.
    Fold,
    // Player put in their whole stack.
    AllIn,
    // Player sits out this hand.
    Spectator,
    // Player won at least one pot at showdown.
    Winner,
}

impl PlayerState {
    /// Folded, all-in and spectating players are skipped in turn order.
    #[must_use]
    pub const fn skips_turn(self) -> bool {
        matches!(self, Self::Fold | Self::AllIn | Self::Spectator)
    }

    /// Still holds a live hand for showdown.
    #[must_use]
    pub const fn is_contender(self) -> bool {
        !matches!(self, Self::Fold | Self::Spectator)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inactive => "INACTIVE",
            Self::Check => "CHECK",
            Self::Call => "CALL",
            Self::Raise => "RAISE",
            Self::Fold => "FOLD",
            Self::AllIn => "ALL IN",
            Self::Spectator => "SPECTATOR",
            Self::Winner => "WINNER",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub user: User,
    pub chips: Chips,
    /// Chips put in during the current betting round, not yet collected.
    pub bet: Chips,
    pub cards: Vec<Card>,
    pub hand: Option<HandStrength>,
    pub state: PlayerState,
    /// Physical seat (0..MAX_SEATS). The player list is sorted by this.
    pub seat_idx: usize,
}

impl Player {
    #[must_use]
    pub fn new(user: User, chips: Chips, seat_idx: usize) -> Self {
        Self {
            user,
            chips,
            bet: 0,
            cards: Vec::with_capacity(constants::HOLE_CARDS),
            hand: None,
            state: PlayerState::Inactive,
            seat_idx,
        }
    }

    #[must_use]
    pub fn id(&self) -> &PlayerId {
        &self.user.id
    }

    /// Clear per-hand fields. Returns whether the player can be dealt in.
    pub fn reset(&mut self) -> bool {
        self.bet = 0;
        self.cards.clear();
        self.hand = None;
        if self.chips > 0 {
            self.state = PlayerState::Inactive;
            true
        } else {
            self.state = PlayerState::Spectator;
            false
        }
    }

    /// Match the high bet, going all-in when the stack can't cover it.
    /// Returns the chips paid.
    pub fn call(&mut self, high_bet: Chips) -> Chips {
        let owed = (high_bet - self.bet).max(0);
        let paid = if owed >= self.chips {
            self.state = PlayerState::AllIn;
            owed.min(self.chips.max(0))
        } else {
            self.state = PlayerState::Call;
            owed
        };
        log::trace!("{} {} for {paid}", self.user.name, self.state);
        self.chips -= paid;
        self.bet += paid;
        paid
    }

    /// Pay the call amount plus `by`. Emptying the stack exactly is an
    /// all-in. Returns the chips paid.
    pub fn raise(&mut self, high_bet: Chips, by: Chips) -> Chips {
        let paid = (high_bet - self.bet).max(0) + by;
        self.state = if paid == self.chips {
            PlayerState::AllIn
        } else {
            PlayerState::Raise
        };
        log::trace!("{} {} for {paid}", self.user.name, self.state);
        self.chips -= paid;
        self.bet += paid;
        paid
    }

    pub fn check(&mut self) {
        self.state = PlayerState::Check;
    }

    pub fn fold(&mut self) {
        self.state = PlayerState::Fold;
    }

    /// Blinds are debited without an all-in check.
    pub fn post_blind(&mut self, amount: Chips) -> Chips {
        self.chips -= amount;
        self.bet += amount;
        amount
    }

    pub fn add_chips(&mut self, amount: Chips) {
        self.chips += amount;
    }

    #[must_use]
    pub fn hole_card_labels(&self) -> Vec<String> {
        self.cards.iter().map(|card| card.label()).collect()
    }
}
