//! Table session inputs, errors and published snapshots.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::TableConfig;
use crate::game::{
    ActionFlags, Game, Payout, UserError,
    entities::{Action, Chips, Player, PlayerId, PlayerState, Round, SeatIndex},
};

/// Errors returned by [`TableSession`](super::TableSession) operations.
#[derive(Debug, Clone, Eq, Error, PartialEq)]
pub enum TableError {
    #[error("table is full")]
    TableFull,
    #[error("player is already seated")]
    AlreadySeated,
    #[error("player is not seated")]
    UnknownPlayer,
    /// Another action is being processed. The action was dropped.
    #[error("table is busy")]
    Busy,
    #[error("invalid chip amount {0}")]
    InvalidAmount(Chips),
    #[error(transparent)]
    Game(#[from] UserError),
}

impl TableError {
    /// Short machine-readable reason, used for metric labels.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::TableFull => "table_full",
            Self::AlreadySeated => "already_seated",
            Self::UnknownPlayer => "unknown_player",
            Self::Busy => "busy",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::Game(_) => "rejected",
        }
    }
}

/// Action kinds as they arrive from a client. A raise carries its amount
/// separately.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Call,
    Check,
    Fold,
    Raise,
}

impl ActionKind {
    /// A raise without an amount is a raise of zero, which the engine rejects.
    #[must_use]
    pub fn into_action(self, amount: Option<Chips>) -> Action {
        match self {
            Self::Call => Action::Call,
            Self::Check => Action::Check,
            Self::Fold => Action::Fold,
            Self::Raise => Action::Raise(amount.unwrap_or(0)),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub avatar: Option<String>,
    /// Physical seat, 0..MAX_SEATS.
    pub seat_idx: usize,
    pub chips: Chips,
    pub bet: Chips,
    /// Hole card labels such as `hearts_ace`.
    pub cards: Vec<String>,
    /// Category label of the evaluated hand, set at showdown.
    pub best_hand: Option<String>,
    pub state: PlayerState,
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id().clone(),
            name: player.user.name.to_string(),
            avatar: player.user.avatar.clone(),
            seat_idx: player.seat_idx,
            chips: player.chips,
            bet: player.bet,
            cards: player.hole_card_labels(),
            best_hand: player.hand.map(|hand| hand.rank.label().to_string()),
            state: player.state,
        }
    }
}

/// Read-only view of the table taken after a mutation.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableSnapshot {
    pub table_name: String,
    /// Hands started since the session was created.
    pub hand_number: u64,
    pub round: Round,
    /// Who sits in each physical seat.
    pub seats: Vec<Option<PlayerId>>,
    pub pot_total: Chips,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub high_bet: Chips,
    /// Index into `players`.
    pub dealer_idx: Option<SeatIndex>,
    /// Index into `players`.
    pub turn_idx: Option<SeatIndex>,
    /// Labels of the face-up community cards.
    pub board: Vec<String>,
    pub players: Vec<PlayerSnapshot>,
    pub flags: ActionFlags,
    pub hand_in_progress: bool,
    /// At least two seated players have chips.
    pub enough_players: bool,
    /// Payouts of the most recent showdown.
    pub last_payouts: Vec<Payout>,
}

impl TableSnapshot {
    #[must_use]
    pub fn capture(
        game: &Game,
        config: &TableConfig,
        seats: &[Option<PlayerId>],
        hand_number: u64,
    ) -> Self {
        Self {
            table_name: config.name.clone(),
            hand_number,
            round: game.round(),
            seats: seats.to_vec(),
            pot_total: game.pot_total(),
            small_blind: config.small_blind,
            big_blind: config.big_blind,
            high_bet: game.high_bet(),
            dealer_idx: game.dealer_idx(),
            turn_idx: game.turn_idx(),
            board: game.visible_board().iter().map(|card| card.label()).collect(),
            players: game.players().iter().map(PlayerSnapshot::from).collect(),
            flags: game.action_flags(),
            hand_in_progress: game.is_hand_in_progress(),
            enough_players: game.eligible_count() >= 2,
            last_payouts: game.last_payouts().to_vec(),
        }
    }

    /// The view a single player may see: other players' hole cards and
    /// hands stay hidden until showdown. An observer without a seat sees
    /// no hole cards at all.
    #[must_use]
    pub fn redacted_for(&self, viewer: Option<&PlayerId>) -> Self {
        let mut view = self.clone();
        if view.round != Round::Showdown {
            for player in view.players.iter_mut().filter(|p| Some(&p.id) != viewer) {
                player.cards.clear();
                player.best_hand = None;
            }
        }
        view
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&PlayerSnapshot> {
        self.turn_idx.and_then(|idx| self.players.get(idx))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
