//! Round engine: seating, blinds, turn order, round completion and
//! showdown for a single table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    constants::{BIG_BLIND, COMMUNITY_CARDS, HOLE_CARDS, SMALL_BLIND},
    entities::{Action, Card, Chips, Deck, Player, PlayerId, PlayerState, Round, SeatIndex},
    evaluator::{HoleCardRule, rank_best},
    pot::{Payout, Pot, PotLedger},
};

/// Errors from acting out of turn or outside the rules.
#[derive(Debug, Clone, Eq, Error, PartialEq)]
pub enum UserError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("no hand in progress")]
    NoHandInProgress,
    #[error("player is not seated")]
    UnknownPlayer,
    #[error("cannot check with {bet} in against a high bet of {high_bet}")]
    CannotCheck { bet: Chips, high_bet: Chips },
    #[error("raise must be positive, got {amount}")]
    InvalidRaise { amount: Chips },
    #[error("insufficient chips: need {needed}, have {available}")]
    InsufficientChips { needed: Chips, available: Chips },
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSettings {
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub hole_card_rule: HoleCardRule,
}

impl GameSettings {
    #[must_use]
    pub const fn new(small_blind: Chips, big_blind: Chips, hole_card_rule: HoleCardRule) -> Self {
        Self {
            small_blind,
            big_blind,
            hole_card_rule,
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(SMALL_BLIND, BIG_BLIND, HoleCardRule::AnyFive)
    }
}

/// Which buttons the player to act may press.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionFlags {
    pub can_check: bool,
    pub can_raise: bool,
    pub can_call: bool,
    pub can_fold: bool,
}

#[derive(Debug)]
pub struct Game {
    settings: GameSettings,
    deck: Deck,
    /// Seated players in seat order. Only connect and disconnect change it.
    players: Vec<Player>,
    board: Vec<Card>,
    ledger: PotLedger,
    dealer_idx: Option<SeatIndex>,
    turn_idx: Option<SeatIndex>,
    high_bet: Chips,
    raise_flag: bool,
    round: Round,
    hand_in_progress: bool,
    last_payouts: Vec<Payout>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}

impl Game {
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            deck: Deck::default(),
            players: Vec::new(),
            board: Vec::with_capacity(COMMUNITY_CARDS),
            ledger: PotLedger::default(),
            dealer_idx: None,
            turn_idx: None,
            high_bet: 0,
            raise_flag: false,
            round: Round::Preflop,
            hand_in_progress: false,
            last_payouts: Vec::new(),
        }
    }

    // Accessors.

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn position(&self, id: &PlayerId) -> Option<SeatIndex> {
        self.players.iter().position(|p| p.id() == id)
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id() == id)
    }

    #[must_use]
    pub fn round(&self) -> Round {
        self.round
    }

    #[must_use]
    pub fn dealer_idx(&self) -> Option<SeatIndex> {
        self.dealer_idx
    }

    #[must_use]
    pub fn turn_idx(&self) -> Option<SeatIndex> {
        self.turn_idx
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.turn_idx.and_then(|idx| self.players.get(idx))
    }

    #[must_use]
    pub fn high_bet(&self) -> Chips {
        self.high_bet
    }

    #[must_use]
    pub fn raise_flag(&self) -> bool {
        self.raise_flag
    }

    #[must_use]
    pub fn is_hand_in_progress(&self) -> bool {
        self.hand_in_progress
    }

    #[must_use]
    pub fn pots(&self) -> &[Pot] {
        self.ledger.pots()
    }

    /// Chips wagered this hand, including bets not yet collected.
    #[must_use]
    pub fn pot_total(&self) -> Chips {
        self.ledger.total_wagered()
    }

    #[must_use]
    pub fn last_payouts(&self) -> &[Payout] {
        &self.last_payouts
    }

    /// Community cards face up in the current round.
    #[must_use]
    pub fn visible_board(&self) -> &[Card] {
        let n = self.round.visible_cards().min(self.board.len());
        &self.board[..n]
    }

    /// Seated players with chips to play a hand.
    #[must_use]
    pub fn eligible_count(&self) -> usize {
        self.players.iter().filter(|p| p.chips > 0).count()
    }

    /// Players still holding a live hand.
    #[must_use]
    pub fn contender_count(&self) -> usize {
        self.players
            .iter()
            .filter(|p| p.state.is_contender())
            .count()
    }

    /// Stacks, outstanding bets and collected pots. Constant within a hand.
    #[must_use]
    pub fn total_chips(&self) -> Chips {
        let stacks: Chips = self.players.iter().map(|p| p.chips + p.bet).sum();
        stacks + self.ledger.collected()
    }

    // Roster.

    /// Insert a player in seat order. Returns their list index.
    pub fn seat_player(&mut self, player: Player) -> SeatIndex {
        let idx = self
            .players
            .partition_point(|p| p.seat_idx < player.seat_idx);
        self.players.insert(idx, player);

        let shift = |ptr: Option<SeatIndex>| ptr.map(|p| if p >= idx { p + 1 } else { p });
        self.dealer_idx = shift(self.dealer_idx);
        self.turn_idx = shift(self.turn_idx);
        idx
    }

    /// Take a player out of the hand as if they folded, then off the table.
    /// Their uncollected bet stays in the hand.
    pub fn leave(&mut self, id: &PlayerId) -> Option<Player> {
        let idx = self.position(id)?;
        let in_hand = self.hand_in_progress
            && self.round != Round::Showdown
            && self.players[idx].state != PlayerState::Spectator;

        if in_hand {
            let player = &mut self.players[idx];
            let bet = std::mem::take(&mut player.bet);
            self.ledger.forfeit(bet);
            player.fold();
            log::info!("{} left mid-hand, forfeiting {bet}", player.user.name);

            if self.turn_idx == Some(idx) {
                self.advance_round();
            } else {
                self.resolve_if_decided();
            }
        }

        self.remove_player(idx)
    }

    /// Remove by list index and translate the dealer and turn pointers
    /// onto the shrunken list. A pointer at the removed player moves to
    /// the previous seat so the next clockwise step lands where it would
    /// have.
    fn remove_player(&mut self, idx: SeatIndex) -> Option<Player> {
        if idx >= self.players.len() {
            return None;
        }
        let player = self.players.remove(idx);
        let n = self.players.len();

        let translate = |ptr: Option<SeatIndex>| match ptr {
            _ if n == 0 => None,
            Some(p) if p > idx => Some(p - 1),
            Some(p) if p == idx => Some((p + n - 1) % n),
            other => other,
        };
        self.dealer_idx = translate(self.dealer_idx);
        self.turn_idx = translate(self.turn_idx);
        Some(player)
    }

    // Hand lifecycle.

    /// Shuffle and start a hand. Returns false, without starting one, when
    /// fewer than two players have chips.
    pub fn start_hand(&mut self) -> bool {
        self.deck.shuffle();
        self.deal_hand()
    }

    /// Start a hand dealing from `deck` as-is.
    pub fn start_hand_with_deck(&mut self, deck: Deck) -> bool {
        self.deck = deck;
        self.deal_hand()
    }

    fn deal_hand(&mut self) -> bool {
        let mut eligible = 0;
        for player in &mut self.players {
            if player.reset() {
                eligible += 1;
            }
        }
        if eligible < 2 {
            log::debug!("Not enough players to start a hand ({eligible} eligible)");
            self.hand_in_progress = false;
            return false;
        }

        self.ledger.reset();
        self.last_payouts.clear();
        self.board.clear();
        self.raise_flag = false;
        self.high_bet = 0;
        self.round = Round::Preflop;
        self.turn_idx = None;

        self.dealer_idx = self.next_eligible_seat(self.dealer_idx);
        let Some(dealer) = self.dealer_idx else {
            return false;
        };

        for player in self
            .players
            .iter_mut()
            .filter(|p| p.state != PlayerState::Spectator)
        {
            player.cards = self.deck.deal(HOLE_CARDS);
        }
        self.board = self.deck.deal(COMMUNITY_CARDS);

        // Heads-up the dealer posts the small blind and acts first.
        let small_blind_idx = if eligible == 2 {
            dealer
        } else {
            self.next_eligible_seat(Some(dealer)).unwrap_or(dealer)
        };
        let big_blind_idx = self
            .next_eligible_seat(Some(small_blind_idx))
            .unwrap_or(small_blind_idx);

        let small = self.players[small_blind_idx].post_blind(self.settings.small_blind);
        self.ledger.record(small);
        let big = self.players[big_blind_idx].post_blind(self.settings.big_blind);
        self.ledger.record(big);
        self.high_bet = self.settings.big_blind;
        self.turn_idx = self.next_eligible_seat(Some(big_blind_idx));
        self.hand_in_progress = true;

        log::info!(
            "Hand started with {eligible} players: dealer {}, blinds {}/{} from {} and {}",
            self.players[dealer].user.name,
            self.settings.small_blind,
            self.settings.big_blind,
            self.players[small_blind_idx].user.name,
            self.players[big_blind_idx].user.name,
        );
        true
    }

    /// Next seat clockwise after `from` that still acts this hand. `None`
    /// scans from the first seat. Returns `from` itself only when nobody
    /// else can act.
    #[must_use]
    pub fn next_eligible_seat(&self, from: Option<SeatIndex>) -> Option<SeatIndex> {
        let n = self.players.len();
        if n == 0 {
            return None;
        }
        let start = from.map_or(0, |idx| idx + 1);
        (0..n)
            .map(|k| (start + k) % n)
            .find(|&idx| !self.players[idx].state.skips_turn())
    }

    /// Nobody is left to bet against: every player but one folded or sits
    /// out, or nobody can act.
    fn showdown_reached(&self) -> bool {
        let n = self.players.len();
        let out = self
            .players
            .iter()
            .filter(|p| !p.state.is_contender())
            .count();
        (n > 0 && out == n - 1) || self.players.iter().all(|p| p.state.skips_turn())
    }

    fn jump_to_showdown(&mut self) -> Round {
        self.ledger.collect_bets(&mut self.players);
        self.round = Round::Showdown;
        log::debug!("No more actions possible, moving to showdown");
        self.round
    }

    /// End the betting if the hand is already decided. Returns whether
    /// it jumped to showdown.
    pub fn resolve_if_decided(&mut self) -> bool {
        if self.hand_in_progress && self.round != Round::Showdown && self.showdown_reached() {
            self.jump_to_showdown();
            true
        } else {
            false
        }
    }

    /// Pass the turn and close the betting round when everyone has acted.
    /// Returns the round afterwards; callers compare it with the round
    /// before to learn whether it changed.
    pub fn advance_round(&mut self) -> Round {
        if self.showdown_reached() {
            return self.jump_to_showdown();
        }

        self.turn_idx = self.next_eligible_seat(self.turn_idx);
        let Some(turn) = self.turn_idx else {
            return self.jump_to_showdown();
        };

        let waiting = self
            .players
            .iter()
            .any(|p| p.state == PlayerState::Inactive);
        let unmatched = self.raise_flag && self.players[turn].bet != self.high_bet;
        if (waiting && !self.raise_flag) || unmatched {
            return self.round;
        }

        let mut still_acting = 0;
        for player in &mut self.players {
            if !player.state.skips_turn() {
                player.state = PlayerState::Inactive;
                still_acting += 1;
            }
        }
        self.ledger.collect_bets(&mut self.players);

        if still_acting <= 1 {
            return self.jump_to_showdown();
        }

        self.raise_flag = false;
        self.high_bet = 0;
        self.turn_idx = self.next_eligible_seat(self.dealer_idx);
        self.round = self.round.next();
        log::debug!("Betting round complete, now {}", self.round);
        self.round
    }

    /// Apply an action from the player whose turn it is, then advance.
    pub fn apply_action(&mut self, id: &PlayerId, action: Action) -> Result<Round, UserError> {
        if !self.hand_in_progress || self.round == Round::Showdown {
            return Err(UserError::NoHandInProgress);
        }
        let idx = self.position(id).ok_or(UserError::UnknownPlayer)?;
        if self.turn_idx != Some(idx) {
            return Err(UserError::NotYourTurn);
        }

        let high_bet = self.high_bet;
        let player = &mut self.players[idx];
        match action {
            Action::Call => {
                let paid = player.call(high_bet);
                self.ledger.record(paid);
            }
            Action::Check => {
                if player.bet < high_bet {
                    return Err(UserError::CannotCheck {
                        bet: player.bet,
                        high_bet,
                    });
                }
                player.check();
            }
            Action::Fold => player.fold(),
            Action::Raise(by) => {
                if by <= 0 {
                    return Err(UserError::InvalidRaise { amount: by });
                }
                let needed = (high_bet - player.bet).max(0) + by;
                if needed > player.chips {
                    return Err(UserError::InsufficientChips {
                        needed,
                        available: player.chips,
                    });
                }
                let paid = player.raise(high_bet, by);
                self.ledger.record(paid);
                self.high_bet = player.bet;
                self.raise_flag = true;
            }
        }
        log::info!("{} {action}", self.players[idx].user.name);

        Ok(self.advance_round())
    }

    /// What a player who ran out of time does: check when free, else fold.
    #[must_use]
    pub fn fallback_action(&self) -> Option<Action> {
        let player = self.current_player()?;
        Some(if player.bet >= self.high_bet {
            Action::Check
        } else {
            Action::Fold
        })
    }

    /// Rank every live hand and pay out all pots. Ends the hand.
    pub fn showdown(&mut self) -> Vec<Payout> {
        if !self.hand_in_progress {
            return Vec::new();
        }
        self.ledger.collect_bets(&mut self.players);
        self.round = Round::Showdown;

        let rule = self.settings.hole_card_rule;
        for player in self.players.iter_mut().filter(|p| p.state.is_contender()) {
            let hand = rank_best(&player.cards, &self.board, rule);
            log::debug!("{} shows {hand}", player.user.name);
            player.hand = Some(hand);
        }

        let payouts = self.ledger.distribute(&mut self.players, self.dealer_idx);
        self.hand_in_progress = false;
        self.last_payouts.clone_from(&payouts);
        payouts
    }

    /// Buttons for the player to act. All false outside of betting.
    #[must_use]
    pub fn action_flags(&self) -> ActionFlags {
        if !self.hand_in_progress || self.round == Round::Showdown {
            return ActionFlags::default();
        }
        let Some(player) = self.current_player() else {
            return ActionFlags::default();
        };
        ActionFlags {
            can_check: self.high_bet <= player.bet,
            can_raise: self.high_bet < player.chips,
            can_call: self.high_bet > player.bet,
            can_fold: true,
        }
    }
}
