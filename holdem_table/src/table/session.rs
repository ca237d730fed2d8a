//! The table session: one engine behind one lock.
//!
//! Every mutation (connect, disconnect, rebuy, player action, timer expiry)
//! runs as a single critical section over the engine, recomputes the
//! snapshot and publishes it through a `watch` channel before releasing the
//! lock. Player actions never wait for the lock: one arriving while another
//! mutation is in flight is dropped with [`TableError::Busy`].
//!
//! A single timer slot drives the table forward. After each publish it is
//! re-armed either as a turn timer (the player to act checks or folds on
//! expiry) or, after a showdown, as a new-hand timer. Arming always aborts
//! the previous timer and bumps an epoch under the lock, so a timer that
//! lost the race for the lock notices it is stale and does nothing.

use std::{
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};

use super::{
    config::TableConfig,
    messages::{ActionKind, PlayerSnapshot, TableError, TableSnapshot},
};
use crate::game::{
    Game,
    entities::{Chips, Player, PlayerId, PlayerState, Round, User, Username},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TimerKind {
    Turn,
    NewHand,
}

struct TableState {
    game: Game,
    /// Physical seats, each holding the id of its occupant.
    seats: Vec<Option<PlayerId>>,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every cancel so an expired timer can tell it was replaced.
    timer_epoch: u64,
    hand_number: u64,
}

impl Drop for TableState {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Shared {
    config: TableConfig,
    state: Mutex<TableState>,
    snapshots: watch::Sender<Arc<TableSnapshot>>,
}

/// Handle to a running table. Cheap to clone; all clones share one table.
#[derive(Clone)]
pub struct TableSession {
    shared: Arc<Shared>,
}

impl TableSession {
    /// Create an empty table. The config should already be validated.
    #[must_use]
    pub fn new(config: TableConfig) -> Self {
        let game = Game::new(config.game_settings());
        let seats = vec![None; config.max_seats];
        let initial = TableSnapshot::capture(&game, &config, &seats, 0);
        let (snapshots, _) = watch::channel(Arc::new(initial));
        log::info!(
            "Table '{}' open with {} seats, blinds {}/{}",
            config.name,
            config.max_seats,
            config.small_blind,
            config.big_blind
        );

        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(TableState {
                    game,
                    seats,
                    timer: None,
                    timer_epoch: 0,
                    hand_number: 0,
                }),
                snapshots,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.shared.config
    }

    /// Receive every snapshot published from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<TableSnapshot>> {
        self.shared.snapshots.subscribe()
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TableSnapshot> {
        self.shared.snapshots.borrow().clone()
    }

    /// Seat a player in the first free seat. Starts a hand if this makes
    /// two funded players and none is running; a player joining mid-hand
    /// sits out until the next one.
    pub async fn connect(
        &self,
        id: PlayerId,
        name: &str,
        buy_in: Option<Chips>,
        avatar: Option<String>,
    ) -> Result<PlayerSnapshot, TableError> {
        let buy_in = buy_in.unwrap_or(self.shared.config.default_buy_in);
        if buy_in < 0 {
            return Err(TableError::InvalidAmount(buy_in));
        }

        let mut state = self.shared.state.lock().await;
        if state.game.position(&id).is_some() {
            return Err(TableError::AlreadySeated);
        }
        let Some(seat_idx) = state.seats.iter().position(Option::is_none) else {
            return Err(TableError::TableFull);
        };

        state.seats[seat_idx] = Some(id.clone());
        let user = User {
            id,
            name: Username::new(name),
            avatar,
        };
        let mut player = Player::new(user, buy_in, seat_idx);
        if state.game.is_hand_in_progress() {
            player.state = PlayerState::Spectator;
        }
        let seated = PlayerSnapshot::from(&player);
        log::info!(
            "{} sat down in seat {seat_idx} with {buy_in} chips",
            player.user.name
        );
        state.game.seat_player(player);

        start_hand_if_ready(&mut state);
        settle(&self.shared, &mut state);
        Ok(seated)
    }

    /// Remove a player as if they folded. Unknown ids are ignored.
    pub async fn disconnect(&self, id: &PlayerId) {
        let mut state = self.shared.state.lock().await;
        let Some(player) = state.game.leave(id) else {
            return;
        };
        if let Some(seat) = state.seats.get_mut(player.seat_idx) {
            *seat = None;
        }
        log::info!(
            "{} left seat {} with {} chips",
            player.user.name,
            player.seat_idx,
            player.chips
        );

        settle(&self.shared, &mut state);
    }

    /// Add chips to a seated player's stack.
    pub async fn rebuy(&self, id: &PlayerId, amount: Chips) -> Result<(), TableError> {
        if amount <= 0 {
            return Err(TableError::InvalidAmount(amount));
        }

        let mut state = self.shared.state.lock().await;
        let player = state
            .game
            .player_mut(id)
            .ok_or(TableError::UnknownPlayer)?;
        player.add_chips(amount);
        log::info!("{} rebought {amount}, stack {}", player.user.name, player.chips);

        start_hand_if_ready(&mut state);
        settle(&self.shared, &mut state);
        Ok(())
    }

    /// Apply an action for the player to act. Returns the round afterwards.
    ///
    /// Never waits: if another mutation holds the table the action is
    /// dropped with [`TableError::Busy`].
    pub async fn submit_action(
        &self,
        id: &PlayerId,
        kind: ActionKind,
        amount: Option<Chips>,
    ) -> Result<Round, TableError> {
        let Ok(mut state) = self.shared.state.try_lock() else {
            log::debug!("Dropping {kind:?} from {id}: table busy");
            return Err(TableError::Busy);
        };

        let round = state.game.apply_action(id, kind.into_action(amount))?;
        settle(&self.shared, &mut state);
        Ok(round)
    }
}

fn start_hand_if_ready(state: &mut TableState) -> bool {
    if state.game.is_hand_in_progress() || state.game.eligible_count() < 2 {
        return false;
    }
    if !state.game.start_hand() {
        return false;
    }
    state.hand_number += 1;
    log::info!("Hand #{} dealt", state.hand_number);
    true
}

/// Finish whatever the last mutation left behind, publish, and arm the
/// timer for what comes next.
fn settle(shared: &Arc<Shared>, state: &mut TableState) {
    if state.game.is_hand_in_progress() && state.game.round() == Round::Showdown {
        let payouts = state.game.showdown();
        log::info!(
            "Hand #{} finished with {} payouts",
            state.hand_number,
            payouts.len()
        );
        publish(shared, state);
        arm_timer(shared, state, TimerKind::NewHand, shared.config.showdown_delay());
        return;
    }

    publish(shared, state);
    if state.game.is_hand_in_progress() {
        if state.game.contender_count() >= 2 {
            arm_timer(shared, state, TimerKind::Turn, shared.config.turn_timeout());
        } else {
            cancel_timer(state);
        }
    }
}

fn publish(shared: &Shared, state: &TableState) {
    let snapshot = TableSnapshot::capture(
        &state.game,
        &shared.config,
        &state.seats,
        state.hand_number,
    );
    shared.snapshots.send_replace(Arc::new(snapshot));
}

fn cancel_timer(state: &mut TableState) {
    state.timer_epoch = state.timer_epoch.wrapping_add(1);
    if let Some(timer) = state.timer.take() {
        timer.abort();
    }
}

fn arm_timer(shared: &Arc<Shared>, state: &mut TableState, kind: TimerKind, delay: Duration) {
    cancel_timer(state);
    let epoch = state.timer_epoch;
    let shared = Arc::downgrade(shared);
    state.timer = Some(tokio::spawn(run_timer(shared, epoch, kind, delay)));
}

async fn run_timer(shared: Weak<Shared>, epoch: u64, kind: TimerKind, delay: Duration) {
    tokio::time::sleep(delay).await;
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let mut state = shared.state.lock().await;
    if state.timer_epoch != epoch {
        return;
    }
    // Detach rather than abort: this task is the one running.
    drop(state.timer.take());

    match kind {
        TimerKind::Turn => {
            let Some(id) = state.game.current_player().map(|p| p.id().clone()) else {
                return;
            };
            let Some(action) = state.game.fallback_action() else {
                return;
            };
            log::info!("{id} ran out of time and {action}");
            if let Err(err) = state.game.apply_action(&id, action) {
                log::warn!("Timed-out action for {id} rejected: {err}");
                return;
            }
        }
        TimerKind::NewHand => {
            if !start_hand_if_ready(&mut state) {
                log::debug!("Not enough players for a new hand, waiting");
            }
        }
    }

    settle(&shared, &mut state);
}
