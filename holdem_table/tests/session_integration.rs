//! Table session tests. Time is paused so turn and new-hand timers fire
//! exactly when the clock is advanced past them.

use holdem_table::{
    game::{
        UserError,
        entities::{PlayerId, PlayerState, Round},
    },
    table::{ActionKind, TableConfig, TableError, TableSession},
};
use std::time::Duration;

fn id(name: &str) -> PlayerId {
    PlayerId::from(name)
}

async fn table_with(names: &[&str]) -> TableSession {
    let session = TableSession::new(TableConfig::default());
    for &name in names {
        session
            .connect(id(name), name, Some(1000), None)
            .await
            .unwrap();
    }
    session
}

async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// a, b and c seated with a three-handed hand under way. The first hand
/// is heads-up between a and b since it starts as soon as b connects, so
/// a folds it and the new-hand timer deals the second: b on the button
/// and first to act, c on 25, a on 50.
async fn three_handed_table() -> TableSession {
    let session = table_with(&["a", "b", "c"]).await;
    session
        .submit_action(&id("a"), ActionKind::Fold, None)
        .await
        .unwrap();
    wait(4_100).await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.hand_number, 2);
    assert_eq!(snapshot.dealer_idx, Some(1));
    assert_eq!(snapshot.player(&id("c")).map(|p| p.bet), Some(25));
    assert_eq!(snapshot.player(&id("a")).map(|p| p.bet), Some(50));
    assert_eq!(snapshot.current_player().map(|p| p.id.as_str()), Some("b"));
    session
}

// === Connect Tests ===

#[tokio::test(start_paused = true)]
async fn test_second_connect_starts_heads_up_hand() {
    let session = table_with(&["p1"]).await;
    let snapshot = session.snapshot();
    assert!(!snapshot.hand_in_progress);
    assert!(!snapshot.enough_players);
    assert_eq!(snapshot.hand_number, 0);

    session
        .connect(id("p2"), "p2", Some(1000), None)
        .await
        .unwrap();
    let snapshot = session.snapshot();
    assert!(snapshot.hand_in_progress);
    assert_eq!(snapshot.hand_number, 1);
    assert_eq!(snapshot.pot_total, 75);
    assert_eq!(snapshot.dealer_idx, Some(0));
    assert_eq!(snapshot.current_player().map(|p| p.id.as_str()), Some("p1"));

    let round = session
        .submit_action(&id("p1"), ActionKind::Call, None)
        .await
        .unwrap();
    assert_eq!(round, Round::Preflop);
    assert_eq!(session.snapshot().pot_total, 100);

    let round = session
        .submit_action(&id("p2"), ActionKind::Check, None)
        .await
        .unwrap();
    assert_eq!(round, Round::Flop);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.board.len(), 3);
    assert_eq!(snapshot.high_bet, 0);
    assert_eq!(snapshot.pot_total, 100);
    assert_eq!(snapshot.current_player().map(|p| p.id.as_str()), Some("p2"));
}

#[tokio::test(start_paused = true)]
async fn test_connect_rejections() {
    let session = table_with(&["a", "b", "c", "d", "e"]).await;

    assert_eq!(
        session.connect(id("a"), "a", None, None).await,
        Err(TableError::AlreadySeated)
    );
    assert_eq!(
        session.connect(id("f"), "f", None, None).await,
        Err(TableError::TableFull)
    );
    assert_eq!(session.snapshot().players.len(), 5);

    session.disconnect(&id("c")).await;
    let seated = session.connect(id("f"), "f", None, None).await.unwrap();
    assert_eq!(seated.seat_idx, 2);
    assert_eq!(seated.chips, 1000);
}

#[tokio::test(start_paused = true)]
async fn test_negative_buy_in_rejected() {
    let session = TableSession::new(TableConfig::default());
    assert_eq!(
        session.connect(id("a"), "a", Some(-5), None).await,
        Err(TableError::InvalidAmount(-5))
    );
}

#[tokio::test(start_paused = true)]
async fn test_mid_hand_joiner_sits_out() {
    let session = table_with(&["a", "b"]).await;
    let seated = session
        .connect(id("c"), "c", None, Some("c.png".to_string()))
        .await
        .unwrap();
    assert_eq!(seated.state, PlayerState::Spectator);

    let snapshot = session.snapshot();
    let joiner = snapshot.player(&id("c")).unwrap();
    assert!(joiner.cards.is_empty());
    assert_eq!(joiner.avatar.as_deref(), Some("c.png"));
    assert_eq!(snapshot.seats[2], Some(id("c")));
}

// === Action Tests ===

#[tokio::test(start_paused = true)]
async fn test_rejected_actions_leave_state_alone() {
    let session = table_with(&["a", "b"]).await;
    let before = session.snapshot();

    assert_eq!(
        session.submit_action(&id("b"), ActionKind::Call, None).await,
        Err(TableError::Game(UserError::NotYourTurn))
    );
    assert_eq!(
        session.submit_action(&id("a"), ActionKind::Raise, None).await,
        Err(TableError::Game(UserError::InvalidRaise { amount: 0 }))
    );
    assert_eq!(
        session.submit_action(&id("z"), ActionKind::Fold, None).await,
        Err(TableError::Game(UserError::UnknownPlayer))
    );
    assert_eq!(session.snapshot(), before);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_each_mutation() {
    let session = TableSession::new(TableConfig::default());
    let mut updates = session.subscribe();

    session.connect(id("a"), "a", None, None).await.unwrap();
    assert!(updates.has_changed().unwrap());
    let seen = updates.borrow_and_update().clone();
    assert_eq!(seen.players.len(), 1);

    session.connect(id("b"), "b", None, None).await.unwrap();
    updates.changed().await.unwrap();
    assert!(updates.borrow().hand_in_progress);
}

// === Timer Tests ===

#[tokio::test(start_paused = true)]
async fn test_turn_timeout_folds_facing_bet() {
    let session = table_with(&["a", "b"]).await;
    wait(10_400).await;
    assert_eq!(session.snapshot().round, Round::Preflop);

    wait(200).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.round, Round::Showdown);
    assert!(!snapshot.hand_in_progress);
    assert_eq!(snapshot.player(&id("a")).map(|p| p.chips), Some(975));
    assert_eq!(snapshot.player(&id("b")).map(|p| p.chips), Some(1025));
    assert_eq!(snapshot.last_payouts.len(), 1);
    assert_eq!(snapshot.last_payouts[0].player, id("b"));
}

#[tokio::test(start_paused = true)]
async fn test_turn_timeout_checks_when_free() {
    let session = table_with(&["a", "b"]).await;
    wait(5_000).await;
    session
        .submit_action(&id("a"), ActionKind::Call, None)
        .await
        .unwrap();

    // the call re-armed the timer, so b gets a full turn
    wait(10_000).await;
    assert_eq!(session.snapshot().round, Round::Preflop);
    wait(600).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.round, Round::Flop);
    assert_eq!(snapshot.pot_total, 100);
}

#[tokio::test(start_paused = true)]
async fn test_new_hand_after_showdown_delay() {
    let session = table_with(&["a", "b"]).await;
    session
        .submit_action(&id("a"), ActionKind::Fold, None)
        .await
        .unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.round, Round::Showdown);
    assert_eq!(snapshot.hand_number, 1);

    wait(3_900).await;
    assert!(!session.snapshot().hand_in_progress);
    wait(200).await;
    let snapshot = session.snapshot();
    assert!(snapshot.hand_in_progress);
    assert_eq!(snapshot.hand_number, 2);
    // the button moved to b, who posts the small blind heads-up
    assert_eq!(snapshot.dealer_idx, Some(1));
    assert_eq!(snapshot.player(&id("b")).map(|p| p.bet), Some(25));
}

#[tokio::test(start_paused = true)]
async fn test_table_waits_when_players_leave() {
    let session = table_with(&["a", "b"]).await;
    session.disconnect(&id("b")).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.round, Round::Showdown);
    assert_eq!(snapshot.player(&id("a")).map(|p| p.chips), Some(1050));

    wait(60_000).await;
    let snapshot = session.snapshot();
    assert!(!snapshot.hand_in_progress);
    assert_eq!(snapshot.hand_number, 1);

    session.connect(id("c"), "c", None, None).await.unwrap();
    assert_eq!(session.snapshot().hand_number, 2);
}

// === Disconnect Tests ===

#[tokio::test(start_paused = true)]
async fn test_disconnect_on_turn_passes_action() {
    let session = three_handed_table().await;

    session.disconnect(&id("b")).await;
    let snapshot = session.snapshot();
    assert!(snapshot.hand_in_progress);
    assert_eq!(snapshot.players.len(), 2);
    assert_eq!(snapshot.seats[1], None);
    assert_eq!(snapshot.current_player().map(|p| p.id.as_str()), Some("c"));

    // c can act right away on the renumbered table
    let round = session
        .submit_action(&id("c"), ActionKind::Call, None)
        .await
        .unwrap();
    assert_eq!(round, Round::Preflop);
    let round = session
        .submit_action(&id("a"), ActionKind::Check, None)
        .await
        .unwrap();
    assert_eq!(round, Round::Flop);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_keeps_bet_in_pot() {
    let session = three_handed_table().await;
    session
        .submit_action(&id("b"), ActionKind::Call, None)
        .await
        .unwrap();
    // c posted the small blind and leaves on their turn
    session.disconnect(&id("c")).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.pot_total, 125);
    assert_eq!(snapshot.current_player().map(|p| p.id.as_str()), Some("a"));

    let round = session
        .submit_action(&id("a"), ActionKind::Check, None)
        .await
        .unwrap();
    assert_eq!(round, Round::Flop);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.pot_total, 125);
    let stacks: i64 = snapshot.players.iter().map(|p| p.chips).sum();
    assert_eq!(stacks + snapshot.pot_total, 2025);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_unknown_is_noop() {
    let session = table_with(&["a"]).await;
    let before = session.snapshot();
    session.disconnect(&id("ghost")).await;
    session.disconnect(&id("ghost")).await;
    assert_eq!(session.snapshot(), before);
}

// === Rebuy Tests ===

#[tokio::test(start_paused = true)]
async fn test_rebuy_starts_waiting_table() {
    let session = TableSession::new(TableConfig::default());
    session.connect(id("a"), "a", Some(1000), None).await.unwrap();
    session.connect(id("b"), "b", Some(0), None).await.unwrap();
    assert!(!session.snapshot().hand_in_progress);

    session.rebuy(&id("b"), 500).await.unwrap();
    let snapshot = session.snapshot();
    assert!(snapshot.hand_in_progress);
    // a deals and posts the small blind, b posts the big blind
    assert_eq!(snapshot.player(&id("b")).map(|p| p.chips), Some(450));
}

#[tokio::test(start_paused = true)]
async fn test_rebuy_validation() {
    let session = table_with(&["a"]).await;
    assert_eq!(
        session.rebuy(&id("a"), 0).await,
        Err(TableError::InvalidAmount(0))
    );
    assert_eq!(
        session.rebuy(&id("ghost"), 100).await,
        Err(TableError::UnknownPlayer)
    );
}
