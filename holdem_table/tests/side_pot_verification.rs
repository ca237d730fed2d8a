//! Side pot construction and distribution tests.
//!
//! These tests verify that:
//! - Each all-in tier gets its own pot, owned by exactly the players who matched it
//! - Folded players contribute but can't win
//! - Remainder chips go to one player, clockwise from the dealer
//! - No chips are created or lost by collection and distribution

use holdem_table::game::{
    PotLedger,
    entities::{Chips, HandStrength, Player, PlayerId, PlayerState, User, Username},
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn player(name: &str, chips: Chips, seat: usize) -> Player {
    let user = User {
        id: PlayerId::from(name),
        name: Username::new(name),
        avatar: None,
    };
    Player::new(user, chips, seat)
}

fn wager(ledger: &mut PotLedger, player: &mut Player, amount: Chips) {
    player.chips -= amount;
    player.bet += amount;
    ledger.record(amount);
    if player.chips == 0 {
        player.state = PlayerState::AllIn;
    }
}

fn ids(names: &[&str]) -> BTreeSet<PlayerId> {
    names.iter().map(|&n| PlayerId::from(n)).collect()
}

fn chips_on_table(players: &[Player], ledger: &PotLedger) -> Chips {
    players.iter().map(|p| p.chips + p.bet).sum::<Chips>() + ledger.collected()
}

#[test]
fn test_short_all_in_only_wins_main_pot() {
    // Scenario: A all-in for 50, B and C each bet 200.
    // Main pot: 150 (A, B, C). Side pot: 300 (B, C).
    let mut ledger = PotLedger::default();
    ledger.reset();
    let mut players = vec![
        player("a", 50, 0),
        player("b", 500, 1),
        player("c", 500, 2),
    ];
    wager(&mut ledger, &mut players[0], 50);
    wager(&mut ledger, &mut players[1], 200);
    wager(&mut ledger, &mut players[2], 200);
    ledger.collect_bets(&mut players);

    let pots = ledger.pots();
    assert_eq!(pots.len(), 2);
    assert_eq!((pots[0].amount, &pots[0].contributors), (150, &ids(&["a", "b", "c"])));
    assert_eq!((pots[1].amount, &pots[1].contributors), (300, &ids(&["b", "c"])));

    // A holds the nuts but can only take the main pot
    players[0].hand = Some(HandStrength::new(1));
    players[1].hand = Some(HandStrength::new(4000));
    players[2].hand = Some(HandStrength::new(5000));
    let payouts = ledger.distribute(&mut players, Some(0));

    assert_eq!(players[0].chips, 150);
    assert_eq!(players[1].chips, 300 + 300);
    assert_eq!(players[2].chips, 300);
    assert!(payouts.iter().all(|p| p.pot_idx == 0 || p.player != PlayerId::from("a")));
}

#[test]
fn test_multiple_side_pots_four_players() {
    // A all-in 25, B all-in 75, C and D bet 150
    let mut ledger = PotLedger::default();
    ledger.reset();
    let mut players = vec![
        player("a", 25, 0),
        player("b", 75, 1),
        player("c", 1000, 2),
        player("d", 1000, 3),
    ];
    wager(&mut ledger, &mut players[0], 25);
    wager(&mut ledger, &mut players[1], 75);
    wager(&mut ledger, &mut players[2], 150);
    wager(&mut ledger, &mut players[3], 150);
    ledger.collect_bets(&mut players);

    let amounts: Vec<Chips> = ledger.pots().iter().map(|p| p.amount).collect();
    assert_eq!(amounts, vec![100, 150, 150]);
    assert_eq!(ledger.pots()[1].contributors, ids(&["b", "c", "d"]));
    assert_eq!(ledger.pots()[2].contributors, ids(&["c", "d"]));
}

#[test]
fn test_folded_contributor_funds_pot_but_cannot_win() {
    let mut ledger = PotLedger::default();
    ledger.reset();
    let mut players = vec![
        player("a", 1000, 0),
        player("b", 1000, 1),
        player("c", 1000, 2),
    ];
    for p in players.iter_mut() {
        wager(&mut ledger, p, 100);
    }
    ledger.collect_bets(&mut players);
    players[1].fold();
    players[0].hand = Some(HandStrength::new(6000));
    players[1].hand = Some(HandStrength::new(1));
    players[2].hand = Some(HandStrength::new(6500));

    ledger.distribute(&mut players, Some(0));
    assert_eq!(players[0].chips, 1200);
    assert_eq!(players[1].chips, 900);
    assert_eq!(players[1].state, PlayerState::Fold);
}

#[test]
fn test_three_way_split_remainder() {
    let mut ledger = PotLedger::default();
    ledger.reset();
    let mut players = vec![
        player("a", 1000, 0),
        player("b", 1000, 1),
        player("c", 1000, 2),
        player("d", 1000, 3),
    ];
    for p in players.iter_mut() {
        wager(&mut ledger, p, 25);
    }
    ledger.collect_bets(&mut players);
    players[0].fold();
    for p in players.iter_mut().skip(1) {
        p.hand = Some(HandStrength::new(2000));
    }

    // 100 three ways: 33 each and the odd chip to c, first winner after dealer b
    ledger.distribute(&mut players, Some(1));
    assert_eq!(players[1].chips, 975 + 33);
    assert_eq!(players[2].chips, 975 + 34);
    assert_eq!(players[3].chips, 975 + 33);
}

#[test]
fn test_leavers_bet_stays_out_of_capped_main_pot() {
    // A all-in for 100 preflop, B and C call. On the flop B bets 200,
    // C raises to 500 and leaves, B calls.
    let mut ledger = PotLedger::default();
    ledger.reset();
    let mut players = vec![
        player("a", 100, 0),
        player("b", 2000, 1),
        player("c", 2000, 2),
    ];
    for p in players.iter_mut() {
        wager(&mut ledger, p, 100);
    }
    ledger.collect_bets(&mut players);

    wager(&mut ledger, &mut players[1], 200);
    wager(&mut ledger, &mut players[2], 500);
    let left = std::mem::take(&mut players[2].bet);
    ledger.forfeit(left);
    players.remove(2);
    wager(&mut ledger, &mut players[1], 300);
    let before = chips_on_table(&players, &ledger);
    ledger.collect_bets(&mut players);
    assert_eq!(chips_on_table(&players, &ledger), before);

    let pots = ledger.pots();
    assert_eq!(pots.len(), 2);
    assert_eq!((pots[0].amount, &pots[0].contributors), (300, &ids(&["a", "b", "c"])));
    assert_eq!((pots[1].amount, &pots[1].contributors), (1000, &ids(&["b"])));
    // B's call was matched by the dead raise, so nothing comes back
    assert_eq!(players[1].chips, 1400);
    assert_eq!(ledger.total_wagered(), 1300);

    players[0].hand = Some(HandStrength::new(1));
    players[1].hand = Some(HandStrength::new(5000));
    ledger.distribute(&mut players, Some(0));
    assert_eq!(players[0].chips, 300);
    assert_eq!(players[1].chips, 1400 + 1000);
}

proptest! {
    #[test]
    fn test_collection_and_distribution_conserve_chips(
        stacks in prop::collection::vec(1i64..2000, 2..=5),
        bets in prop::collection::vec(0i64..2000, 5),
        strengths in prop::collection::vec(1u16..=7462, 5),
        folds in prop::collection::vec(any::<bool>(), 5),
        dealer in 0usize..5,
    ) {
        let mut ledger = PotLedger::default();
        ledger.reset();
        let mut players: Vec<Player> = stacks
            .iter()
            .enumerate()
            .map(|(i, &chips)| player(&format!("p{i}"), chips, i))
            .collect();
        let before = chips_on_table(&players, &ledger);

        for (i, p) in players.iter_mut().enumerate() {
            let amount = bets[i].min(p.chips);
            wager(&mut ledger, p, amount);
        }
        prop_assert_eq!(chips_on_table(&players, &ledger), before);

        ledger.collect_bets(&mut players);
        prop_assert!(players.iter().all(|p| p.bet == 0));
        prop_assert_eq!(chips_on_table(&players, &ledger), before);
        prop_assert_eq!(ledger.collected(), ledger.total_wagered());

        let n = players.len();
        for (i, p) in players.iter_mut().enumerate() {
            p.hand = Some(HandStrength::new(strengths[i]));
            if folds[i] && i + 1 < n {
                p.fold();
            }
        }
        ledger.distribute(&mut players, Some(dealer % n));
        let after: Chips = players.iter().map(|p| p.chips).sum();
        prop_assert_eq!(after, before);
    }

    #[test]
    fn test_pot_contributors_match_tiers(
        bets in prop::collection::vec(1i64..500, 2..=5),
    ) {
        let mut ledger = PotLedger::default();
        ledger.reset();
        let mut players: Vec<Player> = bets
            .iter()
            .enumerate()
            .map(|(i, &bet)| player(&format!("p{i}"), bet, i))
            .collect();
        for (p, &bet) in players.iter_mut().zip(&bets) {
            wager(&mut ledger, p, bet);
        }
        ledger.collect_bets(&mut players);

        // every pot is owned by at least two players, and each contributor
        // of a later pot also contributed to every earlier one
        let pots = ledger.pots();
        for pot in pots {
            prop_assert!(pot.contributors.len() >= 2);
        }
        for pair in pots.windows(2) {
            prop_assert!(pair[1].contributors.is_subset(&pair[0].contributors));
        }
    }
}
