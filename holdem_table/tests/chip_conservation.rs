//! Chip conservation and turn-order properties over random play.
//!
//! Stacks plus outstanding bets plus pots must stay constant through every
//! action of a hand, and the player to act must never be folded, all-in or
//! sitting out.

use holdem_table::game::{
    Game, GameSettings,
    entities::{Action, Chips, Player, PlayerId, Round, User, Username},
};
use proptest::prelude::*;

fn seat(game: &mut Game, stacks: &[Chips]) {
    for (i, &chips) in stacks.iter().enumerate() {
        let name = format!("p{i}");
        let user = User {
            id: PlayerId::from(name.as_str()),
            name: Username::new(&name),
            avatar: None,
        };
        game.seat_player(Player::new(user, chips, i));
    }
}

fn pick_action(choice: u8, amount: Chips) -> Action {
    match choice % 4 {
        0 => Action::Call,
        1 => Action::Check,
        2 => Action::Fold,
        _ => Action::Raise(amount),
    }
}

fn assert_turn_is_live(game: &Game) -> Result<(), TestCaseError> {
    if game.is_hand_in_progress() && game.round() != Round::Showdown {
        let player = game.current_player();
        prop_assert!(player.is_some());
        prop_assert!(!player.map_or(true, |p| p.state.skips_turn()));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_random_play_conserves_chips(
        stacks in prop::collection::vec(60i64..3000, 2..=5),
        moves in prop::collection::vec((any::<u8>(), 1i64..400), 1..200),
    ) {
        let mut game = Game::new(GameSettings::default());
        seat(&mut game, &stacks);
        let total: Chips = stacks.iter().sum();
        prop_assert!(game.start_hand());

        for (choice, amount) in moves {
            if !game.is_hand_in_progress() {
                if !game.start_hand() {
                    break;
                }
                continue;
            }
            if game.round() == Round::Showdown {
                game.showdown();
                let stacks_now: Chips = game.players().iter().map(|p| p.chips).sum();
                prop_assert_eq!(stacks_now, total);
                continue;
            }

            let Some(id) = game.current_player().map(|p| p.id().clone()) else {
                break;
            };
            let before_round = game.round();
            if game.apply_action(&id, pick_action(choice, amount)).is_err() {
                // illegal choices leave the table untouched; fall back
                prop_assert_eq!(game.round(), before_round);
                prop_assert_eq!(game.total_chips(), total);
                let fallback = game.fallback_action().unwrap_or(Action::Fold);
                game.apply_action(&id, fallback).map_err(|e| TestCaseError::fail(e.to_string()))?;
            }

            prop_assert_eq!(game.total_chips(), total);
            assert_turn_is_live(&game)?;
        }
    }

    #[test]
    fn test_leaving_player_takes_only_their_stack(
        stacks in prop::collection::vec(60i64..3000, 3..=5),
        calls in 0usize..4,
        leaver in 0usize..5,
    ) {
        let mut game = Game::new(GameSettings::default());
        seat(&mut game, &stacks);
        prop_assert!(game.start_hand());

        for _ in 0..calls {
            let Some(id) = game.current_player().map(|p| p.id().clone()) else {
                break;
            };
            if game.round() == Round::Showdown {
                break;
            }
            game.apply_action(&id, Action::Call).map_err(|e| TestCaseError::fail(e.to_string()))?;
        }

        let total = game.total_chips();
        let leaver = PlayerId::from(format!("p{}", leaver % stacks.len()));
        let stack = game.player(&leaver).map_or(0, |p| p.chips);
        let left = game.leave(&leaver);
        prop_assert!(left.is_some());
        prop_assert_eq!(game.total_chips(), total - stack);
        assert_turn_is_live(&game)?;
    }
}
