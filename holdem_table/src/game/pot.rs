//! Pot accumulation and showdown payouts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::entities::{Chips, HandStrength, Player, PlayerId, PlayerState, SeatIndex};

/// An accumulation bucket. Several exist only when players are all-in for
/// different amounts.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Pot {
    pub amount: Chips,
    pub contributors: BTreeSet<PlayerId>,
}

/// Chips awarded from one pot to one player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payout {
    pub player: PlayerId,
    pub amount: Chips,
    pub pot_idx: usize,
}

#[derive(Clone, Debug, Default)]
pub struct PotLedger {
    pots: Vec<Pot>,
    /// Bets left behind by players who disconnected mid-hand, one entry
    /// per leaver. They fill tiers on the next collection like a live bet
    /// that can't win.
    dead: Vec<Chips>,
    /// Every chip put in this hand, collected or not.
    total_wagered: Chips,
}

impl PotLedger {
    pub fn reset(&mut self) {
        self.pots.clear();
        self.pots.push(Pot::default());
        self.dead.clear();
        self.total_wagered = 0;
    }

    #[must_use]
    pub fn pots(&self) -> &[Pot] {
        &self.pots
    }

    /// Total wagered this hand, including bets still in front of players.
    #[must_use]
    pub fn total_wagered(&self) -> Chips {
        self.total_wagered
    }

    /// Chips already moved off the players: pots plus dead money.
    #[must_use]
    pub fn collected(&self) -> Chips {
        self.pots.iter().map(|pot| pot.amount).sum::<Chips>() + self.dead.iter().sum::<Chips>()
    }

    pub fn record(&mut self, amount: Chips) {
        self.total_wagered += amount;
    }

    /// Keep a departing player's uncollected bet in the hand.
    pub fn forfeit(&mut self, amount: Chips) {
        if amount > 0 {
            self.dead.push(amount);
        }
    }

    /// Move every outstanding bet into pots, one pot per all-in tier.
    ///
    /// Each pass takes the smallest outstanding bet from everyone still
    /// holding a bet, forfeited bets included. When a single player is left
    /// with an unmatched excess, it goes back to their stack. Forfeited
    /// chips nobody matched stay in the last pot.
    pub fn collect_bets(&mut self, players: &mut [Player]) {
        if self.pots.is_empty() {
            self.pots.push(Pot::default());
        }
        let mut dead = std::mem::take(&mut self.dead);

        loop {
            dead.retain(|&amount| amount > 0);
            let holding: Vec<usize> = (0..players.len()).filter(|&i| players[i].bet > 0).collect();
            let Some(lowest) = holding
                .iter()
                .map(|&i| players[i].bet)
                .chain(dead.iter().copied())
                .min()
            else {
                break;
            };

            match (&holding[..], dead.is_empty()) {
                (&[only], true) => {
                    let player = &mut players[only];
                    log::debug!("Returning uncalled {} to {}", player.bet, player.user.name);
                    self.total_wagered -= player.bet;
                    player.chips += player.bet;
                    player.bet = 0;
                    self.drop_empty_tail();
                    break;
                }
                (&[], false) => {
                    self.drop_empty_tail();
                    let unmatched: Chips = dead.drain(..).sum();
                    if let Some(pot) = self.pots.last_mut() {
                        pot.amount += unmatched;
                    }
                    break;
                }
                _ => {}
            }

            if self.active_pot_is_capped(players) {
                self.pots.push(Pot::default());
            }
            let Some(pot) = self.pots.last_mut() else {
                break;
            };
            for &i in &holding {
                let player = &mut players[i];
                pot.amount += lowest;
                pot.contributors.insert(player.user.id.clone());
                player.bet -= lowest;
            }
            for amount in &mut dead {
                pot.amount += lowest;
                *amount -= lowest;
            }
            log::trace!(
                "Collected {lowest} from {} players into pot {}",
                holding.len(),
                self.pots.len() - 1
            );

            // A tier ends where a player ran out of bet, not where a
            // forfeited bet did.
            let player_tier = holding.iter().any(|&i| players[i].bet == 0);
            if player_tier && players.iter().any(|p| p.bet > 0) {
                self.pots.push(Pot::default());
            }
        }
    }

    fn drop_empty_tail(&mut self) {
        if self.pots.len() > 1 && self.pots.last().is_some_and(|pot| pot.amount == 0) {
            self.pots.pop();
        }
    }

    /// A pot is capped once one of its contributors is all-in with nothing
    /// left to put in; later chips must go to a new pot.
    fn active_pot_is_capped(&self, players: &[Player]) -> bool {
        let Some(pot) = self.pots.last() else {
            return false;
        };
        pot.amount > 0
            && players.iter().any(|p| {
                p.state == PlayerState::AllIn && p.bet == 0 && pot.contributors.contains(&p.user.id)
            })
    }

    /// Award every pot. Players must already hold an evaluated `hand`.
    ///
    /// Winners are the sole present contributor, or the contending
    /// contributors with the best hand. An odd chip goes to the first
    /// winner clockwise from the dealer. Pots are emptied.
    pub fn distribute(&mut self, players: &mut [Player], dealer_idx: Option<SeatIndex>) -> Vec<Payout> {
        let mut payouts = Vec::new();
        let pots = std::mem::take(&mut self.pots);

        for (pot_idx, pot) in pots.into_iter().enumerate() {
            if pot.amount == 0 {
                continue;
            }
            let winners = pot_winners(&pot, players);
            if winners.is_empty() {
                log::warn!("No players left to award pot {pot_idx} of {}", pot.amount);
                continue;
            }

            let n = Chips::try_from(winners.len()).unwrap_or(Chips::MAX);
            let share = pot.amount / n;
            let remainder = pot.amount % n;
            let odd_chip = odd_chip_recipient(&winners, players.len(), dealer_idx);

            for &i in &winners {
                let amount = share + if Some(i) == odd_chip { remainder } else { 0 };
                let player = &mut players[i];
                player.add_chips(amount);
                player.state = PlayerState::Winner;
                log::info!("{} wins {amount} from pot {pot_idx}", player.user.name);
                payouts.push(Payout {
                    player: player.user.id.clone(),
                    amount,
                    pot_idx,
                });
            }
        }

        payouts
    }
}

fn pot_winners(pot: &Pot, players: &[Player]) -> Vec<usize> {
    let present: Vec<usize> = (0..players.len())
        .filter(|&i| pot.contributors.contains(&players[i].user.id))
        .collect();
    if present.len() == 1 {
        return present;
    }

    let contending: Vec<usize> = present
        .iter()
        .copied()
        .filter(|&i| players[i].state.is_contender())
        .collect();
    let pool = if !contending.is_empty() {
        contending
    } else if !present.is_empty() {
        present
    } else {
        (0..players.len())
            .filter(|&i| players[i].state.is_contender())
            .collect()
    };

    let strength = |i: usize| players[i].hand.unwrap_or(HandStrength::WORST);
    let Some(best) = pool.iter().map(|&i| strength(i)).min() else {
        return Vec::new();
    };
    pool.into_iter().filter(|&i| strength(i) == best).collect()
}

fn odd_chip_recipient(winners: &[usize], n: usize, dealer_idx: Option<SeatIndex>) -> Option<usize> {
    let start = dealer_idx.map_or(0, |d| d + 1);
    (0..n)
        .map(|k| (start + k) % n)
        .find(|i| winners.contains(i))
}
