//! Hand evaluation.
//!
//! [`rank5`] scores exactly five cards with three table lookups. [`rank_best`]
//! reduces hole and community cards to the best five-card hand according to
//! a [`HoleCardRule`].

use serde::{Deserialize, Serialize};

use super::{
    constants::{COMMUNITY_CARDS, HAND_SIZE, HOLE_CARDS},
    entities::{Card, HandStrength, Suit},
    tables::tables,
};

/// Which five-card subsets of hole + community cards may form a hand.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoleCardRule {
    /// Any five of the available cards (standard Hold'em).
    #[default]
    AnyFive,
    /// Both hole cards plus exactly three community cards.
    BothHoleCards,
}

/// Iterative choose-`K`-of-`n` generator yielding index tuples in
/// lexicographic order.
#[derive(Clone, Debug)]
pub struct Combinations<const K: usize> {
    n: usize,
    indices: [usize; K],
    done: bool,
}

impl<const K: usize> Combinations<K> {
    #[must_use]
    pub fn new(n: usize) -> Self {
        let mut indices = [0; K];
        for (i, idx) in indices.iter_mut().enumerate() {
            *idx = i;
        }
        Self {
            n,
            indices,
            done: K > n,
        }
    }
}

impl<const K: usize> Iterator for Combinations<K> {
    type Item = [usize; K];

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.indices;

        // Bump the rightmost index that still has room, then reset the
        // ones after it to consecutive values.
        let mut i = K;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.indices[i] < self.n - K + i {
                self.indices[i] += 1;
                for j in i + 1..K {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }

        Some(current)
    }
}

/// Score five distinct cards. Lower strength is better.
#[must_use]
pub fn rank5(cards: &[Card; HAND_SIZE]) -> HandStrength {
    let t = tables();
    let [a, b, c, d, e] = cards.map(Card::encoding);
    let index = ((a | b | c | d | e) >> 16) as usize;

    let strength = if a & b & c & d & e & 0xF000 != 0 {
        t.flushes[index]
    } else if t.unique[index] != 0 {
        t.unique[index]
    } else {
        t.paired([a, b, c, d, e].iter().map(|x| x & 0xFF).product())
    };

    // Zero only comes back for impossible input such as a repeated card.
    if strength == 0 {
        HandStrength::WORST
    } else {
        HandStrength::new(strength)
    }
}

/// Best hand made from `hole` and `community`. Returns the worst possible
/// hand when the rule can't be satisfied with the cards given.
#[must_use]
pub fn rank_best(hole: &[Card], community: &[Card], rule: HoleCardRule) -> HandStrength {
    match rule {
        HoleCardRule::AnyFive => {
            let mut pool = [Card(2, Suit::Club); HOLE_CARDS + COMMUNITY_CARDS];
            let mut n = 0;
            for (slot, card) in pool.iter_mut().zip(hole.iter().chain(community)) {
                *slot = *card;
                n += 1;
            }
            Combinations::<HAND_SIZE>::new(n)
                .map(|combo| rank5(&combo.map(|i| pool[i])))
                .min()
                .unwrap_or(HandStrength::WORST)
        }
        HoleCardRule::BothHoleCards => {
            let [first, second] = match hole {
                [first, second] => [*first, *second],
                _ => return HandStrength::WORST,
            };
            Combinations::<3>::new(community.len())
                .map(|[i, j, k]| rank5(&[community[i], community[j], community[k], first, second]))
                .min()
                .unwrap_or(HandStrength::WORST)
        }
    }
}
