//! Lookup tables for the five-card evaluator.
//!
//! Strengths `1..=7462` are assigned by walking every distinct five-card
//! hand best first:
//!
//! | category        | strengths   | table    |
//! |-----------------|-------------|----------|
//! | straight flush  | 1-10        | flushes  |
//! | four of a kind  | 11-166      | hash     |
//! | full house      | 167-322     | hash     |
//! | flush           | 323-1599    | flushes  |
//! | straight        | 1600-1609   | unique   |
//! | three of a kind | 1610-2467   | hash     |
//! | two pair        | 2468-3325   | hash     |
//! | one pair        | 3326-6185   | hash     |
//! | high card       | 6186-7462   | unique   |
//!
//! Hands with five distinct ranks are indexed by their 13-bit rank mask.
//! Everything else is keyed by the product of its rank primes and found
//! through a perfect hash whose displacement table is computed once, the
//! first time the tables are touched.

use std::sync::OnceLock;

use super::entities::RANK_PRIMES;

const RANK_MASKS: usize = 1 << 13;
const BUCKETS: usize = 512;

/// Rank masks of the ten straights, ace-high first. The wheel (5-4-3-2-A)
/// is last.
const STRAIGHTS: [u16; 10] = [
    0x1F00, 0x0F80, 0x07C0, 0x03E0, 0x01F0, 0x00F8, 0x007C, 0x003E, 0x001F, 0x100F,
];

pub struct HandTables {
    /// Strength of a flush, indexed by rank mask.
    pub flushes: Box<[u16]>,
    /// Strength of a non-flush hand with five distinct ranks.
    pub unique: Box<[u16]>,
    /// Strengths of hands with paired ranks.
    pub by_product: PairedTable,
}

impl HandTables {
    /// Strength of a hand with at least one repeated rank, given the
    /// product of its five rank primes.
    #[must_use]
    pub fn paired(&self, product: u32) -> u16 {
        self.by_product.get(product)
    }
}

/// Paired-hand strengths keyed by prime product.
pub enum PairedTable {
    /// Perfect hash slots, with a per-bucket displacement XORed into the
    /// base slot.
    Hashed {
        values: Box<[u16]>,
        adjust: [u16; BUCKETS],
    },
    /// Keys in ascending order for binary search. Only used when no hash
    /// placement fits.
    Sorted(Box<[(u32, u16)]>),
}

impl PairedTable {
    fn new(entries: &[(u32, u16)]) -> Self {
        match perfect_hash(entries) {
            Some((values, adjust)) => Self::Hashed { values, adjust },
            None => {
                log::warn!(
                    "No perfect hash placement for {} keys, using sorted lookup",
                    entries.len()
                );
                Self::sorted(entries)
            }
        }
    }

    fn sorted(entries: &[(u32, u16)]) -> Self {
        let mut keys = entries.to_vec();
        keys.sort_unstable_by_key(|&(key, _)| key);
        Self::Sorted(keys.into_boxed_slice())
    }

    /// Strength for `product`, or 0 when the sorted table misses. The
    /// hashed table only answers for products it was built from.
    #[must_use]
    pub fn get(&self, product: u32) -> u16 {
        match self {
            Self::Hashed { values, adjust } => {
                let (bucket, base) = mix(product);
                values
                    .get(base ^ usize::from(adjust[bucket]))
                    .copied()
                    .unwrap_or(0)
            }
            Self::Sorted(keys) => keys
                .binary_search_by_key(&product, |&(key, _)| key)
                .map_or(0, |i| keys[i].1),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Hashed { values, .. } => values.len(),
            Self::Sorted(keys) => keys.len(),
        }
    }
}

/// Tables shared by every evaluation. Built on first use.
pub fn tables() -> &'static HandTables {
    static TABLES: OnceLock<HandTables> = OnceLock::new();
    TABLES.get_or_init(build)
}

/// Split a prime product into `(bucket, base slot)`.
fn mix(key: u32) -> (usize, usize) {
    let mut k = key.wrapping_add(0xe91a_aa35);
    k ^= k >> 16;
    k = k.wrapping_add(k << 8);
    k ^= k >> 4;
    let bucket = ((k >> 8) & 0x1ff) as usize;
    let base = (k.wrapping_add(k << 2) >> 19) as usize;
    (bucket, base)
}

fn product(ranks: &[usize]) -> u32 {
    ranks.iter().map(|&r| RANK_PRIMES[r]).product()
}

/// Ranks from ace (12) down to deuce (0).
fn descending() -> impl Iterator<Item = usize> + Clone {
    (0..13).rev()
}

fn build() -> HandTables {
    let mut flushes = vec![0u16; RANK_MASKS].into_boxed_slice();
    let mut unique = vec![0u16; RANK_MASKS].into_boxed_slice();
    let mut paired: Vec<(u32, u16)> = Vec::with_capacity(4888);
    let mut strength: u16 = 1;
    let mut next = || {
        let s = strength;
        strength += 1;
        s
    };

    for mask in STRAIGHTS {
        flushes[usize::from(mask)] = next();
    }

    for quad in descending() {
        for kicker in descending().filter(|&k| k != quad) {
            paired.push((product(&[quad, quad, quad, quad, kicker]), next()));
        }
    }

    for trips in descending() {
        for pair in descending().filter(|&p| p != trips) {
            paired.push((product(&[trips, trips, trips, pair, pair]), next()));
        }
    }

    let high_cards: Vec<u16> = (0..RANK_MASKS as u16)
        .rev()
        .filter(|mask| mask.count_ones() == 5 && !STRAIGHTS.contains(mask))
        .collect();

    for &mask in &high_cards {
        flushes[usize::from(mask)] = next();
    }

    for mask in STRAIGHTS {
        unique[usize::from(mask)] = next();
    }

    for trips in descending() {
        for k1 in descending().filter(|&k| k != trips) {
            for k2 in (0..k1).rev().filter(|&k| k != trips) {
                paired.push((product(&[trips, trips, trips, k1, k2]), next()));
            }
        }
    }

    for high in descending() {
        for low in (0..high).rev() {
            for kicker in descending().filter(|&k| k != high && k != low) {
                paired.push((product(&[high, high, low, low, kicker]), next()));
            }
        }
    }

    for pair in descending() {
        for k1 in descending().filter(|&k| k != pair) {
            for k2 in (0..k1).rev().filter(|&k| k != pair) {
                for k3 in (0..k2).rev().filter(|&k| k != pair) {
                    paired.push((product(&[pair, pair, k1, k2, k3]), next()));
                }
            }
        }
    }

    for &mask in &high_cards {
        unique[usize::from(mask)] = next();
    }

    let by_product = PairedTable::new(&paired);
    log::debug!(
        "Built hand tables: {} paired keys in {} slots",
        paired.len(),
        by_product.len()
    );

    HandTables {
        flushes,
        unique,
        by_product,
    }
}

/// Place every key with a greedy displacement search: buckets are filled
/// largest first and each takes the smallest adjust value whose slots are
/// all free. The table starts at 2^13 slots and doubles on failure, up
/// to 2^16 where a displacement still fits in a `u16`.
fn perfect_hash(entries: &[(u32, u16)]) -> Option<(Box<[u16]>, [u16; BUCKETS])> {
    let mut buckets: Vec<Vec<(usize, u16)>> = vec![Vec::new(); BUCKETS];
    for &(key, strength) in entries {
        let (bucket, base) = mix(key);
        buckets[bucket].push((base, strength));
    }

    let mut order: Vec<usize> = (0..BUCKETS).collect();
    order.sort_by(|&a, &b| buckets[b].len().cmp(&buckets[a].len()).then(a.cmp(&b)));

    (13..=16).find_map(|bits| place(&buckets, &order, 1 << bits))
}

fn place(
    buckets: &[Vec<(usize, u16)>],
    order: &[usize],
    size: usize,
) -> Option<(Box<[u16]>, [u16; BUCKETS])> {
    let mut values = vec![0u16; size].into_boxed_slice();
    let mut used = vec![false; size];
    let mut adjust = [0u16; BUCKETS];

    for &bucket in order {
        let slots = &buckets[bucket];
        let displacement = (0..size).find(|&a| {
            let mut seen: Vec<usize> = Vec::with_capacity(slots.len());
            slots.iter().all(|&(base, _)| {
                let idx = base ^ a;
                let free = idx < size && !used[idx] && !seen.contains(&idx);
                seen.push(idx);
                free
            })
        })?;

        adjust[bucket] = u16::try_from(displacement).ok()?;
        for &(base, strength) in slots {
            let idx = base ^ displacement;
            used[idx] = true;
            values[idx] = strength;
        }
    }

    Some((values, adjust))
}
