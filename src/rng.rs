/*
 * rank-trainer, a stochastic weight search engine for ranking problems
 * Copyright (C) 2026 rank-trainer contributors
 *
 * rank-trainer is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the Free
 * Software Foundation, either version 3 of the License, or (at your option)
 * any later version.
 *
 * rank-trainer is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
 * Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along
 * with rank-trainer. If not, see <https://www.gnu.org/licenses/>.
 */

//! Randomness for the [`Crafter`](crate::crafter::Crafter): a seeded
//! [`Rand64`] plus a bulk-boolean extractor, in the same style the teacher
//! crate seeds its own `Rand64` generators (see `find_magics.rs`,
//! `fen_generation.rs`).

use std::time::{SystemTime, UNIX_EPOCH};

use oorandom::Rand64;

/// Creates a [`Rand64`] seeded from the current time.
pub fn seeded_rng() -> Rand64 {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_nanos();
    Rand64::new(seed)
}

/// Dispenses random bits one at a time, drawing a fresh `u64` from the
/// underlying generator only once its 64 bits are exhausted.
pub struct BitSource {
    /// The bits not yet handed out from `word`.
    remaining: u32,
    /// The word currently being drained, least-significant bit first.
    word: u64,
}

impl BitSource {
    /// Creates an empty [`BitSource`]; the first call to
    /// [`BitSource::next_bool`] draws a fresh word.
    pub const fn new() -> Self {
        Self {
            remaining: 0,
            word: 0,
        }
    }

    /// Returns the next random boolean, refilling from `rng` if needed.
    pub fn next_bool(&mut self, rng: &mut Rand64) -> bool {
        if self.remaining == 0 {
            self.word = rng.rand_u64();
            self.remaining = u64::BITS;
        }
        let bit = self.word & 1 == 1;
        self.word >>= 1;
        self.remaining -= 1;
        bit
    }
}

impl Default for BitSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Samples a geometric random variable with success probability `p`,
/// returning the number of failures before the first success (so the
/// result is `0` with probability `p`).
///
/// Uses the standard inverse-transform construction
/// `floor(ln(1 - u) / ln(1 - p))` for `u` uniform on `[0, 1)`. `p` must be in
/// `(0, 1]`.
pub fn sample_geometric(rng: &mut Rand64, p: f64) -> u64 {
    debug_assert!(p > 0.0 && p <= 1.0, "geometric parameter out of range");
    if p >= 1.0 {
        return 0;
    }
    let u = rng.rand_float();
    let x = ((1.0 - u).ln() / (1.0 - p).ln()).floor();
    if x.is_finite() && x >= 0.0 {
        x as u64
    } else {
        0
    }
}
