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

//! The weights crafter: a stochastic local search over a single weight
//! vector, shared by every candidate in every event during a cycle.
//!
//! Each cycle the [`Trainer`](crate::trainer::Trainer) asks the [`Crafter`]
//! for an altered vector, rebinds it to every digraph, evaluates, aggregates
//! rank, and reports back whether the aggregate improved via
//! [`Crafter::notify_improve`]/[`Crafter::notify_no_improve`]. The crafter
//! never sees events or ranks itself; it only ever sees "improved" or "did
//! not improve".
//!
//! `crawl` and `previously_improved` together form a 3-state machine, driven
//! entirely by the two `notify_*` entry points:
//!
//! - `(crawl=false, _)`: broad exploration. A failed cycle narrows the
//!   sparse alteration probability and shrinks the maximum delta a little.
//! - `(crawl=true, previously_improved=false)`: a random perturbation just
//!   improved on `best`; the crafter walks the same direction pattern with
//!   unit steps to see how far the improvement extends.
//! - `(crawl=true, previously_improved=true)`: a crawl step just failed to
//!   improve further; the crafter flips every alteration direction and tries
//!   once more before giving up on this neighbourhood.

use crate::rng::{sample_geometric, seeded_rng, BitSource};
use oorandom::Rand64;

/// Each failed exploration cycle multiplies the alteration probability by
/// this factor, narrowing the sparse set of weights touched per attempt.
const ALTERINGS_P_MULTIPLIER: f64 = 0.99;

/// The alteration probability never decays below this floor before being
/// reset back to the full-width starting point.
const ALTERINGS_MIN_P: f64 = 0.1;

/// The largest magnitude an alteration may ever have: the full span of an
/// `i16`, `u16::MAX`.
const MAX_WEIGHT_DELTA_CAP: u32 = 65535;

/// The most the maximum alteration magnitude may shrink by in a single
/// unsuccessful exploration cycle.
const MAX_WEIGHT_DELTA_DECREMENT_CAP: u32 = 65;

/// Clamps a widened sum back into `i16` range instead of wrapping, matching
/// the saturating-arithmetic contract the rest of the pipeline uses.
fn saturating_weight(base: i16, delta: i32) -> i16 {
    let widened = i32::from(base) + delta;
    widened.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Drives the stochastic search for a single weight vector shared by every
/// event in the training corpus.
pub struct Crafter {
    /// The number of weights in the vector being searched.
    weights_count: usize,
    /// The vector currently bound to every digraph, offered for evaluation.
    current: Vec<i16>,
    /// The best vector found so far; `current` is always derived from this.
    best: Vec<i16>,
    /// Indices chosen by the most recent [`Crafter::randomize_alterings`].
    alter_indices: Vec<usize>,
    /// `true` means "up", `false` means "down", one per entry of
    /// `alter_indices`.
    alter_directions: Vec<bool>,
    /// Scalar in `(0, weights_count]` controlling the geometric sparsity of
    /// the alteration set.
    p_numerator: f64,
    /// The current cap on an individual non-crawl alteration's magnitude, in
    /// `[1, W - 1]`.
    max_weight_delta: u32,
    /// Whether the crafter is in local, unit-step search around `best`.
    crawl: bool,
    /// Whether the most recent acceptance happened inside the current phase.
    previously_improved: bool,
    /// This crafter's private generator; touched only by the trainer thread.
    rng: Rand64,
    /// Bulk-boolean extractor backing the alteration direction draws.
    bits: BitSource,
}

impl Crafter {
    /// Creates a new [`Crafter`] searching over a vector of `weights_count`
    /// weights, each initialized uniformly at random in
    /// `[i16::MIN, i16::MAX]`, with an initial alteration plan already
    /// chosen and applied (retrying until at least one weight actually
    /// changes, per spec.md §4.3's initialization).
    pub fn new(weights_count: usize) -> Self {
        let mut rng = seeded_rng();
        let span = u64::from(u16::MAX) + 1;
        let current: Vec<i16> = (0..weights_count)
            .map(|_| rng.rand_range(0..span) as i32 + i32::from(i16::MIN))
            .map(|w| w as i16)
            .collect();

        let mut crafter = Self {
            weights_count,
            best: current.clone(),
            current,
            alter_indices: Vec::new(),
            alter_directions: Vec::new(),
            p_numerator: 0.0,
            max_weight_delta: 0,
            crawl: false,
            previously_improved: false,
            rng,
            bits: BitSource::new(),
        };

        crafter.randomize_alterings();
        while !crafter.alter() {
            crafter.randomize_alterings();
        }
        crafter
    }

    /// Creates a [`Crafter`] that starts its search from a pre-existing
    /// weight vector (for example, one loaded from a weights file) instead
    /// of from randomly initialized weights.
    ///
    /// # Panics
    ///
    /// Panics if `weights.len()` does not match `weights_count`.
    pub fn with_starting_point(weights_count: usize, weights: Vec<i16>) -> Self {
        assert_eq!(
            weights.len(),
            weights_count,
            "starting weights have the wrong length"
        );
        let mut crafter = Self {
            weights_count,
            best: weights.clone(),
            current: weights,
            alter_indices: Vec::new(),
            alter_directions: Vec::new(),
            p_numerator: 0.0,
            max_weight_delta: 0,
            crawl: false,
            previously_improved: false,
            rng: seeded_rng(),
            bits: BitSource::new(),
        };
        crafter.randomize_alterings();
        while !crafter.alter() {
            crafter.randomize_alterings();
        }
        crafter
    }

    /// Chooses a new sparse set of weight indices to alter next, and a
    /// direction for each.
    ///
    /// Resets to broad exploration (`crawl = false`,
    /// `previously_improved = false`), decays `p_numerator` geometrically
    /// and resets it once it gets too small, samples a geometric run length
    /// to bound the gaps between chosen indices, and picks an independent
    /// random direction for each chosen index.
    pub fn randomize_alterings(&mut self) {
        self.crawl = false;
        self.previously_improved = false;

        self.p_numerator *= ALTERINGS_P_MULTIPLIER;
        if self.p_numerator < ALTERINGS_MIN_P {
            self.p_numerator = self.weights_count as f64 * ALTERINGS_P_MULTIPLIER;
        }

        self.alter_indices.clear();
        self.alter_directions.clear();

        if self.weights_count == 0 {
            return;
        }

        let p = (self.p_numerator / self.weights_count as f64).clamp(f64::MIN_POSITIVE, 1.0);
        let x = sample_geometric(&mut self.rng, p);
        let max_interval = (x + 1).min(self.weights_count as u64) as usize;

        if max_interval > 1 {
            let mut index = self.rng.rand_range(0..max_interval as u64) as usize;
            while index < self.weights_count {
                self.alter_indices.push(index);
                self.alter_directions.push(self.bits.next_bool(&mut self.rng));
                let stride = 1 + self.rng.rand_range(0..max_interval as u64) as usize;
                index += stride;
            }
        } else {
            for index in 0..self.weights_count {
                self.alter_indices.push(index);
                self.alter_directions.push(self.bits.next_bool(&mut self.rng));
            }
        }
    }

    /// Applies the current alteration plan to `current` (starting fresh from
    /// `best`), and returns whether any weight actually changed.
    ///
    /// In crawl phase, moves each chosen index by a unit step in its
    /// direction, clamped at the weight bounds; a clamp that cancels the
    /// move means that index did not contribute. Otherwise, draws a fresh
    /// `max_weight_delta` (shrinking it, or resetting it to the cap if the
    /// shrink would drive it non-positive) and moves each chosen index by an
    /// independent random magnitude up to that cap.
    pub fn alter(&mut self) -> bool {
        self.current.clone_from(&self.best);
        let mut changed = false;

        if self.crawl {
            for (&index, &up) in self.alter_indices.iter().zip(&self.alter_directions) {
                let delta = if up { 1 } else { -1 };
                let before = self.current[index];
                self.current[index] = saturating_weight(before, delta);
                changed |= self.current[index] != before;
            }
            return changed;
        }

        let decrement = 1 + self.rng.rand_range(0..u64::from(MAX_WEIGHT_DELTA_DECREMENT_CAP)) as u32;
        if decrement + 2 > self.max_weight_delta {
            self.max_weight_delta = MAX_WEIGHT_DELTA_CAP;
        } else {
            self.max_weight_delta -= decrement;
        }

        for (&index, &up) in self.alter_indices.iter().zip(&self.alter_directions) {
            let magnitude = 1 + self.rng.rand_range(0..u64::from(self.max_weight_delta)) as i32;
            let delta = if up { magnitude } else { -magnitude };
            let before = self.current[index];
            self.current[index] = saturating_weight(before, delta);
            changed |= self.current[index] != before;
        }
        changed
    }

    /// Applies `alter()`, retrying with a fresh [`Crafter::randomize_alterings`]
    /// plan until at least one weight actually changes (or the vector is
    /// empty, in which case there is nothing to change and the loop would
    /// never terminate otherwise).
    fn alter_until_changed(&mut self) {
        if self.weights_count == 0 {
            self.alter();
            return;
        }
        while !self.alter() {
            self.randomize_alterings();
        }
    }

    /// Records that the most recent `current` improved on `best`.
    ///
    /// Promotes `current` into `best`, leaves `crawl` exactly as it was, and
    /// proposes the next candidate immediately (re-randomizing the plan only
    /// if that candidate turns out identical to `best`) so the trainer
    /// always has a fresh `current` to bind after a `notify_*` call.
    pub fn notify_improve(&mut self) {
        self.best.clone_from(&self.current);
        self.previously_improved = true;
        self.alter_until_changed();
    }

    /// Records that the most recent `current` did not improve on `best`,
    /// and walks the 4-row transition table from spec.md §4.3 to decide the
    /// next alteration plan.
    pub fn notify_no_improve(&mut self) {
        match (self.crawl, self.previously_improved) {
            (false, false) => {
                self.randomize_alterings();
            }
            (false, true) => {
                self.crawl = true;
                self.previously_improved = false;
            }
            (true, false) => {
                for direction in &mut self.alter_directions {
                    *direction = !*direction;
                }
                self.previously_improved = true;
            }
            (true, true) => {
                self.randomize_alterings();
            }
        }
        self.alter_until_changed();
    }

    /// Copies `best` into `current`, guaranteeing the persisted weight
    /// vector is the best observed, then returns it.
    pub fn finalize(mut self) -> Vec<i16> {
        self.current.clone_from(&self.best);
        self.best
    }

    /// The best weight vector found so far, without consuming the crafter.
    pub fn best(&self) -> &[i16] {
        &self.best
    }

    /// The vector most recently produced by [`Crafter::alter`], ready to be
    /// bound to every digraph for evaluation.
    pub fn current(&self) -> &[i16] {
        &self.current
    }

    /// Whether the crafter is currently in the unit-step crawl phase, for
    /// progress snapshots.
    pub const fn is_crawling(&self) -> bool {
        self.crawl
    }

    /// The current maximum alteration magnitude, for progress snapshots.
    pub const fn max_weight_delta(&self) -> u32 {
        self.max_weight_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_crafter_differs_from_best_by_construction() {
        // the initialization protocol requires at least one alteration to
        // have actually taken effect
        let crafter = Crafter::new(64);
        assert_ne!(crafter.current(), crafter.best());
    }

    #[test]
    fn weights_stay_in_bounds() {
        let crafter = Crafter::new(256);
        for &w in crafter.current() {
            assert!(w >= i16::MIN && w <= i16::MAX);
        }
        for &w in crafter.best() {
            assert!(w >= i16::MIN && w <= i16::MAX);
        }
    }

    #[test]
    fn randomize_alterings_stays_in_bounds() {
        let mut crafter = Crafter::with_starting_point(32, vec![0; 32]);
        for _ in 0..50 {
            crafter.randomize_alterings();
            for &index in &crafter.alter_indices {
                assert!(index < 32);
            }
            assert_eq!(crafter.alter_indices.len(), crafter.alter_directions.len());
        }
    }

    #[test]
    fn empty_vector_never_alters_anything() {
        let mut crafter = Crafter::with_starting_point(0, Vec::new());
        crafter.randomize_alterings();
        assert!(crafter.alter_indices.is_empty());
        assert!(!crafter.alter());
    }

    #[test]
    fn improve_promotes_current_into_best() {
        let mut crafter = Crafter::with_starting_point(3, vec![0, 0, 0]);
        let candidate = crafter.current().to_vec();
        crafter.notify_improve();
        assert_eq!(crafter.best(), candidate.as_slice());
        assert!(crafter.previously_improved);
    }

    #[test]
    fn no_improve_reverts_towards_best_before_the_next_alteration() {
        let mut crafter = Crafter::with_starting_point(3, vec![5, 5, 5]);
        crafter.notify_no_improve();
        // best was never touched, so every future `current` is still
        // derived from the original starting point
        assert_eq!(crafter.best(), &[5, 5, 5]);
    }

    #[test]
    fn crawl_begins_only_after_a_failure_following_an_improvement() {
        let mut crafter = Crafter::with_starting_point(8, vec![0; 8]);

        // an improvement alone does not start crawling...
        crafter.notify_improve();
        assert!(!crafter.is_crawling());

        // ...but the first failure right after one does
        crafter.notify_no_improve();
        assert!(crafter.is_crawling());
        assert!(!crafter.previously_improved);

        // a second failure while crawling flips directions and tries once more
        crafter.notify_no_improve();
        assert!(crafter.is_crawling());
        assert!(crafter.previously_improved);

        // a third consecutive failure exhausts the neighbourhood
        crafter.notify_no_improve();
        assert!(!crafter.is_crawling());
    }

    #[test]
    fn saturating_weight_clamps_instead_of_wrapping() {
        assert_eq!(saturating_weight(i16::MAX, 1000), i16::MAX);
        assert_eq!(saturating_weight(i16::MIN, -1000), i16::MIN);
        assert_eq!(saturating_weight(10, 5), 15);
    }

    #[test]
    fn finalize_returns_best_and_sets_current_to_match() {
        let mut crafter = Crafter::with_starting_point(2, vec![1, 2]);
        crafter.notify_improve();
        let best_before = crafter.best().to_vec();
        assert_eq!(crafter.finalize(), best_before);
    }

    #[test]
    fn saturated_weights_still_eventually_change_via_retry() {
        // all weights pinned at MAX with an "up" direction cannot change via
        // a single alter() call; the retry loop must eventually pick a
        // direction/index combination that does change something.
        let mut crafter = Crafter::with_starting_point(4, vec![i16::MAX; 4]);
        crafter.notify_no_improve();
        assert_ne!(crafter.current(), crafter.best());
    }
}
