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

//! The top-level training loop: dispatches digraph evaluation across the
//! worker pool, aggregates ranks, drives the [`Crafter`], reports progress,
//! and persists the best weights found.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::{crafter::Crafter, event::Event, pool::WorkerPool, progress, signal};

/// `max_cycles = 0` on the command line means unbounded (see `cli.rs`);
/// internally that is represented as "never hit the cycle limit".
const UNBOUNDED_CYCLES: u64 = u64::MAX;

/// How often, at minimum, a progress record is emitted while nothing is
/// improving.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

/// Owns the event corpus, the crafter and the worker pool, and runs the
/// search described in spec.md §4.5.
pub struct Trainer {
    /// Every event in the training corpus, wrapped so a worker-pool task can
    /// mutate its own event independently of the others.
    events: Vec<Arc<Mutex<Event>>>,
    /// The stochastic search engine proposing new weight vectors.
    crafter: Crafter,
    /// The fixed-size worker pool used for per-cycle evaluation fan-out.
    pool: WorkerPool,
    /// `0` (from the CLI) is translated to [`UNBOUNDED_CYCLES`] here so the
    /// loop condition in [`Trainer::run`] never special-cases it.
    max_cycles: u64,
}

/// What [`Trainer::run`] returned the search with, for the final report.
pub struct TrainingResult {
    /// The best weight vector found across the whole run.
    pub weights: Vec<i16>,
    /// How many cycles were actually run.
    pub cycles: u64,
    /// The ranks-total of the final, persisted weight vector.
    pub final_ranks_total: u64,
}

impl Trainer {
    /// Creates a [`Trainer`] over `events`, searching for `events[i]`'s
    /// shared `required_weights_count`.
    ///
    /// # Panics
    ///
    /// Panics if `events` is empty, or if `crafter` was built for a
    /// different `required_weights_count` than the events imply.
    pub fn new(events: Vec<Event>, crafter: Crafter, thread_count: usize, max_cycles: u64) -> Self {
        assert!(!events.is_empty(), "a trainer needs at least one event");
        let events = events.into_iter().map(|e| Arc::new(Mutex::new(e))).collect();
        Self {
            events,
            crafter,
            pool: WorkerPool::new(thread_count),
            max_cycles: if max_cycles == 0 { UNBOUNDED_CYCLES } else { max_cycles },
        }
    }

    /// How many events this trainer is searching against.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// How many worker threads back this trainer's evaluation fan-out.
    pub fn thread_count(&self) -> usize {
        self.pool.thread_count()
    }

    /// Runs the training loop until `max_cycles` is reached, a stop is
    /// requested, or the aggregate rank reaches its optimum
    /// (`event_count`), then calls [`Crafter::finalize`] and returns the
    /// persisted weights.
    pub fn run(mut self) -> TrainingResult {
        progress::report_start(self.events.len(), self.thread_count(), self.crafter.best().len());

        // establish the rank of the crafter's starting point (`best`, before
        // any alteration) as the baseline every candidate is measured against
        let baseline: Arc<[i16]> = self.crafter.best().to_vec().into();
        self.bind_weights(&baseline);
        let optimum = self.events.len() as u64;
        let mut ranks_total = self.evaluate_and_sum();
        let mut cycle = 0u64;
        let mut last_report = Instant::now();

        while cycle < self.max_cycles && ranks_total != optimum {
            if signal::stop_requested() {
                progress::report_stopping();
                break;
            }

            let weights: Arc<[i16]> = self.crafter.current().to_vec().into();
            self.bind_weights(&weights);
            let candidate_ranks_total = self.evaluate_and_sum();

            let improved = candidate_ranks_total < ranks_total;
            if improved {
                ranks_total = candidate_ranks_total;
                self.crafter.notify_improve();
            } else {
                self.crafter.notify_no_improve();
            }

            cycle += 1;

            if improved || last_report.elapsed() >= PROGRESS_INTERVAL {
                self.report_progress(cycle, ranks_total);
                last_report = Instant::now();
            }
        }

        let weights = self.crafter.finalize();
        let final_weights: Arc<[i16]> = weights.clone().into();
        self.bind_weights(&final_weights);
        let final_ranks_total = self.evaluate_and_sum();
        self.report_final_ranking();

        TrainingResult {
            weights,
            cycles: cycle,
            final_ranks_total,
        }
    }

    /// Binds `weights` to every event's digraphs.
    fn bind_weights(&self, weights: &Arc<[i16]>) {
        for event in &self.events {
            event
                .lock()
                .expect("event mutex was poisoned by a panicking worker")
                .bind_weights(weights);
        }
    }

    /// Submits one evaluation task per event to the pool, waits for all of
    /// them, and sums the resulting winner ranks.
    fn evaluate_and_sum(&self) -> u64 {
        let tasks = self
            .events
            .iter()
            .map(|event| {
                let event = Arc::clone(event);
                Box::new(move || {
                    event
                        .lock()
                        .expect("event mutex was poisoned by a panicking worker")
                        .evaluate();
                }) as Box<dyn FnOnce() + Send + 'static>
            })
            .collect();
        self.pool.submit_batch(tasks);

        self.events
            .iter()
            .map(|event| {
                u64::from(
                    event
                        .lock()
                        .expect("event mutex was poisoned by a panicking worker")
                        .winner_rank(),
                )
            })
            .sum()
    }

    /// Emits a progress record with the per-event rank breakdown and a
    /// snapshot of the crafter's search state.
    fn report_progress(&self, cycle: u64, ranks_total: u64) {
        let breakdown: Vec<(String, u32)> = self
            .events
            .iter()
            .map(|event| {
                let event = event.lock().expect("event mutex was poisoned by a panicking worker");
                (event.name().to_string(), event.winner_rank())
            })
            .collect();

        progress::report_cycle(
            cycle,
            self.max_cycles,
            ranks_total,
            self.events.len() as u64,
            &breakdown,
            self.crafter.is_crawling(),
            self.crafter.max_weight_delta(),
        );
    }

    /// Prints the final per-event ranking after training completes.
    fn report_final_ranking(&self) {
        for event in &self.events {
            let event = event.lock().expect("event mutex was poisoned by a panicking worker");
            progress::report_final_ranking(event.name(), &event.ranked_candidates(), event.winner_name());
        }
    }
}
