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

//! Progress reporting to stderr, so stdout stays free for a future
//! machine-readable mode. No logging framework: the whole program is one
//! long-running loop reporting to a human at a terminal, same as the
//! teacher crate's own tuner (`tune.rs`) reports its iterations.

use std::time::Instant;

/// The start of the run, used to compute cycles/second and ETA. Set once by
/// [`report_start`] and read back by [`report_cycle`].
static RUN_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Reports that training is starting, naming the corpus size and thread
/// count, and records the start time for later ETA/throughput reporting.
pub fn report_start(event_count: usize, thread_count: usize, weights_count: usize) {
    let _ = RUN_START.set(Instant::now());
    eprintln!(
        "training on {event_count} event(s) with {thread_count} worker thread(s), {weights_count} weights"
    );
}

/// Reports how many cycles have run so far, the overall progress against
/// `max_cycles` (treated as unbounded if it is `u64::MAX`), the current
/// aggregate rank with its per-event breakdown, and a snapshot of the
/// crafter's search state.
pub fn report_cycle(
    cycle: u64,
    max_cycles: u64,
    ranks_total: u64,
    event_count: u64,
    breakdown: &[(String, u32)],
    crawling: bool,
    max_weight_delta: u32,
) {
    let elapsed = RUN_START.get().map_or(0.0, |start| start.elapsed().as_secs_f64());
    #[allow(clippy::cast_precision_loss)]
    let cycles_per_second = if elapsed > 0.0 { cycle as f64 / elapsed } else { 0.0 };

    let progress_line = if max_cycles == u64::MAX {
        format!("cycle {cycle} ({cycles_per_second:.1} cycles/s)")
    } else {
        #[allow(clippy::cast_precision_loss)]
        let percent = 100.0 * cycle as f64 / max_cycles as f64;
        let eta = if cycles_per_second > 0.0 {
            #[allow(clippy::cast_precision_loss)]
            let remaining = (max_cycles - cycle) as f64 / cycles_per_second;
            format!("{remaining:.0}s")
        } else {
            "unknown".to_owned()
        };
        format!("cycle {cycle}/{max_cycles} ({percent:.1}%, {cycles_per_second:.1} cycles/s, ETA {eta})")
    };

    let phase = if crawling { "crawl" } else { "explore" };
    eprintln!(
        "{progress_line}: rank total {ranks_total}/{event_count} [{phase}, max delta {max_weight_delta}]"
    );
    for (name, rank) in breakdown {
        eprintln!("  {name}: rank {rank}");
    }
}

/// Reports that a stop was requested and the loop is winding down.
pub fn report_stopping() {
    eprintln!("stop requested, finishing the current cycle...");
}

/// Reports the final per-event ranking after training completes.
pub fn report_final_ranking(event_name: &str, ranked: &[(&str, i64)], winner_name: &str) {
    eprintln!("--- {event_name} ---");
    for (position, (name, sink)) in ranked.iter().enumerate() {
        let marker = if *name == winner_name { " <- winner" } else { "" };
        eprintln!("  {}. {name} ({sink}){marker}", position + 1);
    }
}

/// Reports where the final weights were written.
pub fn report_weights_written(path: &str) {
    eprintln!("wrote weights to {path}");
}
