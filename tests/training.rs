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

//! End-to-end exercise of the training loop: build a small corpus, bind a
//! starting weight vector, run a short training cycle budget, and check the
//! invariants spec.md §8 names against the result.

use std::io::Cursor;

use lazy_static::lazy_static;
use rank_trainer::{
    crafter::Crafter,
    event::{write_event_file, Event},
    trainer::Trainer,
};

lazy_static! {
    /// Encoded event file bytes shared by every test that needs a small
    /// two-candidate corpus, built once rather than re-encoded per test.
    static ref TWO_CANDIDATE_BYTES: Vec<u8> = {
        let mut buf = Vec::new();
        write_event_file(
            &mut buf,
            2,
            2,
            8,
            &[("alpha", vec![3, 1, 4, 1]), ("beta", vec![2, 7, 1, 8])],
        )
        .expect("writing to a Vec cannot fail");
        buf
    };
    /// A single-candidate corpus: the winner always ranks first regardless
    /// of the bound weights, useful for exercising the optimum-reached exit.
    static ref SOLO_BYTES: Vec<u8> = {
        let mut buf = Vec::new();
        write_event_file(&mut buf, 2, 2, 4, &[("solo", vec![1, 2, 3, 4])]).expect("writing to a Vec cannot fail");
        buf
    };
}

fn two_candidate_event() -> Event {
    Event::load(Cursor::new(TWO_CANDIDATE_BYTES.clone()), "two-candidate".to_owned(), "test.bin", "beta")
        .expect("the written bytes are a well-formed event")
}

#[test]
fn short_training_run_never_worsens_the_rank_total() {
    let event = two_candidate_event();
    let weights_count = event.required_weights_count();
    let crafter = Crafter::with_starting_point(weights_count, vec![0; weights_count]);

    let trainer = Trainer::new(vec![event], crafter, 2, 200);
    let result = trainer.run();

    // the event has 2 candidates, so the winner's rank is always 1 or 2
    assert!(result.final_ranks_total >= 1 && result.final_ranks_total <= 2);
    assert!(result.cycles <= 200);
    for &w in &result.weights {
        assert!(w >= i16::MIN && w <= i16::MAX);
    }
}

#[test]
fn training_run_honours_a_zero_max_cycles_sentinel_by_not_hanging_forever() {
    // max_cycles = 0 means unbounded; give the run an achievable exit
    // condition instead (rank total reaching its optimum of 1) by starting
    // already at the optimum: a single-candidate event always ranks its own
    // winner first.
    let event = Event::load(Cursor::new(SOLO_BYTES.clone()), "solo-event".to_owned(), "test.bin", "solo").unwrap();
    let weights_count = event.required_weights_count();
    let crafter = Crafter::with_starting_point(weights_count, vec![1; weights_count]);

    let trainer = Trainer::new(vec![event], crafter, 1, 0);
    let result = trainer.run();

    assert_eq!(result.final_ranks_total, 1);
}

#[test]
fn multiple_events_sum_their_ranks() {
    let a = two_candidate_event();
    let b = two_candidate_event();
    let weights_count = a.required_weights_count();
    let crafter = Crafter::with_starting_point(weights_count, vec![0; weights_count]);

    let trainer = Trainer::new(vec![a, b], crafter, 2, 50);
    assert_eq!(trainer.event_count(), 2);
    let result = trainer.run();

    // each event's winner rank is between 1 and 2, so the pair sums to
    // between 2 and 4
    assert!(result.final_ranks_total >= 2 && result.final_ranks_total <= 4);
}

#[test]
#[should_panic(expected = "at least one event")]
fn trainer_requires_at_least_one_event() {
    let crafter = Crafter::with_starting_point(4, vec![0; 4]);
    let _ = Trainer::new(Vec::new(), crafter, 1, 10);
}
