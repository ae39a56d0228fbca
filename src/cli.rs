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

//! Command-line argument parsing.
//!
//! Accepted invocation:
//!
//! `rank-trainer <max_cycles> <threads> (<winner> <event_file>)+ [<weights_file>]`
//!
//! - `max_cycles`: stop after this many cycles; `0` means run until stopped
//!   (by [`crate::signal`]) or until rank aggregation can no longer improve.
//! - `threads`: worker thread count for [`crate::pool::WorkerPool`]; `0`
//!   means derive one from the available parallelism.
//! - one or more `<winner> <event_file>` pairs: each names the candidate
//!   that should rank first in that event file.
//! - an optional trailing `<weights_file>`: a starting point for the search,
//!   instead of starting from all-zero weights.

use std::path::PathBuf;

use crate::error::TrainError;

/// One `(winner name, event file path)` pair taken from the command line.
pub struct EventSpec {
    /// The candidate name expected to win this event.
    pub winner: String,
    /// The path to the event file.
    pub path: PathBuf,
}

/// Parsed, validated command-line arguments.
pub struct Args {
    /// `0` means unbounded.
    pub max_cycles: u64,
    /// `0` means derive from available parallelism.
    pub threads: usize,
    /// Every event to train against, in the order given on the command line.
    pub events: Vec<EventSpec>,
    /// An optional starting weights file.
    pub weights_file: Option<PathBuf>,
}

impl Args {
    /// Parses `argv` (excluding the program name).
    pub fn parse<I: Iterator<Item = String>>(mut argv: I) -> Result<Self, TrainError> {
        let max_cycles = parse_u64(argv.next(), "max_cycles")?;
        let threads = parse_u64(argv.next(), "threads")? as usize;

        let rest: Vec<String> = argv.collect();
        if rest.is_empty() {
            return Err(TrainError::BadArguments(
                "expected at least one <winner> <event_file> pair".to_owned(),
            ));
        }

        // an odd count of remaining tokens means there's a trailing weights
        // file after an even number of (winner, event_file) pairs
        let (pair_tokens, weights_file) = if rest.len() % 2 == 1 {
            let (pairs, tail) = rest.split_at(rest.len() - 1);
            (pairs, Some(PathBuf::from(&tail[0])))
        } else {
            (rest.as_slice(), None)
        };

        if pair_tokens.is_empty() {
            return Err(TrainError::BadArguments(
                "expected at least one <winner> <event_file> pair".to_owned(),
            ));
        }

        let events = pair_tokens
            .chunks_exact(2)
            .map(|pair| EventSpec {
                winner: pair[0].clone(),
                path: PathBuf::from(&pair[1]),
            })
            .collect();

        Ok(Self {
            max_cycles,
            threads,
            events,
            weights_file,
        })
    }
}

/// Parses a required positional `u64` argument, naming it in the error on
/// failure.
fn parse_u64(token: Option<String>, name: &str) -> Result<u64, TrainError> {
    let token = token.ok_or_else(|| TrainError::BadArguments(format!("missing <{name}>")))?;
    token
        .parse()
        .map_err(|_| TrainError::BadArguments(format!("<{name}> must be a non-negative integer, got '{token}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> impl Iterator<Item = String> {
        s.split_whitespace().map(str::to_owned).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_a_single_event_pair() {
        let args = Args::parse(tokens("1000 4 alice games.bin")).unwrap();
        assert_eq!(args.max_cycles, 1000);
        assert_eq!(args.threads, 4);
        assert_eq!(args.events.len(), 1);
        assert_eq!(args.events[0].winner, "alice");
        assert_eq!(args.events[0].path, PathBuf::from("games.bin"));
        assert!(args.weights_file.is_none());
    }

    #[test]
    fn parses_multiple_events_and_a_trailing_weights_file() {
        let args = Args::parse(tokens("0 0 alice a.bin bob b.bin start.16w40")).unwrap();
        assert_eq!(args.events.len(), 2);
        assert_eq!(args.events[1].winner, "bob");
        assert_eq!(args.weights_file, Some(PathBuf::from("start.16w40")));
    }

    #[test]
    fn rejects_missing_event_pairs() {
        let err = Args::parse(tokens("0 0")).unwrap_err();
        assert!(matches!(err, TrainError::BadArguments(_)));
    }

    #[test]
    fn rejects_non_numeric_max_cycles() {
        let err = Args::parse(tokens("many 0 alice a.bin")).unwrap_err();
        assert!(matches!(err, TrainError::BadArguments(_)));
    }

    #[test]
    fn zero_max_cycles_and_threads_are_accepted_as_sentinels() {
        let args = Args::parse(tokens("0 0 alice a.bin")).unwrap();
        assert_eq!(args.max_cycles, 0);
        assert_eq!(args.threads, 0);
    }
}
