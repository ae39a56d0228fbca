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

use std::{
    fmt::{self, Display, Formatter},
    io,
};

/// An error that surfaces during argument parsing, file loading or decoding.
///
/// None of these are recoverable inside the training engine itself: they all
/// originate during load or at a program boundary and abort the run.
#[derive(Debug)]
pub enum TrainError {
    /// A command-line token was missing or malformed.
    BadArguments(String),
    /// A file could not be opened.
    FileOpen {
        /// The path that could not be opened.
        path: String,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// A file could not be fully read or written.
    FileIo {
        /// The path being read or written.
        path: String,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// A file's size did not match what its header (or the training corpus)
    /// implies.
    FileSize {
        /// The path with the unexpected size.
        path: String,
        /// The size the file was expected to have.
        expected: u64,
        /// The size the file actually has.
        actual: u64,
    },
    /// An event file's header violated the minimum shape constraints.
    BadFormat(String),
    /// The designated winner name did not match any candidate in an event.
    WinnerMissing {
        /// The event's name.
        event: String,
        /// The winner name that could not be found.
        winner: String,
    },
    /// The designated winner name matched more than one candidate in an
    /// event.
    WinnerAmbiguous {
        /// The event's name.
        event: String,
        /// The winner name that matched more than one candidate.
        winner: String,
    },
    /// Two events required a different `weights_count`.
    IncompatibleEvents {
        /// The `weights_count` implied by the first event loaded.
        first: usize,
        /// The `weights_count` implied by a later event.
        other: usize,
    },
    /// A weights file's length did not match `required_weights_count * 2`.
    WeightsSizeMismatch {
        /// The expected length in bytes.
        expected: usize,
        /// The actual length in bytes.
        actual: usize,
    },
}

impl Display for TrainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadArguments(msg) => write!(f, "bad arguments: {msg}"),
            Self::FileOpen { path, source } => write!(f, "could not open '{path}': {source}"),
            Self::FileIo { path, source } => write!(f, "I/O error on '{path}': {source}"),
            Self::FileSize {
                path,
                expected,
                actual,
            } => write!(
                f,
                "'{path}' has size {actual} bytes, expected {expected} bytes"
            ),
            Self::BadFormat(msg) => write!(f, "bad event file format: {msg}"),
            Self::WinnerMissing { event, winner } => {
                write!(
                    f,
                    "winner '{winner}' not found among candidates of event '{event}'"
                )
            }
            Self::WinnerAmbiguous { event, winner } => write!(
                f,
                "winner '{winner}' matches more than one candidate of event '{event}'"
            ),
            Self::IncompatibleEvents { first, other } => write!(
                f,
                "event requires {other} weights, but an earlier event required {first}"
            ),
            Self::WeightsSizeMismatch { expected, actual } => write!(
                f,
                "weights file has {actual} bytes, expected {expected} bytes"
            ),
        }
    }
}

impl std::error::Error for TrainError {}
