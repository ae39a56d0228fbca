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

//! `rank-trainer`: trains a fixed-length vector of small signed weights so
//! that, across a corpus of training events, a fixed-point forward pipeline
//! ranks each event's designated winner as highly as possible.
//!
//! The library is organised leaves-first, mirroring spec.md's dependency
//! order:
//!
//! - [`digraph`]: the fixed-arithmetic pipeline that reduces one input
//!   matrix to a scalar under a weight vector.
//! - [`event`]: a batch of digraphs plus a designated winner, and the
//!   on-disk event file codec.
//! - [`weights_file`]: the on-disk weights file codec.
//! - [`crafter`]: the stochastic weights search.
//! - [`pool`]: the fixed-size worker pool used for the per-cycle fan-out.
//! - [`trainer`]: the top-level loop tying the above together.
//! - [`cli`], [`progress`], [`signal`], [`error`]: the ambient command-line,
//!   reporting, cooperative-shutdown and error-taxonomy stack.

/// Command-line argument parsing.
pub mod cli;
/// The weights crafter: stochastic local search over the weight vector.
pub mod crafter;
/// The fixed-point pipeline that scores one candidate's input matrix.
pub mod digraph;
/// The error taxonomy surfaced at load time and program boundaries.
pub mod error;
/// One training example: a batch of digraphs plus a designated winner.
pub mod event;
/// A fixed-size, persistent worker pool for the per-cycle evaluation fan-out.
pub mod pool;
/// Progress reporting to stderr.
pub mod progress;
/// Randomness shared by the crafter.
pub mod rng;
/// Cooperative shutdown via a process-wide stop flag.
pub mod signal;
/// The top-level training loop.
pub mod trainer;
/// The weights file codec.
pub mod weights_file;
