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

//! Cooperative shutdown: a single process-wide flag that the training loop
//! polls between cycles, set by a `ctrlc` handler for `SIGINT`/`SIGTERM` and
//! by a raw `libc` handler for `SIGABRT` (which `ctrlc` does not register).
//!
//! A long training run can only be interrupted between cycles, not inside
//! one (a cycle must finish so `best` is never observed mid-update). Wiring
//! straight into the termination signals would abort mid-write-out, so
//! instead a single atomic flag is funneled into from every signal the
//! process cares about; [`Trainer`](crate::trainer::Trainer) polls it and
//! winds down cleanly once it sees it set.

use std::sync::atomic::{AtomicBool, Ordering};

/// Set to `true` once a shutdown signal has been received.
static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Raw `SIGABRT` handler. Only performs an atomic store, which is
/// async-signal-safe, so it's sound to run directly on the signal stack
/// instead of deferring to `ctrlc` (which doesn't hook this signal at all).
extern "C" fn handle_sigabrt(_signum: libc::c_int) {
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs handlers that set the stop flag on `SIGINT`, `SIGTERM` (via
/// `ctrlc`) and `SIGABRT` (via a raw `libc::signal` registration, since
/// `ctrlc` has no hook for it).
///
/// Safe to call at most once per process; `ctrlc` returns an error if a
/// handler is already installed, which is surfaced as-is since a second
/// attempt indicates a caller bug rather than a recoverable runtime error.
pub fn install_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        STOP_REQUESTED.store(true, Ordering::SeqCst);
    })?;

    // SAFETY: `handle_sigabrt` is async-signal-safe (an atomic store only),
    // and `libc::signal` has no further preconditions beyond a valid signal
    // number and handler pointer, both satisfied here.
    #[allow(clippy::fn_to_numeric_cast_any)]
    unsafe {
        libc::signal(libc::SIGABRT, handle_sigabrt as libc::sighandler_t);
    }

    Ok(())
}

/// Whether a shutdown has been requested since the process started.
pub fn stop_requested() -> bool {
    STOP_REQUESTED.load(Ordering::SeqCst)
}
