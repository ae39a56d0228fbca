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

//! `rank-trainer`: a command-line front end over the training engine in
//! [`rank_trainer`].
//!
//! ```text
//! rank-trainer <max_cycles> <thread_count_or_0> (<winner_name> <event_file>)+ [<weights_file>]
//! ```
//!
//! - `max_cycles = 0` runs until the aggregate rank reaches its optimum or a
//!   stop is requested.
//! - `thread_count_or_0 = 0` derives a thread count from the available
//!   parallelism.
//! - Every `<winner_name> <event_file>` pair names the candidate expected to
//!   rank first in that event file.
//! - An optional trailing `<weights_file>` seeds the search instead of
//!   starting from randomly initialized weights.
//!
//! `SIGINT`, `SIGTERM` and a user-driven `SIGABRT` all request a graceful
//! stop, observed between cycles (never interrupting an in-flight batch).

use std::{env, process::ExitCode, time::SystemTime};

use rank_trainer::{
    cli::Args,
    crafter::Crafter,
    error::TrainError,
    event::Event,
    progress,
    signal,
    trainer::Trainer,
    weights_file,
};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match run(args.into_iter()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Parses arguments, loads the corpus and any starting weights, runs the
/// trainer to completion, and writes the resulting weights file.
fn run<I: Iterator<Item = String>>(argv: I) -> Result<(), TrainError> {
    let args = Args::parse(argv)?;

    if signal::install_handler().is_err() {
        eprintln!("warning: could not install a stop-signal handler; Ctrl-C will terminate immediately");
    }

    let mut events = Vec::with_capacity(args.events.len());
    let mut required_weights_count = None;
    for spec in &args.events {
        let event = Event::load_file(&spec.path, &spec.winner)?;
        let this_count = event.required_weights_count();
        match required_weights_count {
            None => required_weights_count = Some(this_count),
            Some(first) if first != this_count => {
                return Err(TrainError::IncompatibleEvents {
                    first,
                    other: this_count,
                })
            }
            Some(_) => {}
        }
        events.push(event);
    }
    let weights_count = required_weights_count.expect("Args::parse guarantees at least one event");

    let crafter = match &args.weights_file {
        Some(path) => {
            let weights = weights_file::read_weights_file(path, weights_count)?;
            Crafter::with_starting_point(weights_count, weights)
        }
        None => Crafter::new(weights_count),
    };

    let trainer = Trainer::new(events, crafter, args.threads, args.max_cycles);
    let result = trainer.run();

    let timestamp = format_timestamp(SystemTime::now());
    let out_path = env::current_dir()
        .unwrap_or_default()
        .join(format!("WEIGHTS_{timestamp}.16w{weights_count}"));
    weights_file::write_weights_file(&out_path, &result.weights)?;
    progress::report_weights_written(&out_path.display().to_string());

    eprintln!(
        "finished after {} cycle(s): final rank total {}",
        result.cycles, result.final_ranks_total
    );

    Ok(())
}

/// Formats a [`SystemTime`] as `YYYY-MM-DD_HH-MM-SS` in UTC, for the weights
/// file name. Hand-rolled rather than pulling in a datetime crate, since
/// this is the only place the program needs calendar arithmetic.
fn format_timestamp(time: SystemTime) -> String {
    let secs = time
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());

    let (days, time_of_day) = (secs / 86400, secs % 86400);
    let (hour, minute, second) = (time_of_day / 3600, (time_of_day / 60) % 60, time_of_day % 60);

    let (year, month, day) = civil_from_days(days as i64);

    format!("{year:04}-{month:02}-{day:02}_{hour:02}-{minute:02}-{second:02}")
}

/// Converts a day count since the Unix epoch to a `(year, month, day)`
/// civil date, using Howard Hinnant's `civil_from_days` algorithm (proleptic
/// Gregorian, valid for the entire range a `u64` seconds count can express).
#[allow(clippy::many_single_char_names)]
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civil_from_days_epoch_is_1970_01_01() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
    }

    #[test]
    fn civil_from_days_matches_a_known_date() {
        // 2024-01-01 is 19723 days after the epoch
        assert_eq!(civil_from_days(19723), (2024, 1, 1));
    }
}
