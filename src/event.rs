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

//! One training example: a batch of candidate [`Digraph`]s plus the index of
//! the designated winner among them.
//!
//! See [`Event::load`] and [`write_event_file`] for the on-disk layout.

use std::{
    fs,
    io::{self, Read, Write},
    path::Path,
    sync::Arc,
};

use crate::{
    digraph::{Digraph, Input},
    error::TrainError,
};

/// One training example.
pub struct Event {
    /// A human-readable name, used only for progress reporting. Since the
    /// on-disk format carries no event-level name, this is the event file's
    /// path (see DESIGN.md for this decision).
    name: String,
    /// The candidates, in file order, each paired with its display name.
    candidates: Vec<(String, Digraph)>,
    /// Index into `candidates` of the designated winner.
    winner: usize,
}

impl Event {
    /// Loads an event from a binary stream in the layout documented at the
    /// top of this module, designating `winner_name` as the candidate whose
    /// rank the trainer tries to minimize.
    ///
    /// `name` and `display_path` are used only for progress reporting and
    /// error messages respectively (see [`Event::name`]).
    ///
    /// Fails with [`TrainError::BadFormat`] if the header's counts violate
    /// the minimum shape constraints, [`TrainError::FileSize`] if the
    /// stream's length doesn't match what the header implies,
    /// [`TrainError::WinnerMissing`] if no candidate is named `winner_name`,
    /// or [`TrainError::WinnerAmbiguous`] if more than one is.
    ///
    /// Either the event comes back fully populated or an error is returned;
    /// there is no partially-populated state visible to the caller.
    pub fn load<R: Read>(
        mut reader: R,
        name: String,
        display_path: &str,
        winner_name: &str,
    ) -> Result<Self, TrainError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| TrainError::FileIo {
                path: display_path.to_string(),
                source,
            })?;
        let (candidates, winner) = decode_event_bytes(&bytes, display_path, winner_name)?;
        Ok(Self {
            name,
            candidates,
            winner,
        })
    }

    /// Loads an event from a file on disk. Thin wrapper around
    /// [`Event::load`] that turns a missing/unreadable file into
    /// [`TrainError::FileOpen`] before handing the open handle to
    /// [`Event::load`].
    pub fn load_file(path: &Path, winner_name: &str) -> Result<Self, TrainError> {
        let display_path = path.display().to_string();
        let file = fs::File::open(path).map_err(|source| TrainError::FileOpen {
            path: display_path.clone(),
            source,
        })?;
        Self::load(file, display_path.clone(), &display_path, winner_name)
    }

    /// The event's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many weights every digraph in this event needs. All digraphs in
    /// an event share the same shape, so this reads the first.
    pub fn required_weights_count(&self) -> usize {
        self.candidates[0].1.required_weights_count()
    }

    /// Binds every contained digraph to the given weight vector.
    pub fn bind_weights(&mut self, weights: &Arc<[i16]>) {
        for (_, digraph) in &mut self.candidates {
            digraph.bind_weights(Arc::clone(weights));
        }
    }

    /// Evaluates every contained digraph. Order is irrelevant: each digraph
    /// is independent.
    pub fn evaluate(&mut self) {
        for (_, digraph) in &mut self.candidates {
            digraph.evaluate();
        }
    }

    /// The 1-based rank of the designated winner: the count of candidates
    /// (including the winner itself) whose sink is greater than or equal to
    /// the winner's. Best possible is 1, worst is [`Event::candidate_count`].
    pub fn winner_rank(&self) -> u32 {
        let winner_sink = self.candidates[self.winner].1.sink();
        self.candidates
            .iter()
            .filter(|(_, digraph)| digraph.sink() >= winner_sink)
            .count() as u32
    }

    /// How many candidates this event has.
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// The candidate names and sinks, sorted by descending sink. Used only
    /// for the final report.
    pub fn ranked_candidates(&self) -> Vec<(&str, i64)> {
        let mut ranked: Vec<_> = self
            .candidates
            .iter()
            .map(|(name, digraph)| (name.as_str(), digraph.sink()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// The winner's display name.
    pub fn winner_name(&self) -> &str {
        &self.candidates[self.winner].0
    }
}

/// Decodes the candidate list and winner index out of a whole event file's
/// bytes, without touching the filesystem. Split out from [`Event::load`] so
/// the format can be unit tested against in-memory buffers.
fn decode_event_bytes(
    bytes: &[u8],
    display_path: &str,
    winner_name: &str,
) -> Result<(Vec<(String, Digraph)>, usize), TrainError> {
    const HEADER_SIZE: usize = 16;

    if bytes.len() < HEADER_SIZE {
        return Err(TrainError::BadFormat(format!(
            "'{display_path}' is shorter than the {HEADER_SIZE}-byte header"
        )));
    }

    let matrices_count = read_u32_le(&bytes[0..4]) as usize;
    let rows = read_u32_le(&bytes[4..8]) as usize;
    let cols = read_u32_le(&bytes[8..12]) as usize;
    let name_size = read_u32_le(&bytes[12..16]) as usize;

    if matrices_count < 1 || rows < 2 || cols < 2 || name_size < 1 {
        return Err(TrainError::BadFormat(format!(
            "'{display_path}' header violates minimum constraints: \
             matrices_count={matrices_count}, rows={rows}, cols={cols}, name_size={name_size}"
        )));
    }

    let entry_size = name_size + rows * cols * 2;
    let expected_len = HEADER_SIZE + matrices_count * entry_size;
    if bytes.len() != expected_len {
        return Err(TrainError::FileSize {
            path: display_path.to_string(),
            expected: expected_len as u64,
            actual: bytes.len() as u64,
        });
    }

    let mut candidates = Vec::with_capacity(matrices_count);
    let mut cursor = HEADER_SIZE;
    for _ in 0..matrices_count {
        let name_bytes = &bytes[cursor..cursor + name_size];
        let nul_pos = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_size);
        let name = String::from_utf8_lossy(&name_bytes[..nul_pos]).into_owned();
        cursor += name_size;

        let mut inputs = Vec::with_capacity(rows * cols);
        for _ in 0..rows * cols {
            inputs.push(read_u16_le(&bytes[cursor..cursor + 2]) as Input);
            cursor += 2;
        }

        candidates.push((name, Digraph::new(rows, cols, inputs)));
    }

    let matches: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, (name, _))| name == winner_name)
        .map(|(idx, _)| idx)
        .collect();

    match matches.as_slice() {
        [] => Err(TrainError::WinnerMissing {
            event: display_path.to_string(),
            winner: winner_name.to_string(),
        }),
        [only] => Ok((candidates, *only)),
        _ => Err(TrainError::WinnerAmbiguous {
            event: display_path.to_string(),
            winner: winner_name.to_string(),
        }),
    }
}

/// Writes an event file in the layout documented at the top of this module,
/// for use by tests that need to round-trip a synthetic corpus.
pub fn write_event_file<W: Write>(
    mut writer: W,
    rows: u32,
    cols: u32,
    name_size: u32,
    candidates: &[(&str, Vec<Input>)],
) -> io::Result<()> {
    writer.write_all(&(candidates.len() as u32).to_le_bytes())?;
    writer.write_all(&rows.to_le_bytes())?;
    writer.write_all(&cols.to_le_bytes())?;
    writer.write_all(&name_size.to_le_bytes())?;

    for (name, inputs) in candidates {
        let mut name_buf = vec![0u8; name_size as usize];
        let name_bytes = name.as_bytes();
        let copy_len = name_bytes.len().min(name_buf.len());
        name_buf[..copy_len].copy_from_slice(&name_bytes[..copy_len]);
        writer.write_all(&name_buf)?;

        for &input in inputs {
            writer.write_all(&input.to_le_bytes())?;
        }
    }

    Ok(())
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn read_u16_le(bytes: &[u8]) -> u16 {
    let mut buf = [0u8; 2];
    buf.copy_from_slice(bytes);
    u16::from_le_bytes(buf)
}

/// Reads an arbitrary reader fully into memory. Used by tests that build an
/// event file in a [`std::io::Cursor`] rather than on disk.
#[cfg(test)]
pub fn read_all<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn sample_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        write_event_file(
            &mut buf,
            2,
            2,
            8,
            &[
                ("alpha", vec![1, 2, 3, 4]),
                ("beta", vec![5, 6, 7, 8]),
            ],
        )
        .expect("writing to a Vec cannot fail");
        buf
    }

    #[test]
    fn round_trips_inputs_names_and_dimensions() {
        let bytes = sample_bytes();
        let (candidates, winner) = decode_event_bytes(&bytes, "test.bin", "beta").unwrap();
        assert_eq!(winner, 1);
        assert_eq!(candidates[0].0, "alpha");
        assert_eq!(candidates[1].0, "beta");
        assert_eq!(candidates[0].1.inputs(), &[1, 2, 3, 4]);
        assert_eq!(candidates[1].1.inputs(), &[5, 6, 7, 8]);
    }

    #[test]
    fn rejects_off_by_one_size() {
        let mut bytes = sample_bytes();
        bytes.pop();
        let err = decode_event_bytes(&bytes, "test.bin", "beta").unwrap_err();
        assert!(matches!(err, TrainError::FileSize { .. }));
    }

    #[test]
    fn rejects_too_few_rows() {
        let mut buf = Vec::new();
        write_event_file(&mut buf, 1, 2, 8, &[("alpha", vec![1, 2])]).unwrap();
        let err = decode_event_bytes(&buf, "test.bin", "alpha").unwrap_err();
        assert!(matches!(err, TrainError::BadFormat(_)));
    }

    #[test]
    fn missing_winner_is_an_error() {
        let bytes = sample_bytes();
        let err = decode_event_bytes(&bytes, "test.bin", "gamma").unwrap_err();
        assert!(matches!(err, TrainError::WinnerMissing { .. }));
    }

    #[test]
    fn duplicate_winner_name_is_ambiguous() {
        let mut buf = Vec::new();
        write_event_file(
            &mut buf,
            2,
            2,
            8,
            &[("dup", vec![1, 2, 3, 4]), ("dup", vec![5, 6, 7, 8])],
        )
        .unwrap();
        let err = decode_event_bytes(&buf, "test.bin", "dup").unwrap_err();
        assert!(matches!(err, TrainError::WinnerAmbiguous { .. }));
    }

    #[test]
    fn winner_rank_counts_ties_against_the_winner() {
        let mut buf = Vec::new();
        write_event_file(
            &mut buf,
            2,
            2,
            8,
            &[("a", vec![1, 1, 1, 1]), ("b", vec![1, 1, 1, 1])],
        )
        .unwrap();
        let (candidates, winner) = decode_event_bytes(&buf, "test.bin", "b").unwrap();
        let mut event = Event {
            name: "test".to_string(),
            candidates,
            winner,
        };
        let req = event.required_weights_count();
        let weights: Arc<[i16]> = vec![1i16; req].into();
        event.bind_weights(&weights);
        event.evaluate();
        // both candidates produce the same sink, so the tie counts against
        // the winner: rank 2, not 1.
        assert_eq!(event.winner_rank(), 2);
    }

    #[test]
    fn read_all_drains_a_cursor() {
        let bytes = sample_bytes();
        let cursor = Cursor::new(bytes.clone());
        assert_eq!(read_all(cursor).unwrap(), bytes);
    }
}
