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

//! The weights file codec: `N` contiguous native-endian `i16` values, no
//! header.

use std::{
    fs,
    path::Path,
};

use crate::error::TrainError;

/// Reads a weights file and checks its length against `required_weights_count`.
///
/// Fails with [`TrainError::FileOpen`] if the file cannot be opened, or
/// [`TrainError::WeightsSizeMismatch`] if its length isn't exactly
/// `required_weights_count * 2` bytes.
pub fn read_weights_file(path: &Path, required_weights_count: usize) -> Result<Vec<i16>, TrainError> {
    let bytes = fs::read(path).map_err(|source| TrainError::FileOpen {
        path: path.display().to_string(),
        source,
    })?;
    decode_weights_bytes(&bytes, required_weights_count)
}

/// Decodes a byte buffer into a weight vector, without touching the
/// filesystem. Split out from [`read_weights_file`] so round-trips can be
/// tested in memory.
pub fn decode_weights_bytes(bytes: &[u8], required_weights_count: usize) -> Result<Vec<i16>, TrainError> {
    let expected = required_weights_count * 2;
    if bytes.len() != expected {
        return Err(TrainError::WeightsSizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_ne_bytes([chunk[0], chunk[1]]))
        .collect())
}

/// Writes a weight vector to `path` as `N` contiguous native-endian `i16`
/// values.
pub fn write_weights_file(path: &Path, weights: &[i16]) -> Result<(), TrainError> {
    let bytes: Vec<u8> = weights.iter().flat_map(|w| w.to_ne_bytes()).collect();
    fs::write(path, bytes).map_err(|source| TrainError::FileIo {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_element_wise() {
        let original: Vec<i16> = vec![0, 1, -1, i16::MIN, i16::MAX, 7];
        let bytes: Vec<u8> = original.iter().flat_map(|w| w.to_ne_bytes()).collect();
        let decoded = decode_weights_bytes(&bytes, original.len()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn rejects_wrong_length() {
        let bytes = vec![0u8; 10];
        let err = decode_weights_bytes(&bytes, 6).unwrap_err();
        assert!(matches!(err, TrainError::WeightsSizeMismatch { .. }));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("WEIGHTS_test.16w6");
        let original: Vec<i16> = vec![0, 1, -1, -32768, 32767, 7];
        write_weights_file(&path, &original).unwrap();
        let decoded = read_weights_file(&path, original.len()).unwrap();
        assert_eq!(decoded, original);
    }
}
