//! Reader side of a generated transition table
//!
//! A decoder looks up `prob(next, current)` while walking the drift
//! trellis. The file stores one row per current offset, so the value comes
//! from row `current`, column `next`.

use crate::{
    consts::DEFAULT_TABLE_DIR,
    error::{DriftError, Result},
    io::table_filename,
    matrix::TransitionMatrix,
    types::DriftParams,
};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct DriftTable {
    max_d: i32,
    size: usize,
    probs: Vec<f64>,
}

impl DriftTable {
    /// Load the table generated for `params` from `dir`
    pub fn load<P: AsRef<Path>>(dir: P, params: &DriftParams) -> Result<Self> {
        let path = dir.as_ref().join(table_filename(params));
        Self::open(path, params.max_d())
    }

    /// Load from the conventional `prob_table` directory
    pub fn load_default(params: &DriftParams) -> Result<Self> {
        Self::load(DEFAULT_TABLE_DIR, params)
    }

    pub fn open<P: AsRef<Path>>(path: P, max_d: i32) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), max_d, "reading transition table");
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), max_d)
    }

    pub fn from_reader<R: BufRead>(reader: R, max_d: i32) -> Result<Self> {
        if max_d < 0 {
            return Err(DriftError::InvalidParameter {
                name: "max_d",
                reason: format!("{max_d} is negative"),
            });
        }
        let size = 2 * max_d as usize + 1;
        let expected = size * size;
        let mut probs = Vec::with_capacity(expected);

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            for token in line.split_whitespace() {
                let p = token.parse::<f64>().map_err(|_| DriftError::Parse {
                    line: n + 1,
                    token: token.to_string(),
                })?;
                probs.push(p);
            }
        }

        if probs.len() != expected {
            return Err(DriftError::Shape {
                expected,
                found: probs.len(),
            });
        }

        Ok(Self { max_d, size, probs })
    }

    pub fn from_matrix(matrix: &TransitionMatrix) -> Self {
        Self {
            max_d: matrix.max_d(),
            size: matrix.size(),
            probs: matrix.as_slice().to_vec(),
        }
    }

    #[inline]
    pub fn max_d(&self) -> i32 {
        self.max_d
    }

    /// Probability of moving to offset `next` from offset `current`; zero
    /// when either offset lies outside the table.
    #[inline]
    pub fn prob(&self, next: i32, current: i32) -> f64 {
        let max_d = self.max_d.unsigned_abs();
        if next.unsigned_abs() > max_d || current.unsigned_abs() > max_d {
            return 0.0;
        }
        let i = (current + self.max_d) as usize;
        let j = (next + self.max_d) as usize;
        self.probs[i * self.size + j]
    }
}
