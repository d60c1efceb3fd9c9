// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// Row-major storage for fixed-width vectors. Row `i` is the `i`-th vector added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Rows {
    dimension: usize,
    data: Vec<f32>,
}

impl Rows {
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub(crate) fn dimension(&self) -> usize {
        self.dimension
    }

    pub(crate) fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub(crate) fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dimension..(i + 1) * self.dimension]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.max(1))
    }

    pub(crate) fn check(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            })
        }
    }

    /// Appends a vector and returns its row number.
    pub(crate) fn push(&mut self, vector: &[f32]) -> Result<usize, IndexError> {
        self.check(vector)?;
        let row = self.len();
        self.data.extend_from_slice(vector);
        Ok(row)
    }

    pub(crate) fn clear(&mut self) {
        self.data.clear();
    }

    /// Rejects storage that [`Rows::row`] could not slice safely.
    pub(crate) fn validate(&self) -> Result<(), IndexError> {
        if self.dimension == 0 {
            return Err(IndexError::Corrupt("vector dimension is 0".to_string()));
        }
        if self.data.len() % self.dimension != 0 {
            return Err(IndexError::Corrupt(format!(
                "{} values do not divide into rows of {}",
                self.data.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}
