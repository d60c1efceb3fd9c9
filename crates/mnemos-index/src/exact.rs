// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Linear-scan index. Always searchable and always exact.

use mnemos_core::IndexVariant;
use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::math::{dot, rank_top_k};
use crate::rows::Rows;
use crate::{Hit, VectorIndex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExactIndex {
    rows: Rows,
}

impl ExactIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            rows: Rows::new(dimension),
        }
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        self.rows.validate()
    }
}

impl VectorIndex for ExactIndex {
    fn variant(&self) -> IndexVariant {
        IndexVariant::Exact
    }

    fn dimension(&self) -> usize {
        self.rows.dimension()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn is_indexed(&self) -> bool {
        true
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        for v in vectors {
            self.rows.check(v)?;
        }
        for v in vectors {
            self.rows.push(v)?;
        }
        Ok(())
    }

    fn rebuild_from(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        self.rows.clear();
        self.add(vectors)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, IndexError> {
        self.rows.check(query)?;
        Ok(rank_top_k(
            self.rows.iter().enumerate().map(|(i, v)| (i, dot(v, query))),
            k,
        ))
    }
}
