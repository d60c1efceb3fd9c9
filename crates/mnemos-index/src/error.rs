// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use mnemos_core::MnemosError;
use thiserror::Error;

/// Failures raised by vector index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("clustered index has not been trained")]
    NotTrained,

    #[error("index serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Deserialized state that violates the index's own invariants.
    #[error("stored index is inconsistent: {0}")]
    Corrupt(String),

    /// Failure reported by the HNSW library.
    #[error("hnsw backend error: {0}")]
    Backend(String),
}

impl From<IndexError> for MnemosError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DimensionMismatch { .. } => MnemosError::Validation(err.to_string()),
            IndexError::NotTrained => MnemosError::Internal(err.to_string()),
            IndexError::Serialization(e) => MnemosError::storage(e),
            IndexError::Corrupt(_) => MnemosError::storage(err.to_string()),
            IndexError::Backend(_) => MnemosError::Internal(err.to_string()),
        }
    }
}
