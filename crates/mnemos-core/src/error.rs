// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Mnemos.

use thiserror::Error;

/// The primary error type used across all Mnemos adapter traits and store operations.
///
/// A missing document is never an error: mutating calls report it as `false`.
#[derive(Debug, Error)]
pub enum MnemosError {
    /// Caller input rejected before any state was touched (bad user id,
    /// unknown index variant, malformed tool arguments, dimension mismatch).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Snapshot persistence errors (unwritable root, unreadable or malformed file).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Embedding provider errors (model load, tokenization, inference).
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Assistant provider errors (API failure, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MnemosError {
    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Storage { source: err.into() }
    }

    /// Builds a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }
}

impl From<std::io::Error> for MnemosError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err)
    }
}
