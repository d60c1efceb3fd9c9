// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the semantic constraints serde cannot express: positive sizes,
//! parameter orderings, and provider/dimension agreement.

use crate::diagnostic::ConfigError;
use crate::model::{EmbeddingProvider, MnemosConfig};

/// Upper bound on any single retrieval, shared with the search tool.
pub const MAX_TOP_K: usize = 50;

/// Output width of the ONNX all-MiniLM-L6-v2 model.
pub const ONNX_DIMENSION: usize = 384;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure rather than stopping at the first.
pub fn validate_config(config: &MnemosConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        fail(format!(
            "agent.log_level `{}` must be one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.agent.model.trim().is_empty() {
        fail("agent.model must not be empty".to_string());
    }

    if let Some(root) = &config.store.root_dir
        && root.trim().is_empty()
    {
        fail("store.root_dir must not be empty when set".to_string());
    }

    if config.store.dimension == 0 {
        fail("store.dimension must be greater than 0".to_string());
    }

    if config.embedding.provider == EmbeddingProvider::Onnx
        && config.store.dimension != ONNX_DIMENSION
    {
        fail(format!(
            "store.dimension must be {ONNX_DIMENSION} for the onnx embedding provider, got {}",
            config.store.dimension
        ));
    }

    let index = &config.index;
    if index.clusters == 0 {
        fail("index.clusters must be at least 1".to_string());
    }
    if index.probes == 0 || index.probes > index.clusters {
        fail(format!(
            "index.probes must be between 1 and index.clusters ({}), got {}",
            index.clusters, index.probes
        ));
    }
    if index.training_size < index.clusters {
        fail(format!(
            "index.training_size ({}) must be at least index.clusters ({})",
            index.training_size, index.clusters
        ));
    }
    if index.neighbors < 2 {
        fail(format!(
            "index.neighbors must be at least 2, got {}",
            index.neighbors
        ));
    }
    if index.ef_construction < index.neighbors {
        fail(format!(
            "index.ef_construction ({}) must be at least index.neighbors ({})",
            index.ef_construction, index.neighbors
        ));
    }
    if index.ef_search == 0 {
        fail("index.ef_search must be at least 1".to_string());
    }

    if config.window.retain_pairs == 0 {
        fail("window.retain_pairs must be at least 1".to_string());
    }

    if config.retrieval.top_k == 0 || config.retrieval.top_k > MAX_TOP_K {
        fail(format!(
            "retrieval.top_k must be between 1 and {MAX_TOP_K}, got {}",
            config.retrieval.top_k
        ));
    }
    if config.retrieval.max_tool_rounds == 0 {
        fail("retrieval.max_tool_rounds must be at least 1".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
