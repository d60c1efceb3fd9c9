// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Mnemos.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use mnemos_core::IndexVariant;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Mnemos configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemosConfig {
    /// Agent identity and prompt settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Per-user snapshot storage settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Vector index tuning parameters.
    #[serde(default)]
    pub index: IndexConfig,

    /// Embedding provider settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Working-memory window settings.
    #[serde(default)]
    pub window: WindowConfig,

    /// Retrieval and tool loop settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt. Falls back to a built-in memory-assistant prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Model identifier forwarded to the assistant provider.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            model: default_model(),
        }
    }
}

fn default_agent_name() -> String {
    "mnemos".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Per-user snapshot storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Root directory holding one subdirectory per user.
    /// Defaults to `<data_dir>/mnemos/users`.
    #[serde(default)]
    pub root_dir: Option<String>,

    /// Index variant used for users without an existing snapshot.
    #[serde(default)]
    pub index: IndexVariant,

    /// Embedding dimension. Must match the embedding provider.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

impl StoreConfig {
    /// Resolves the snapshot root, falling back to the platform data directory.
    pub fn resolved_root(&self) -> PathBuf {
        match &self.root_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|d| d.join("mnemos").join("users"))
                .unwrap_or_else(|| PathBuf::from("user_memory")),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            index: IndexVariant::default(),
            dimension: default_dimension(),
        }
    }
}

fn default_dimension() -> usize {
    384
}

/// Vector index tuning.
///
/// `training_size`, `clusters`, and `probes` only apply to the clustered
/// variant; `neighbors`, `ef_construction`, and `ef_search` to the graph variant.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Corpus size at which a clustered index is first trained.
    #[serde(default = "default_training_size")]
    pub training_size: usize,

    /// Number of clusters fitted during training.
    #[serde(default = "default_clusters")]
    pub clusters: usize,

    /// Number of nearest clusters scanned per query.
    #[serde(default = "default_probes")]
    pub probes: usize,

    /// HNSW connectivity: links kept per graph node.
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,

    /// Candidate list size while inserting into the graph.
    #[serde(default = "default_ef_construction")]
    pub ef_construction: usize,

    /// Candidate list size while searching the graph.
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            training_size: default_training_size(),
            clusters: default_clusters(),
            probes: default_probes(),
            neighbors: default_neighbors(),
            ef_construction: default_ef_construction(),
            ef_search: default_ef_search(),
        }
    }
}

fn default_training_size() -> usize {
    100
}

fn default_clusters() -> usize {
    10
}

fn default_probes() -> usize {
    3
}

fn default_neighbors() -> usize {
    32
}

fn default_ef_construction() -> usize {
    128
}

fn default_ef_search() -> usize {
    64
}

/// Which embedding adapter produces document vectors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Deterministic feature hashing. No model files required.
    #[default]
    Hash,
    /// all-MiniLM-L6-v2 through ONNX Runtime (requires the `onnx` feature).
    Onnx,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    /// Name of the ONNX embedding model.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Directory for downloaded model files. Defaults to `<data_dir>/mnemos/models`.
    #[serde(default)]
    pub model_dir: Option<String>,
}

impl EmbeddingConfig {
    pub fn resolved_model_dir(&self) -> PathBuf {
        match &self.model_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|d| d.join("mnemos").join("models"))
                .unwrap_or_else(|| PathBuf::from("models")),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model_name: default_model_name(),
            model_dir: None,
        }
    }
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

/// Working-memory window configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    /// Pairs kept after trimming (N). Eviction triggers at 2N pairs.
    #[serde(default = "default_retain_pairs")]
    pub retain_pairs: usize,

    /// When false, evicted turns are dropped without consolidation.
    #[serde(default = "default_consolidation_enabled")]
    pub consolidation_enabled: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            retain_pairs: default_retain_pairs(),
            consolidation_enabled: default_consolidation_enabled(),
        }
    }
}

fn default_retain_pairs() -> usize {
    3
}

fn default_consolidation_enabled() -> bool {
    true
}

/// Retrieval and tool loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Documents retrieved as grounding context before each reply.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Upper bound on assistant calls that may issue further tool calls per reply.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

fn default_max_tool_rounds() -> usize {
    4
}
