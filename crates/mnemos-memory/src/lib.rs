// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user long-term memory for Mnemos.
//!
//! ## Architecture
//!
//! - **HashEmbedder**: deterministic feature-hashing embeddings (default)
//! - **OnnxEmbedder**: local all-MiniLM-L6-v2 inference (`onnx` feature)
//! - **ModelManager**: first-run model download from HuggingFace (`onnx` feature)
//! - **DocumentStore**: document CRUD over a vector index with rebuild-by-exclusion
//! - **UserDatabase**: a store bound to one user and its JSON snapshot
//! - **StoreFactory**: one database handle per user, lazily loaded

pub mod database;
pub mod embedder;
pub mod factory;
#[cfg(feature = "onnx")]
pub mod model_manager;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod snapshot;
pub mod store;
pub mod types;

pub use database::UserDatabase;
pub use embedder::{HashEmbedder, build_embedder};
pub use factory::{DatabaseHandle, StoreFactory, StoreSettings};
pub use store::DocumentStore;
pub use types::{DirectoryInfo, Document, FileInfo, Metadata, SearchResult, StoreStats};
