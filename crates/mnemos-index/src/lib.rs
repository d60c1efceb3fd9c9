// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector indexes for Mnemos document stores.
//!
//! Three interchangeable strategies share one capability set:
//!
//! - **Exact**: linear scan, always searchable, always exact
//! - **Clustered**: inverted-file clusters; UNTRAINED until the corpus it is
//!   rebuilt from reaches the training size
//! - **Graph**: HNSW graph (`usearch`), approximate, searchable once built
//!
//! Indexes are append-only. Removal and replacement are expressed by the
//! owner rebuilding the whole index from the surviving vectors, so row `i`
//! always corresponds to the `i`-th vector handed to the index.

pub mod clustered;
pub mod error;
pub mod exact;
pub mod graph;
pub mod math;
mod rows;

use mnemos_core::IndexVariant;
use serde::{Deserialize, Serialize};

pub use clustered::ClusteredIndex;
pub use error::IndexError;
pub use exact::ExactIndex;
pub use graph::GraphIndex;
pub use math::{dot, l2_normalize, rank_top_k};

/// A search result: the row of the matching vector and its inner-product score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub row: usize,
    pub score: f32,
}

/// Tuning shared by index construction. Each variant reads only its own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexParams {
    pub training_size: usize,
    pub clusters: usize,
    pub probes: usize,
    pub neighbors: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            training_size: 100,
            clusters: 10,
            probes: 3,
            neighbors: 32,
            ef_construction: 128,
            ef_search: 64,
        }
    }
}

/// Capability set every index variant provides.
pub trait VectorIndex {
    fn variant(&self) -> IndexVariant;

    fn dimension(&self) -> usize;

    /// Number of vectors currently indexed.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `add` and `search` are available. Only an untrained clustered
    /// index reports `false`.
    fn is_indexed(&self) -> bool;

    /// Corpus size at which an unindexed index becomes indexable through
    /// [`VectorIndex::rebuild_from`]. `None` for variants that are always indexed.
    fn training_size(&self) -> Option<usize> {
        None
    }

    /// Appends vectors. Either all vectors are added or none are.
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError>;

    /// Discards all contents and rebuilds from `vectors`, training first where
    /// the variant requires it and the corpus is large enough.
    fn rebuild_from(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError>;

    /// Returns up to `k` hits, best first, ties broken by ascending row.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, IndexError>;
}

/// Tagged union over the three variants. This is the serialized form kept
/// inside a user snapshot.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum Index {
    Exact(ExactIndex),
    Clustered(ClusteredIndex),
    Graph(GraphIndex),
}

impl Index {
    pub fn new(variant: IndexVariant, dimension: usize, params: &IndexParams) -> Self {
        match variant {
            IndexVariant::Exact => Index::Exact(ExactIndex::new(dimension)),
            IndexVariant::Clustered => Index::Clustered(ClusteredIndex::new(dimension, params)),
            IndexVariant::Graph => Index::Graph(GraphIndex::new(dimension, params)),
        }
    }

    /// `false` only for a clustered index that has not been trained yet.
    pub fn is_trained(&self) -> bool {
        match self {
            Index::Clustered(index) => index.is_trained(),
            _ => true,
        }
    }

    /// An empty index of the same variant, dimension, and tuning.
    pub fn emptied(&self) -> Self {
        match self {
            Index::Exact(index) => Index::Exact(ExactIndex::new(index.dimension())),
            Index::Clustered(index) => Index::Clustered(index.emptied()),
            Index::Graph(index) => Index::Graph(index.emptied()),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, IndexError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes and validates an index. Any inconsistency between the
    /// stored rows and the structures that address them is
    /// [`IndexError::Corrupt`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IndexError> {
        let index: Self = serde_json::from_slice(bytes)?;
        index.validate()?;
        Ok(index)
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        match self {
            Index::Exact(index) => index.validate(),
            Index::Clustered(index) => index.validate(),
            Index::Graph(index) => index.validate(),
        }
    }

    fn inner(&self) -> &dyn VectorIndex {
        match self {
            Index::Exact(index) => index,
            Index::Clustered(index) => index,
            Index::Graph(index) => index,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn VectorIndex {
        match self {
            Index::Exact(index) => index,
            Index::Clustered(index) => index,
            Index::Graph(index) => index,
        }
    }
}

impl VectorIndex for Index {
    fn variant(&self) -> IndexVariant {
        self.inner().variant()
    }

    fn dimension(&self) -> usize {
        self.inner().dimension()
    }

    fn len(&self) -> usize {
        self.inner().len()
    }

    fn is_indexed(&self) -> bool {
        self.inner().is_indexed()
    }

    fn training_size(&self) -> Option<usize> {
        self.inner().training_size()
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        self.inner_mut().add(vectors)
    }

    fn rebuild_from(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        self.inner_mut().rebuild_from(vectors)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, IndexError> {
        self.inner().search(query, k)
    }
}
