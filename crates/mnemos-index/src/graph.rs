// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HNSW proximity graph backed by `usearch`.
//!
//! Row `i` is stored under key `i` with an inner-product metric, so scores
//! match the other variants for unit-norm vectors. The native index is only
//! created on the first insertion; an empty graph holds nothing.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use mnemos_core::IndexVariant;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use usearch::{IndexOptions, MetricKind, ScalarKind};

use crate::error::IndexError;
use crate::math::rank_top_k;
use crate::{Hit, IndexParams, VectorIndex};

pub struct GraphIndex {
    dimension: usize,
    neighbors: usize,
    ef_construction: usize,
    ef_search: usize,
    len: usize,
    hnsw: Option<usearch::Index>,
}

/// Serialized form: tuning, row count, and the usearch buffer in base64.
#[derive(Serialize, Deserialize)]
struct StoredGraph {
    dimension: usize,
    neighbors: usize,
    ef_construction: usize,
    ef_search: usize,
    len: usize,
    /// Empty when the graph holds no rows.
    hnsw: String,
}

fn backend(err: impl fmt::Display) -> IndexError {
    IndexError::Backend(err.to_string())
}

impl GraphIndex {
    pub fn new(dimension: usize, params: &IndexParams) -> Self {
        Self {
            dimension,
            neighbors: params.neighbors.max(2),
            ef_construction: params.ef_construction.max(1),
            ef_search: params.ef_search.max(1),
            len: 0,
            hnsw: None,
        }
    }

    /// An empty graph with the same dimension and tuning.
    pub fn emptied(&self) -> Self {
        Self {
            len: 0,
            hnsw: None,
            ..*self
        }
    }

    fn options(&self) -> IndexOptions {
        IndexOptions {
            dimensions: self.dimension,
            metric: MetricKind::IP,
            quantization: ScalarKind::F32,
            connectivity: self.neighbors,
            expansion_add: self.ef_construction,
            expansion_search: self.ef_search,
            multi: false,
        }
    }

    fn open_backend(&self) -> Result<usearch::Index, IndexError> {
        usearch::Index::new(&self.options()).map_err(backend)
    }

    fn check(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            })
        }
    }

    /// Checks that the stored graph holds exactly rows `0..len` at the
    /// recorded dimension.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.dimension == 0 {
            return Err(IndexError::Corrupt("vector dimension is 0".to_string()));
        }
        let Some(hnsw) = &self.hnsw else {
            if self.len == 0 {
                return Ok(());
            }
            return Err(IndexError::Corrupt(format!(
                "{} rows recorded but no graph stored",
                self.len
            )));
        };

        if hnsw.dimensions() != self.dimension {
            return Err(IndexError::Corrupt(format!(
                "graph has {} dimensions, index records {}",
                hnsw.dimensions(),
                self.dimension
            )));
        }
        if hnsw.size() != self.len {
            return Err(IndexError::Corrupt(format!(
                "graph holds {} vectors, index records {} rows",
                hnsw.size(),
                self.len
            )));
        }
        if let Some(row) = (0..self.len).find(|&row| !hnsw.contains(row as u64)) {
            return Err(IndexError::Corrupt(format!("row {row} is missing from the graph")));
        }
        Ok(())
    }
}

impl fmt::Debug for GraphIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphIndex")
            .field("dimension", &self.dimension)
            .field("neighbors", &self.neighbors)
            .field("ef_construction", &self.ef_construction)
            .field("ef_search", &self.ef_search)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl VectorIndex for GraphIndex {
    fn variant(&self) -> IndexVariant {
        IndexVariant::Graph
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_indexed(&self) -> bool {
        true
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        for v in vectors {
            self.check(v)?;
        }
        if vectors.is_empty() {
            return Ok(());
        }

        if self.hnsw.is_none() {
            self.hnsw = Some(self.open_backend()?);
        }
        let Some(hnsw) = self.hnsw.as_ref() else {
            return Err(IndexError::Backend("graph was not created".to_string()));
        };

        hnsw.reserve(self.len + vectors.len()).map_err(backend)?;
        let first = self.len as u64;
        for (offset, v) in vectors.iter().enumerate() {
            let key = first + offset as u64;
            if let Err(e) = hnsw.add(key, v.as_slice()) {
                for added in first..key {
                    let _ = hnsw.remove(added);
                }
                return Err(backend(e));
            }
        }
        self.len += vectors.len();
        Ok(())
    }

    fn rebuild_from(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        for v in vectors {
            self.check(v)?;
        }
        self.hnsw = None;
        self.len = 0;
        self.add(vectors)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, IndexError> {
        self.check(query)?;
        let Some(hnsw) = &self.hnsw else {
            return Ok(Vec::new());
        };
        if k == 0 || self.len == 0 {
            return Ok(Vec::new());
        }

        // Inner-product distance is `1 - dot`.
        let matches = hnsw.search(query, k.min(self.len)).map_err(backend)?;
        Ok(rank_top_k(
            matches
                .keys
                .iter()
                .zip(&matches.distances)
                .map(|(&key, &distance)| (key as usize, 1.0 - distance)),
            k,
        ))
    }
}

impl Serialize for GraphIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let hnsw = match &self.hnsw {
            Some(hnsw) if self.len > 0 => {
                let mut buffer = vec![0u8; hnsw.serialized_length()];
                hnsw.save_to_buffer(&mut buffer).map_err(S::Error::custom)?;
                STANDARD.encode(buffer)
            }
            _ => String::new(),
        };
        StoredGraph {
            dimension: self.dimension,
            neighbors: self.neighbors,
            ef_construction: self.ef_construction,
            ef_search: self.ef_search,
            len: self.len,
            hnsw,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GraphIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = StoredGraph::deserialize(deserializer)?;
        let mut index = Self {
            dimension: stored.dimension,
            neighbors: stored.neighbors,
            ef_construction: stored.ef_construction,
            ef_search: stored.ef_search,
            len: stored.len,
            hnsw: None,
        };
        if !stored.hnsw.is_empty() {
            let buffer = STANDARD.decode(&stored.hnsw).map_err(D::Error::custom)?;
            let hnsw = index.open_backend().map_err(D::Error::custom)?;
            hnsw.load_from_buffer(&buffer).map_err(D::Error::custom)?;
            index.hnsw = Some(hnsw);
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::ExactIndex;

    fn unit(angle: f32) -> Vec<f32> {
        vec![angle.cos(), angle.sin()]
    }

    fn rows(hits: &[Hit]) -> Vec<usize> {
        hits.iter().map(|h| h.row).collect()
    }

    #[test]
    fn empty_graph_returns_nothing() {
        let index = GraphIndex::new(2, &IndexParams::default());
        assert!(index.search(&[1.0, 0.0], 3).unwrap().is_empty());
        index.validate().unwrap();
    }

    #[test]
    fn small_graph_matches_exact_ranking() {
        let corpus: Vec<Vec<f32>> = (0..20).map(|i| unit(i as f32 * 0.3)).collect();
        let mut graph = GraphIndex::new(2, &IndexParams::default());
        let mut exact = ExactIndex::new(2);
        graph.add(&corpus).unwrap();
        exact.add(&corpus).unwrap();

        for q in [unit(0.05), unit(1.7), unit(4.4)] {
            let g = graph.search(&q, 5).unwrap();
            let e = exact.search(&q, 5).unwrap();
            assert_eq!(rows(&g), rows(&e));
            assert!((g[0].score - e[0].score).abs() < 1e-4);
        }
    }

    #[test]
    fn appends_continue_row_numbering() {
        let mut index = GraphIndex::new(2, &IndexParams::default());
        index.add(&[unit(0.0), unit(1.0)]).unwrap();
        index.add(&[unit(2.0)]).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.search(&unit(2.0), 1).unwrap()[0].row, 2);
        index.validate().unwrap();
    }

    #[test]
    fn wrong_dimension_adds_nothing() {
        let mut index = GraphIndex::new(2, &IndexParams::default());
        let err = index.add(&[unit(0.0), vec![1.0, 0.0, 0.0]]).unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { expected: 2, actual: 3 }));
        assert!(index.is_empty());
    }

    #[test]
    fn rebuild_recreates_graph() {
        let mut index = GraphIndex::new(2, &IndexParams::default());
        index.add(&[unit(0.0), unit(1.0), unit(2.0)]).unwrap();
        index.rebuild_from(&[unit(2.0)]).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(rows(&index.search(&unit(2.0), 3).unwrap()), vec![0]);
    }

    #[test]
    fn serialized_graph_answers_like_the_original() {
        let corpus: Vec<Vec<f32>> = (0..30).map(|i| unit(i as f32 * 0.2)).collect();
        let mut index = GraphIndex::new(2, &IndexParams::default());
        index.add(&corpus).unwrap();

        let json = serde_json::to_vec(&index).unwrap();
        let restored: GraphIndex = serde_json::from_slice(&json).unwrap();
        restored.validate().unwrap();
        assert_eq!(restored.len(), 30);
        assert_eq!(
            rows(&restored.search(&unit(0.9), 4).unwrap()),
            rows(&index.search(&unit(0.9), 4).unwrap())
        );
    }

    #[test]
    fn recorded_row_count_must_match_graph() {
        let mut index = GraphIndex::new(2, &IndexParams::default());
        index.add(&[unit(0.0), unit(1.0)]).unwrap();

        let mut stored = serde_json::to_value(&index).unwrap();
        stored["len"] = serde_json::json!(5);
        let tampered: GraphIndex = serde_json::from_value(stored).unwrap();
        assert!(matches!(tampered.validate(), Err(IndexError::Corrupt(_))));
    }

    #[test]
    fn rows_without_a_graph_are_corrupt() {
        let stored = serde_json::json!({
            "dimension": 2,
            "neighbors": 32,
            "ef_construction": 128,
            "ef_search": 64,
            "len": 1,
            "hnsw": "",
        });
        let index: GraphIndex = serde_json::from_value(stored).unwrap();
        assert!(matches!(index.validate(), Err(IndexError::Corrupt(_))));
    }
}
