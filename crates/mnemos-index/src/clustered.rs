// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inverted-file index over spherical k-means clusters.
//!
//! The index starts UNTRAINED and holds no vectors. Once the corpus it is
//! rebuilt from reaches `training_size`, centroids are fitted on that corpus
//! and every vector is assigned to its nearest centroid. Queries scan the
//! `probes` nearest clusters only.

use mnemos_core::IndexVariant;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::IndexError;
use crate::math::{dot, l2_normalize, rank_top_k};
use crate::rows::Rows;
use crate::{Hit, IndexParams, VectorIndex};

/// Fixed number of Lloyd iterations per training run.
const KMEANS_ITERATIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredIndex {
    training_size: usize,
    clusters: usize,
    probes: usize,
    trained: bool,
    centroids: Vec<Vec<f32>>,
    /// Row numbers assigned to each centroid, in insertion order.
    lists: Vec<Vec<usize>>,
    rows: Rows,
}

impl ClusteredIndex {
    pub fn new(dimension: usize, params: &IndexParams) -> Self {
        Self {
            training_size: params.training_size,
            clusters: params.clusters.max(1),
            probes: params.probes.max(1),
            trained: false,
            centroids: Vec::new(),
            lists: Vec::new(),
            rows: Rows::new(dimension),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// An UNTRAINED, empty index with the same dimension and tuning.
    pub fn emptied(&self) -> Self {
        Self {
            training_size: self.training_size,
            clusters: self.clusters,
            probes: self.probes,
            trained: false,
            centroids: Vec::new(),
            lists: Vec::new(),
            rows: Rows::new(self.rows.dimension()),
        }
    }

    /// Checks that the training state, centroids, and inverted lists agree
    /// with the stored rows.
    pub fn validate(&self) -> Result<(), IndexError> {
        self.rows.validate()?;
        if self.clusters == 0 || self.probes == 0 {
            return Err(IndexError::Corrupt(format!(
                "clusters ({}) and probes ({}) must be at least 1",
                self.clusters, self.probes
            )));
        }

        if !self.trained {
            if !self.centroids.is_empty() || !self.lists.is_empty() || self.rows.len() != 0 {
                return Err(IndexError::Corrupt(
                    "untrained clustered index holds centroids or vectors".to_string(),
                ));
            }
            return Ok(());
        }

        let k = self.centroids.len();
        if k == 0 || k > self.clusters || self.lists.len() != k {
            return Err(IndexError::Corrupt(format!(
                "{k} centroids and {} lists for at most {} clusters",
                self.lists.len(),
                self.clusters
            )));
        }
        if let Some(centroid) = self
            .centroids
            .iter()
            .find(|c| c.len() != self.rows.dimension())
        {
            return Err(IndexError::Corrupt(format!(
                "centroid has {} dimensions, rows have {}",
                centroid.len(),
                self.rows.dimension()
            )));
        }

        let mut seen = vec![false; self.rows.len()];
        for &row in self.lists.iter().flatten() {
            match seen.get_mut(row) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => return Err(IndexError::Corrupt(format!("row {row} is listed twice"))),
                None => {
                    return Err(IndexError::Corrupt(format!(
                        "listed row {row} is out of range for {} rows",
                        seen.len()
                    )));
                }
            }
        }
        if let Some(row) = seen.iter().position(|s| !s) {
            return Err(IndexError::Corrupt(format!(
                "row {row} is not assigned to any cluster"
            )));
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.trained = false;
        self.centroids.clear();
        self.lists.clear();
        self.rows.clear();
    }

    /// Fits centroids on `vectors`. Initial centroids are evenly spaced rows,
    /// so training is deterministic for a given corpus order.
    fn train(&mut self, vectors: &[Vec<f32>]) {
        let n = vectors.len();
        let k = self.clusters.min(n).max(1);
        let mut centroids: Vec<Vec<f32>> = (0..k).map(|c| vectors[c * n / k].clone()).collect();

        for _ in 0..KMEANS_ITERATIONS {
            let dim = self.rows.dimension();
            let mut sums = vec![vec![0.0f32; dim]; k];
            let mut counts = vec![0usize; k];
            for v in vectors {
                let c = nearest(&centroids, v);
                counts[c] += 1;
                for (s, x) in sums[c].iter_mut().zip(v) {
                    *s += x;
                }
            }

            let mut moved = false;
            for (c, sum) in sums.iter().enumerate() {
                // An empty cluster keeps its previous centroid.
                if counts[c] == 0 {
                    continue;
                }
                let next = l2_normalize(sum);
                if next != centroids[c] {
                    centroids[c] = next;
                    moved = true;
                }
            }
            if !moved {
                break;
            }
        }

        self.lists = vec![Vec::new(); k];
        self.centroids = centroids;
        self.trained = true;
        debug!(vectors = n, clusters = k, "clustered index trained");
    }
}

/// Index of the centroid with the highest inner product, lowest index on ties.
fn nearest(centroids: &[Vec<f32>], vector: &[f32]) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let score = dot(centroid, vector);
        if score > best_score {
            best = c;
            best_score = score;
        }
    }
    best
}

impl VectorIndex for ClusteredIndex {
    fn variant(&self) -> IndexVariant {
        IndexVariant::Clustered
    }

    fn dimension(&self) -> usize {
        self.rows.dimension()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn is_indexed(&self) -> bool {
        self.trained
    }

    fn training_size(&self) -> Option<usize> {
        Some(self.training_size)
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        if !self.trained {
            return Err(IndexError::NotTrained);
        }
        for v in vectors {
            self.rows.check(v)?;
        }
        for v in vectors {
            let row = self.rows.push(v)?;
            let c = nearest(&self.centroids, v);
            self.lists[c].push(row);
        }
        Ok(())
    }

    /// Recreates the index from scratch. Training happens only when the
    /// surviving corpus reaches `training_size`; otherwise the index is left
    /// UNTRAINED and empty.
    fn rebuild_from(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        for v in vectors {
            self.rows.check(v)?;
        }
        self.reset();
        if vectors.len() >= self.training_size && !vectors.is_empty() {
            self.train(vectors);
            self.add(vectors)?;
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, IndexError> {
        if !self.trained {
            return Err(IndexError::NotTrained);
        }
        self.rows.check(query)?;

        let probed = rank_top_k(
            self.centroids
                .iter()
                .enumerate()
                .map(|(c, centroid)| (c, dot(centroid, query))),
            self.probes,
        );

        let candidates = probed.iter().flat_map(|cluster| {
            self.lists[cluster.row]
                .iter()
                .map(|&row| (row, dot(self.rows.row(row), query)))
        });
        Ok(rank_top_k(candidates, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(training_size: usize, clusters: usize, probes: usize) -> IndexParams {
        IndexParams {
            training_size,
            clusters,
            probes,
            ..IndexParams::default()
        }
    }

    fn unit(angle: f32) -> Vec<f32> {
        vec![angle.cos(), angle.sin()]
    }

    #[test]
    fn starts_untrained_and_refuses_search() {
        let index = ClusteredIndex::new(2, &params(4, 2, 1));
        assert!(!index.is_indexed());
        assert!(matches!(
            index.search(&[1.0, 0.0], 1),
            Err(IndexError::NotTrained)
        ));
    }

    #[test]
    fn add_before_training_is_rejected() {
        let mut index = ClusteredIndex::new(2, &params(4, 2, 1));
        assert!(matches!(
            index.add(&[vec![1.0, 0.0]]),
            Err(IndexError::NotTrained)
        ));
    }

    #[test]
    fn rebuild_below_training_size_stays_untrained() {
        let mut index = ClusteredIndex::new(2, &params(4, 2, 1));
        index.rebuild_from(&[unit(0.0), unit(0.1), unit(0.2)]).unwrap();
        assert!(!index.is_trained());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn rebuild_at_training_size_trains_and_indexes_all() {
        let mut index = ClusteredIndex::new(2, &params(4, 2, 1));
        let corpus = vec![unit(0.0), unit(0.1), unit(3.0), unit(3.1)];
        index.rebuild_from(&corpus).unwrap();

        assert!(index.is_trained());
        assert_eq!(index.len(), 4);
        assert_eq!(index.lists.iter().map(Vec::len).sum::<usize>(), 4);

        // Two well-separated groups end up in different clusters.
        assert_ne!(
            nearest(&index.centroids, &corpus[0]),
            nearest(&index.centroids, &corpus[2])
        );
    }

    #[test]
    fn every_vector_finds_itself_scanning_one_list() {
        let mut index = ClusteredIndex::new(2, &params(8, 3, 1));
        let corpus: Vec<Vec<f32>> = (0..8).map(|i| unit(i as f32 * 0.7)).collect();
        index.rebuild_from(&corpus).unwrap();

        for (row, v) in corpus.iter().enumerate() {
            let hits = index.search(v, 1).unwrap();
            assert_eq!(hits[0].row, row);
            assert!((hits[0].score - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn training_is_deterministic() {
        let corpus: Vec<Vec<f32>> = (0..12).map(|i| unit(i as f32 * 0.45)).collect();
        let mut a = ClusteredIndex::new(2, &params(10, 4, 2));
        let mut b = ClusteredIndex::new(2, &params(10, 4, 2));
        a.rebuild_from(&corpus).unwrap();
        b.rebuild_from(&corpus).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn validate_accepts_trained_and_untrained_states() {
        let mut index = ClusteredIndex::new(2, &params(4, 2, 1));
        index.validate().unwrap();
        let corpus: Vec<Vec<f32>> = (0..6).map(|i| unit(i as f32)).collect();
        index.rebuild_from(&corpus).unwrap();
        index.validate().unwrap();
    }

    #[test]
    fn validate_rejects_out_of_range_list_entries() {
        let mut index = ClusteredIndex::new(2, &params(4, 2, 1));
        let corpus: Vec<Vec<f32>> = (0..4).map(|i| unit(i as f32)).collect();
        index.rebuild_from(&corpus).unwrap();

        index.lists[0].push(9);
        assert!(matches!(index.validate(), Err(IndexError::Corrupt(_))));
    }

    #[test]
    fn validate_rejects_missing_lists() {
        let mut index = ClusteredIndex::new(2, &params(4, 2, 1));
        let corpus: Vec<Vec<f32>> = (0..4).map(|i| unit(i as f32)).collect();
        index.rebuild_from(&corpus).unwrap();

        index.lists.clear();
        assert!(matches!(index.validate(), Err(IndexError::Corrupt(_))));
    }

    #[test]
    fn rebuild_discards_previous_training() {
        let mut index = ClusteredIndex::new(2, &params(4, 2, 1));
        let corpus: Vec<Vec<f32>> = (0..4).map(|i| unit(i as f32)).collect();
        index.rebuild_from(&corpus).unwrap();
        assert!(index.is_trained());

        index.rebuild_from(&corpus[..3]).unwrap();
        assert!(!index.is_trained());
        assert_eq!(index.len(), 0);
    }
}
