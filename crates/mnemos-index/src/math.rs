// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector arithmetic and ranking shared by every index variant.

use std::cmp::Ordering;

use crate::Hit;

/// Inner product. Equals cosine similarity for unit-norm inputs.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2-normalize a vector. Near-zero vectors are returned unchanged.
pub fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}

/// Orders hits by descending score, breaking ties by ascending row.
pub(crate) fn hit_order(a: &Hit, b: &Hit) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.row.cmp(&b.row))
}

/// Keeps the `k` best `(row, score)` pairs in [`hit_order`].
///
/// This is the single ranking rule for the crate: the exact index, the
/// probed clusters, the graph beam, and callers scanning vectors themselves
/// all go through it, so equal inputs rank identically.
pub fn rank_top_k<I>(scored: I, k: usize) -> Vec<Hit>
where
    I: IntoIterator<Item = (usize, f32)>,
{
    let mut hits: Vec<Hit> = scored
        .into_iter()
        .map(|(row, score)| Hit { row, score })
        .collect();
    hits.sort_by(hit_order);
    hits.truncate(k);
    hits
}
