// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded working-memory window.
//!
//! The window holds whole exchanges only. Each exchange contributes one user
//! turn, one assistant turn, and one [`MemoryMapping`], so the mapping count
//! always equals the pair count.

use mnemos_core::{MnemosError, Turn};
use mnemos_memory::SearchResult;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A document that retrieval surfaced for a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocRef {
    pub doc_id: String,
    pub text: String,
    pub score: f32,
}

impl From<&SearchResult> for DocRef {
    fn from(hit: &SearchResult) -> Self {
        Self {
            doc_id: hit.doc_id.clone(),
            text: hit.text.clone(),
            score: hit.score,
        }
    }
}

/// The user text of one exchange and what retrieval returned for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMapping {
    pub user_text: String,
    pub retrieved: Vec<DocRef>,
}

#[derive(Debug, Clone)]
pub struct WorkingMemory {
    turns: Vec<Turn>,
    mappings: Vec<MemoryMapping>,
    retain_pairs: usize,
}

impl WorkingMemory {
    /// Creates an empty window that retains `retain_pairs` exchanges.
    pub fn new(retain_pairs: usize) -> Result<Self, MnemosError> {
        check_retain_pairs(retain_pairs)?;
        Ok(Self {
            turns: Vec::new(),
            mappings: Vec::new(),
            retain_pairs,
        })
    }

    /// `N`, the number of pairs kept after a trim.
    pub fn retain_pairs(&self) -> usize {
        self.retain_pairs
    }

    /// `2N`, the most pairs the window holds before clipping.
    pub fn threshold(&self) -> usize {
        self.retain_pairs * 2
    }

    pub fn pair_count(&self) -> usize {
        self.mappings.len()
    }

    /// Held turns, oldest first, alternating user and assistant.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn mappings(&self) -> &[MemoryMapping] {
        &self.mappings
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Appends one exchange. Call [`evict_overflow`](Self::evict_overflow)
    /// afterwards to apply the window limit.
    pub fn push_exchange(
        &mut self,
        user_text: impl Into<String>,
        reply: impl Into<String>,
        retrieved: Vec<DocRef>,
    ) {
        let user_text = user_text.into();
        self.turns.push(Turn::user(user_text.clone()));
        self.turns.push(Turn::assistant(reply));
        self.mappings.push(MemoryMapping {
            user_text,
            retrieved,
        });
    }

    /// Once the pair count passes `2N`, removes all but the newest `N`
    /// pairs and returns the removed mappings in chronological order.
    /// Returns an empty batch otherwise.
    ///
    /// The window may hold exactly `2N` pairs; only the next exchange clips
    /// it. Clipping on reaching `2N` would leave `N = 3` with two pairs after
    /// seven turns instead of three held and four forwarded.
    pub fn evict_overflow(&mut self) -> Vec<MemoryMapping> {
        let pairs = self.pair_count();
        if pairs <= self.threshold() {
            return Vec::new();
        }

        let overflow = pairs - self.retain_pairs;
        self.turns.drain(..overflow * 2);
        let evicted: Vec<MemoryMapping> = self.mappings.drain(..overflow).collect();
        debug!(
            evicted = evicted.len(),
            held = self.pair_count(),
            "working memory trimmed"
        );
        evicted
    }

    /// Changes `N` and immediately applies the overflow rule.
    pub fn set_retain_pairs(&mut self, retain_pairs: usize) -> Result<Vec<MemoryMapping>, MnemosError> {
        check_retain_pairs(retain_pairs)?;
        self.retain_pairs = retain_pairs;
        Ok(self.evict_overflow())
    }

    /// Drops every held exchange without consolidating it.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.mappings.clear();
    }
}

fn check_retain_pairs(retain_pairs: usize) -> Result<(), MnemosError> {
    if retain_pairs == 0 {
        return Err(MnemosError::Validation(
            "history length must be at least 1 pair".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_core::Role;
    use proptest::prelude::*;

    fn fill(window: &mut WorkingMemory, from: usize, to: usize) -> Vec<MemoryMapping> {
        let mut evicted = Vec::new();
        for i in from..to {
            window.push_exchange(format!("q{i}"), format!("a{i}"), Vec::new());
            evicted.extend(window.evict_overflow());
        }
        evicted
    }

    #[test]
    fn zero_retain_pairs_is_rejected() {
        assert!(matches!(
            WorkingMemory::new(0),
            Err(MnemosError::Validation(_))
        ));
        let mut window = WorkingMemory::new(2).unwrap();
        assert!(window.set_retain_pairs(0).is_err());
        assert_eq!(window.retain_pairs(), 2);
    }

    #[test]
    fn holds_up_to_threshold() {
        let mut window = WorkingMemory::new(3).unwrap();
        let evicted = fill(&mut window, 0, 6);
        assert!(evicted.is_empty());
        assert_eq!(window.pair_count(), 6);
        assert_eq!(window.turns().len(), 12);
    }

    #[test]
    fn seventh_exchange_trims_to_newest_three() {
        let mut window = WorkingMemory::new(3).unwrap();
        let evicted = fill(&mut window, 0, 7);

        let texts: Vec<&str> = evicted.iter().map(|m| m.user_text.as_str()).collect();
        assert_eq!(texts, vec!["q0", "q1", "q2", "q3"]);
        assert_eq!(window.pair_count(), 3);
        assert_eq!(window.turns()[0], Turn::user("q4"));
        assert_eq!(window.turns()[5], Turn::assistant("a6"));
    }

    #[test]
    fn turns_alternate_user_then_assistant() {
        let mut window = WorkingMemory::new(2).unwrap();
        fill(&mut window, 0, 9);
        for pair in window.turns().chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
        }
    }

    #[test]
    fn shrinking_history_evicts_immediately() {
        let mut window = WorkingMemory::new(3).unwrap();
        fill(&mut window, 0, 5);

        let evicted = window.set_retain_pairs(2).unwrap();
        let texts: Vec<&str> = evicted.iter().map(|m| m.user_text.as_str()).collect();
        assert_eq!(texts, vec!["q0", "q1", "q2"]);
        assert_eq!(window.pair_count(), 2);
    }

    #[test]
    fn growing_history_evicts_nothing() {
        let mut window = WorkingMemory::new(2).unwrap();
        fill(&mut window, 0, 3);
        assert!(window.set_retain_pairs(5).unwrap().is_empty());
        assert_eq!(window.threshold(), 10);
        assert_eq!(window.pair_count(), 3);
    }

    #[test]
    fn mapping_keeps_retrieved_docs() {
        let mut window = WorkingMemory::new(1).unwrap();
        let doc = DocRef {
            doc_id: "doc_4".into(),
            text: "likes tea".into(),
            score: 0.8,
        };
        window.push_exchange("drinks?", "tea", vec![doc.clone()]);
        assert_eq!(window.mappings()[0].retrieved, vec![doc]);
    }

    #[test]
    fn clear_empties_without_eviction() {
        let mut window = WorkingMemory::new(2).unwrap();
        fill(&mut window, 0, 3);
        window.clear();
        assert!(window.is_empty());
        assert!(window.turns().is_empty());
    }

    proptest! {
        #[test]
        fn window_invariants_hold(retain in 1usize..6, exchanges in 0usize..40) {
            let mut window = WorkingMemory::new(retain).unwrap();
            let evicted = fill(&mut window, 0, exchanges);

            prop_assert_eq!(window.turns().len(), window.pair_count() * 2);
            prop_assert!(window.pair_count() <= window.threshold());
            prop_assert_eq!(evicted.len() + window.pair_count(), exchanges);

            // Everything evicted precedes everything held, in order.
            let order: Vec<String> = evicted
                .iter()
                .chain(window.mappings())
                .map(|m| m.user_text.clone())
                .collect();
            let expected: Vec<String> = (0..exchanges).map(|i| format!("q{i}")).collect();
            prop_assert_eq!(order, expected);
        }
    }
}
