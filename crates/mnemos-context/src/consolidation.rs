// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort forwarding of evicted turns into long-term memory.
//!
//! Each evicted user turn gets its own [`Consolidator`] call, strictly
//! oldest first. A failure is logged and recorded in the
//! [`ConsolidationReport`], then the next turn is tried. Nothing is retried
//! and nothing propagates.

use std::sync::Arc;

use async_trait::async_trait;
use mnemos_core::MnemosError;
use tracing::{debug, warn};

use crate::window::MemoryMapping;

/// Pushes one evicted user turn into a user's long-term store.
#[async_trait]
pub trait Consolidator: Send + Sync {
    async fn consolidate(&self, user_id: &str, user_text: &str) -> Result<(), MnemosError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationFailure {
    pub user_text: String,
    pub error: String,
}

/// Outcome of one batch. Callers may log it; it is never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<ConsolidationFailure>,
}

impl ConsolidationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ConsolidationPipeline {
    consolidator: Arc<dyn Consolidator>,
    enabled: bool,
}

impl ConsolidationPipeline {
    pub fn new(consolidator: Arc<dyn Consolidator>, enabled: bool) -> Self {
        Self {
            consolidator,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// When disabled, evicted turns are dropped without any consolidator call.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Forwards `batch` in order and reports what happened.
    pub async fn run(&self, user_id: &str, batch: &[MemoryMapping]) -> ConsolidationReport {
        let mut report = ConsolidationReport::default();
        if batch.is_empty() {
            return report;
        }
        if !self.enabled {
            debug!(user_id, dropped = batch.len(), "consolidation disabled, evicted turns dropped");
            return report;
        }

        for mapping in batch {
            report.attempted += 1;
            match self.consolidator.consolidate(user_id, &mapping.user_text).await {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    warn!(user_id, error = %e, "consolidation failed, turn discarded");
                    report.failures.push(ConsolidationFailure {
                        user_text: mapping.user_text.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        debug!(
            user_id,
            attempted = report.attempted,
            succeeded = report.succeeded,
            "consolidation batch finished"
        );
        report
    }
}
