// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A chat session for one user with a bounded working-memory window.

use std::sync::Arc;

use mnemos_config::model::WindowConfig;
use mnemos_context::{
    ConsolidationPipeline, ConsolidationReport, Consolidator, MemoryMapping, WorkingMemory,
};
use mnemos_core::{MnemosError, Turn};
use mnemos_memory::StoreStats;
use mnemos_memory::snapshot::validate_user_id;
use serde::Serialize;
use tracing::{debug, info};

use crate::rag::RagAgent;

/// Snapshot of a session's window state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub user_id: String,
    pub exchange_count: usize,
    pub retain_pairs: usize,
    pub threshold: usize,
    pub consolidation_enabled: bool,
}

pub struct Conversation {
    session_id: String,
    user_id: String,
    agent: Arc<RagAgent>,
    window: WorkingMemory,
    pipeline: ConsolidationPipeline,
}

impl Conversation {
    /// Starts a session that consolidates through `agent` itself.
    pub fn new(agent: Arc<RagAgent>, user_id: &str, window: &WindowConfig) -> Result<Self, MnemosError> {
        let consolidator: Arc<dyn Consolidator> = agent.clone();
        Self::with_consolidator(agent, consolidator, user_id, window)
    }

    /// Starts a session whose evicted turns go to `consolidator`.
    pub fn with_consolidator(
        agent: Arc<RagAgent>,
        consolidator: Arc<dyn Consolidator>,
        user_id: &str,
        window: &WindowConfig,
    ) -> Result<Self, MnemosError> {
        validate_user_id(user_id)?;
        let session_id = uuid::Uuid::new_v4().to_string();
        info!(
            session_id = %session_id,
            user_id,
            retain_pairs = window.retain_pairs,
            "conversation started"
        );
        Ok(Self {
            session_id,
            user_id: user_id.to_string(),
            agent,
            window: WorkingMemory::new(window.retain_pairs)?,
            pipeline: ConsolidationPipeline::new(consolidator, window.consolidation_enabled),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Held turns, oldest first.
    pub fn history(&self) -> &[Turn] {
        self.window.turns()
    }

    pub fn mappings(&self) -> &[MemoryMapping] {
        self.window.mappings()
    }

    /// Answers `text`, records the exchange, and consolidates any overflow.
    ///
    /// Only the reply can fail. Consolidation problems are logged and dropped.
    pub async fn chat(&mut self, text: &str) -> Result<String, MnemosError> {
        let reply = self
            .agent
            .respond(&self.user_id, text, self.window.turns())
            .await?;

        self.window
            .push_exchange(text, reply.content.clone(), reply.retrieved);
        let evicted = self.window.evict_overflow();
        self.consolidate(evicted).await;
        Ok(reply.content)
    }

    /// Changes how many pairs the window keeps, consolidating whatever no
    /// longer fits.
    pub async fn set_history_length(&mut self, retain_pairs: usize) -> Result<(), MnemosError> {
        let evicted = self.window.set_retain_pairs(retain_pairs)?;
        self.consolidate(evicted).await;
        Ok(())
    }

    pub fn set_consolidation(&mut self, enabled: bool) {
        self.pipeline.set_enabled(enabled);
    }

    pub fn consolidation_enabled(&self) -> bool {
        self.pipeline.is_enabled()
    }

    /// Forgets the window without consolidating it.
    pub fn clear(&mut self) {
        self.window.clear();
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
            exchange_count: self.window.pair_count(),
            retain_pairs: self.window.retain_pairs(),
            threshold: self.window.threshold(),
            consolidation_enabled: self.pipeline.is_enabled(),
        }
    }

    /// Statistics of this user's long-term store.
    pub async fn memory_stats(&self) -> Result<StoreStats, MnemosError> {
        let handle = self.agent.factory().open(&self.user_id).await?;
        let stats = handle.lock().await.stats();
        Ok(stats)
    }

    /// Deletes every document in this user's long-term store and returns how many went.
    pub async fn clear_memory(&self) -> Result<usize, MnemosError> {
        let handle = self.agent.factory().open(&self.user_id).await?;
        let mut db = handle.lock().await;
        let ids = db.stats().document_ids;
        let mut removed = 0;
        for doc_id in &ids {
            if db.delete(doc_id).await? {
                removed += 1;
            }
        }
        info!(user_id = %self.user_id, removed, "long-term memory cleared");
        Ok(removed)
    }

    async fn consolidate(&self, evicted: Vec<MemoryMapping>) {
        if evicted.is_empty() {
            return;
        }
        let report: ConsolidationReport = self.pipeline.run(&self.user_id, &evicted).await;
        debug!(
            session_id = %self.session_id,
            evicted = evicted.len(),
            succeeded = report.succeeded,
            failed = report.failures.len(),
            "overflow consolidated"
        );
    }
}
