// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` wires a [`StoreFactory`] over a temporary root, the store
//! tools, a [`MockAssistant`], and a [`RagAgent`], so a test can drive whole
//! conversations without network or model downloads.

use std::path::Path;
use std::sync::Arc;

use mnemos_agent::{AgentSettings, Conversation, RagAgent};
use mnemos_config::MnemosConfig;
use mnemos_core::{IndexVariant, MnemosError};
use mnemos_memory::{HashEmbedder, StoreFactory, StoreSettings};
use mnemos_tools::{ToolRegistry, store_registry};

use crate::mock_assistant::MockAssistant;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<String>,
    config: MnemosConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            config: MnemosConfig::default(),
        }
    }

    /// Set scripted assistant replies.
    pub fn with_mock_replies<S: Into<String>>(mut self, replies: impl IntoIterator<Item = S>) -> Self {
        self.replies = replies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_index(mut self, variant: IndexVariant) -> Self {
        self.config.store.index = variant;
        self
    }

    pub fn with_retain_pairs(mut self, pairs: usize) -> Self {
        self.config.window.retain_pairs = pairs;
        self
    }

    pub fn with_consolidation(mut self, enabled: bool) -> Self {
        self.config.window.consolidation_enabled = enabled;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.config.retrieval.max_tool_rounds = rounds;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.agent.system_prompt = Some(prompt.into());
        self
    }

    pub fn build(self) -> Result<TestHarness, MnemosError> {
        let temp_dir = tempfile::TempDir::new()?;
        let embedder = Arc::new(HashEmbedder::new(self.config.store.dimension)?);
        let factory = Arc::new(StoreFactory::new(
            temp_dir.path().join("users"),
            StoreSettings::from_config(&self.config),
            embedder,
        ));
        let tools = Arc::new(store_registry(Arc::clone(&factory)));
        let assistant = Arc::new(MockAssistant::with_replies(self.replies));
        let agent = Arc::new(RagAgent::new(
            assistant.clone(),
            Arc::clone(&factory),
            Arc::clone(&tools),
            AgentSettings::from_config(&self.config),
        ));

        Ok(TestHarness {
            assistant,
            factory,
            tools,
            agent,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock assistant and temp storage.
pub struct TestHarness {
    pub assistant: Arc<MockAssistant>,
    pub factory: Arc<StoreFactory>,
    pub tools: Arc<ToolRegistry>,
    pub agent: Arc<RagAgent>,
    pub config: MnemosConfig,
    /// Kept alive so the root is removed on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Default harness with an empty script.
    pub fn new() -> Result<Self, MnemosError> {
        Self::builder().build()
    }

    pub fn root(&self) -> &Path {
        self.factory.root()
    }

    /// A fresh conversation for `user_id` using the harness window settings.
    pub fn conversation(&self, user_id: &str) -> Result<Conversation, MnemosError> {
        Conversation::new(Arc::clone(&self.agent), user_id, &self.config.window)
    }

    /// Seeds a user's store directly, bypassing the assistant.
    pub async fn seed(&self, user_id: &str, texts: &[&str]) -> Result<Vec<String>, MnemosError> {
        let handle = self.factory.open(user_id).await?;
        let mut db = handle.lock().await;
        let mut ids = Vec::with_capacity(texts.len());
        for text in texts {
            ids.push(db.add(text, None).await?);
        }
        Ok(ids)
    }

    /// Document ids currently stored for `user_id`.
    pub async fn document_ids(&self, user_id: &str) -> Result<Vec<String>, MnemosError> {
        let handle = self.factory.open(user_id).await?;
        let ids = handle.lock().await.stats().document_ids;
        Ok(ids)
    }
}
