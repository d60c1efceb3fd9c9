// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieve, ground, call the assistant, dispatch its tool calls, repeat.

use std::sync::Arc;

use async_trait::async_trait;
use mnemos_config::MnemosConfig;
use mnemos_context::{
    Consolidator, DocRef, GroundingContext, build_messages, default_system_prompt,
    render_system_prompt,
};
use mnemos_core::{AssistantAdapter, AssistantRequest, ChatMessage, MnemosError, Turn};
use mnemos_memory::StoreFactory;
use mnemos_tools::ToolRegistry;
use tracing::{debug, info, warn};

/// Knobs for one agent, usually taken from [`MnemosConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub model: String,
    pub system_prompt: String,
    pub top_k: usize,
    /// Assistant calls that may request tools before a final, tool-less call.
    pub max_tool_rounds: usize,
}

impl AgentSettings {
    pub fn from_config(config: &MnemosConfig) -> Self {
        Self {
            model: config.agent.model.clone(),
            system_prompt: config
                .agent
                .system_prompt
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| default_system_prompt(&config.agent.name)),
            top_k: config.retrieval.top_k,
            max_tool_rounds: config.retrieval.max_tool_rounds,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_config(&MnemosConfig::default())
    }
}

/// The assistant's final answer to one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub content: String,
    /// What retrieval returned before the first assistant call.
    pub retrieved: Vec<DocRef>,
    /// Tool calls dispatched while producing the answer.
    pub tool_calls: usize,
}

pub struct RagAgent {
    assistant: Arc<dyn AssistantAdapter>,
    factory: Arc<StoreFactory>,
    tools: Arc<ToolRegistry>,
    settings: AgentSettings,
}

impl RagAgent {
    pub fn new(
        assistant: Arc<dyn AssistantAdapter>,
        factory: Arc<StoreFactory>,
        tools: Arc<ToolRegistry>,
        settings: AgentSettings,
    ) -> Self {
        info!(
            assistant = assistant.name(),
            model = %settings.model,
            tools = tools.len(),
            "rag agent initialized"
        );
        Self {
            assistant,
            factory,
            tools,
            settings,
        }
    }

    pub fn factory(&self) -> &Arc<StoreFactory> {
        &self.factory
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Store statistics plus the top-k documents for `text`.
    ///
    /// The user's handle is released before returning so that tool calls
    /// made later in the turn can lock it again.
    pub async fn ground(&self, user_id: &str, text: &str) -> Result<GroundingContext, MnemosError> {
        let handle = self.factory.open(user_id).await?;
        let db = handle.lock().await;
        let memories = if text.trim().is_empty() {
            Vec::new()
        } else {
            db.search(text, self.settings.top_k)
                .await?
                .iter()
                .map(DocRef::from)
                .collect()
        };
        Ok(GroundingContext {
            user_id: user_id.to_string(),
            stats: Some(db.stats()),
            memories,
        })
    }

    /// Produces the reply to `text` given the held conversation `history`.
    pub async fn respond(
        &self,
        user_id: &str,
        text: &str,
        history: &[Turn],
    ) -> Result<Reply, MnemosError> {
        let grounding = self.ground(user_id, text).await?;
        debug!(user_id, retrieved = grounding.memories.len(), "grounding assembled");

        let system = render_system_prompt(&self.settings.system_prompt, &grounding);
        let mut messages = build_messages(system, history, text);
        let definitions = self.tools.tool_definitions();
        let mut tool_calls = 0;

        for round in 0..=self.settings.max_tool_rounds {
            let offer_tools = round < self.settings.max_tool_rounds;
            let request = AssistantRequest {
                model: self.settings.model.clone(),
                messages: messages.clone(),
                tools: if offer_tools { definitions.clone() } else { Vec::new() },
            };
            let response = self.assistant.complete(request).await?;

            if response.tool_calls.is_empty() || !offer_tools {
                if !response.tool_calls.is_empty() {
                    warn!(
                        user_id,
                        ignored = response.tool_calls.len(),
                        "tool round limit reached, ignoring further tool calls"
                    );
                }
                return Ok(Reply {
                    content: response.content,
                    retrieved: grounding.memories,
                    tool_calls,
                });
            }

            messages.push(ChatMessage::assistant(
                response.content,
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let envelope = self.tools.dispatch(&call.name, &call.arguments).await;
                debug!(user_id, tool = %call.name, success = envelope.success, "tool dispatched");
                messages.push(ChatMessage::tool_result(&call.id, envelope.to_json_string()));
                tool_calls += 1;
            }
        }

        // The final round never offers tools, so the loop always returns.
        Err(MnemosError::Internal("tool loop exited without a reply".to_string()))
    }
}

/// Consolidation is an ordinary turn with no window history: the assistant
/// sees the old message and decides what to store.
#[async_trait]
impl Consolidator for RagAgent {
    async fn consolidate(&self, user_id: &str, user_text: &str) -> Result<(), MnemosError> {
        let reply = self.respond(user_id, user_text, &[]).await?;
        debug!(user_id, tool_calls = reply.tool_calls, "turn consolidated");
        Ok(())
    }
}
