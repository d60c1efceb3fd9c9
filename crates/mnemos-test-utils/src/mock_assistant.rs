// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock assistant adapter for deterministic testing.
//!
//! Responses are popped from a FIFO script. When the script runs dry a
//! plain "mock response" is returned.

use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use mnemos_core::traits::adapter::PluginAdapter;
use mnemos_core::traits::assistant::AssistantAdapter;
use mnemos_core::types::{AdapterType, AssistantRequest, AssistantResponse, HealthStatus, ToolCall};
use mnemos_core::MnemosError;

enum Step {
    Reply(AssistantResponse),
    Fail(String),
}

#[derive(Default)]
pub struct MockAssistant {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<AssistantRequest>>,
    next_call_id: Mutex<usize>,
}

impl MockAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock pre-loaded with plain text replies.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = replies
            .into_iter()
            .map(|text| {
                Step::Reply(AssistantResponse {
                    content: text.into(),
                    tool_calls: Vec::new(),
                })
            })
            .collect();
        Self {
            script: Mutex::new(script),
            ..Self::default()
        }
    }

    /// Queues a plain text reply.
    pub async fn push_reply(&self, text: impl Into<String>) {
        self.script.lock().await.push_back(Step::Reply(AssistantResponse {
            content: text.into(),
            tool_calls: Vec::new(),
        }));
    }

    /// Queues a reply that asks for one tool call. Call ids run `call_0`, `call_1`, ...
    pub async fn push_tool_call(&self, name: &str, arguments: Value) {
        let id = {
            let mut next = self.next_call_id.lock().await;
            let id = format!("call_{next}");
            *next += 1;
            id
        };
        self.script.lock().await.push_back(Step::Reply(AssistantResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id,
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
        }));
    }

    /// Queues an arbitrary response.
    pub async fn push_response(&self, response: AssistantResponse) {
        self.script.lock().await.push_back(Step::Reply(response));
    }

    /// Queues a provider failure.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.script.lock().await.push_back(Step::Fail(message.into()));
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<AssistantRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Content of the last user message of every request, in order.
    pub async fn user_prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .await
            .iter()
            .filter_map(|r| {
                r.messages
                    .iter()
                    .rev()
                    .find(|m| m.role == mnemos_core::Role::User)
                    .map(|m| m.content.clone())
            })
            .collect()
    }
}

#[async_trait]
impl PluginAdapter for MockAssistant {
    fn name(&self) -> &str {
        "mock-assistant"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Assistant
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemosError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MnemosError> {
        Ok(())
    }
}

#[async_trait]
impl AssistantAdapter for MockAssistant {
    async fn complete(&self, request: AssistantRequest) -> Result<AssistantResponse, MnemosError> {
        self.requests.lock().await.push(request);
        match self.script.lock().await.pop_front() {
            Some(Step::Reply(response)) => Ok(response),
            Some(Step::Fail(message)) => Err(MnemosError::provider(message)),
            None => Ok(AssistantResponse {
                content: "mock response".to_string(),
                tool_calls: Vec::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_core::ChatMessage;

    fn request(text: &str) -> AssistantRequest {
        AssistantRequest {
            model: "m".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user(text)],
            tools: Vec::new(),
        }
    }

    #[tokio::test]
    async fn replays_script_then_default() {
        let mock = MockAssistant::with_replies(["first"]);
        mock.push_failure("down").await;

        assert_eq!(mock.complete(request("a")).await.unwrap().content, "first");
        assert!(mock.complete(request("b")).await.is_err());
        assert_eq!(mock.complete(request("c")).await.unwrap().content, "mock response");
        assert_eq!(mock.user_prompts().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn tool_call_ids_increase() {
        let mock = MockAssistant::new();
        mock.push_tool_call("list_users", serde_json::json!({})).await;
        mock.push_tool_call("list_users", serde_json::json!({})).await;

        let first = mock.complete(request("x")).await.unwrap();
        let second = mock.complete(request("y")).await.unwrap();
        assert_eq!(first.tool_calls[0].id, "call_0");
        assert_eq!(second.tool_calls[0].id, "call_1");
        assert_eq!(second.tool_calls[0].arguments, "{}");
        assert_eq!(mock.request_count().await, 2);
    }
}
