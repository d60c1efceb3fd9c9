// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assistant adapter trait for the language model behind each reply.

use async_trait::async_trait;

use crate::error::MnemosError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AssistantRequest, AssistantResponse};

/// A chat-completion provider that may request tool calls.
///
/// No timeout or retry is applied by callers; implementations that need
/// either must provide it themselves.
#[async_trait]
pub trait AssistantAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: AssistantRequest) -> Result<AssistantResponse, MnemosError>;
}
