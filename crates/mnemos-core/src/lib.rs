// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Mnemos.
//!
//! Holds the error taxonomy, the message and turn types exchanged between
//! the store, the conversation window, and the assistant, and the adapter
//! traits that embedders and assistant providers implement.

pub mod error;
pub mod traits;
pub mod types;

pub use error::MnemosError;
pub use types::{
    AdapterType, AssistantRequest, AssistantResponse, ChatMessage, EmbeddingInput,
    EmbeddingOutput, HealthStatus, IndexVariant, Role, ToolCall, Turn,
};

pub use traits::{AssistantAdapter, EmbeddingAdapter, PluginAdapter};
