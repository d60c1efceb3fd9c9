// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assistant round-trip and conversation management for Mnemos.
//!
//! The [`RagAgent`] answers one message for one user: it retrieves related
//! documents, grounds the system prompt with them, and lets the assistant
//! call store tools for a bounded number of rounds. A [`Conversation`] wraps
//! it with a working-memory window whose evicted turns are consolidated
//! back into the store through the same agent.

pub mod conversation;
pub mod rag;

pub use conversation::{Conversation, SessionInfo};
pub use rag::{AgentSettings, RagAgent, Reply};
