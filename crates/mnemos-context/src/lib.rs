// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation-side memory for Mnemos.
//!
//! - **Window**: the newest `N` user/assistant pairs plus what retrieval
//!   returned for each, clipped back to `N` once it reaches `2N`
//! - **Consolidation**: evicted user turns are forwarded, oldest first, to
//!   the long-term store through a [`Consolidator`]
//! - **Grounding**: retrieved memories, store statistics, and the held
//!   window rendered into the messages of one assistant request

pub mod consolidation;
pub mod grounding;
pub mod window;

pub use consolidation::{
    ConsolidationFailure, ConsolidationPipeline, ConsolidationReport, Consolidator,
};
pub use grounding::{GroundingContext, build_messages, default_system_prompt, render_system_prompt};
pub use window::{DocRef, MemoryMapping, WorkingMemory};
