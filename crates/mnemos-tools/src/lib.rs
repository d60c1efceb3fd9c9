// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait, registry, and the built-in store tools for Mnemos.
//!
//! An assistant reaches the per-user store only through tools dispatched by
//! name. [`ToolRegistry::dispatch`] is the one place where errors turn into
//! structured `{success, error, data}` envelopes.

pub mod store;
pub mod tool;

pub use store::{register_store_tools, store_registry};
pub use tool::{Tool, ToolEnvelope, ToolRegistry, parse_args};
