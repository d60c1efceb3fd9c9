// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mnemos integration tests.
//!
//! # Components
//!
//! - [`MockAssistant`] - scripted assistant that records every request
//! - [`TestHarness`] - store, tools, and agent over a temporary root

pub mod harness;
pub mod mock_assistant;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_assistant::MockAssistant;
