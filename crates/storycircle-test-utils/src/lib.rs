// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Story Circle integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Completion provider with queued responses
//! - [`MockTranscriber`] / [`MockSynthesizer`] - Scripted speech adapters
//! - [`MockIdentity`] / [`MockEmberContext`] - In-memory users and ember metadata
//! - [`FaultyStore`] - SQLite store with one-shot append and upload failures
//! - [`TestHarness`] - Temp SQLite store plus the virtual capture backend

pub mod harness;
pub mod mock_identity;
pub mod mock_provider;
pub mod mock_speech;
pub mod mock_storage;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_identity::{MockEmberContext, MockIdentity};
pub use mock_provider::MockProvider;
pub use mock_speech::{MockSynthesizer, MockTranscriber, ScriptedTranscript};
pub use mock_storage::FaultyStore;
