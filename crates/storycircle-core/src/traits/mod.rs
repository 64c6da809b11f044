// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Story Circle collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod blob;
pub mod context;
pub mod identity;
pub mod provider;
pub mod storage;
pub mod synthesis;
pub mod training;
pub mod transcription;

pub use adapter::PluginAdapter;
pub use blob::BlobStore;
pub use context::EmberContextSource;
pub use identity::IdentityAdapter;
pub use provider::ProviderAdapter;
pub use storage::StorageAdapter;
pub use synthesis::SynthesisAdapter;
pub use training::TrainingSink;
pub use transcription::TranscriptionAdapter;
