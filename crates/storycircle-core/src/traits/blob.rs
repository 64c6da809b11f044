// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob store contract for audio artifacts.

use async_trait::async_trait;

use crate::error::CircleError;
use crate::traits::adapter::PluginAdapter;

/// Stores opaque binary artifacts. References are opaque to callers.
#[async_trait]
pub trait BlobStore: PluginAdapter {
    /// Stores the bytes and returns a reference.
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, CircleError>;

    /// Fetches the bytes and content type behind a reference.
    async fn get(&self, blob_ref: &str) -> Result<(Vec<u8>, String), CircleError>;
}
