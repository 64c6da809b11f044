// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted completion provider.
//!
//! Answers come from a queue so a test can decide what the "model" says for
//! each follow-up, including empty or over-long answers that the question
//! post-processing has to repair.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use storycircle_core::CircleError;
use storycircle_core::traits::adapter::PluginAdapter;
use storycircle_core::traits::provider::ProviderAdapter;
use storycircle_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};

/// Answer given once the scripted queue runs dry.
pub const DEFAULT_MOCK_QUESTION: &str = "What do you remember most about that day?";

#[derive(Default)]
struct Script {
    answers: VecDeque<String>,
    seen: Vec<ProviderRequest>,
}

/// [`ProviderAdapter`] that replays queued answers and records every request.
#[derive(Default)]
pub struct MockProvider {
    script: Mutex<Script>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            script: Mutex::new(Script {
                answers: responses.into(),
                seen: Vec::new(),
            }),
            ..Self::default()
        }
    }

    pub async fn add_response(&self, text: String) {
        self.script.lock().await.answers.push_back(text);
    }

    /// While set, every call fails with a provider error. Requests are still
    /// recorded and counted.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests seen so far, oldest first.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.script.lock().await.seen.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, CircleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CircleError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, CircleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let model = request.model.clone();
        let prompt_len: usize = request.messages.iter().map(|m| m.content.len()).sum();

        let answer = {
            let mut script = self.script.lock().await;
            script.seen.push(request);
            if self.failing.load(Ordering::SeqCst) {
                None
            } else {
                Some(
                    script
                        .answers
                        .pop_front()
                        .unwrap_or_else(|| DEFAULT_MOCK_QUESTION.to_string()),
                )
            }
        };
        let Some(content) = answer else {
            return Err(CircleError::Provider {
                message: "scripted provider failure".into(),
                source: None,
            });
        };

        Ok(ProviderResponse {
            id: format!("mock-{}", uuid::Uuid::new_v4()),
            usage: TokenUsage {
                input_tokens: (prompt_len / 4) as u32,
                output_tokens: (content.len() / 4) as u32,
            },
            content,
            model,
            stop_reason: Some("end_turn".to_string()),
        })
    }
}
