// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted speech-to-text and text-to-speech adapters.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use storycircle_core::traits::adapter::PluginAdapter;
use storycircle_core::traits::synthesis::SynthesisAdapter;
use storycircle_core::traits::transcription::TranscriptionAdapter;
use storycircle_core::types::{AdapterType, AudioBuffer, HealthStatus, Transcript};
use storycircle_core::{CircleError, FailureKind};

/// One scripted transcription result.
#[derive(Debug, Clone)]
pub enum ScriptedTranscript {
    Text(String),
    Confident(String, f32),
    Fail(FailureKind),
}

/// A transcriber that pops scripted results in order.
///
/// With an empty script every call returns [`DEFAULT_MOCK_TRANSCRIPT`].
pub struct MockTranscriber {
    script: Mutex<VecDeque<ScriptedTranscript>>,
    mime_types: Vec<String>,
    calls: AtomicUsize,
}

pub const DEFAULT_MOCK_TRANSCRIPT: &str = "mock transcript";

impl MockTranscriber {
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    pub fn with_script(script: Vec<ScriptedTranscript>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(script)),
            mime_types: vec![
                "audio/webm".to_string(),
                "audio/ogg".to_string(),
                "audio/wav".to_string(),
            ],
            calls: AtomicUsize::new(0),
        }
    }

    /// Restricts the accepted MIME types, e.g. to exercise negotiation failures.
    pub fn with_mime_types(mut self, mime_types: Vec<String>) -> Self {
        self.mime_types = mime_types;
        self
    }

    pub async fn push(&self, result: ScriptedTranscript) {
        self.script.lock().await.push_back(result);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTranscriber {
    fn name(&self) -> &str {
        "mock-transcriber"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transcription
    }

    async fn health_check(&self) -> Result<HealthStatus, CircleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CircleError> {
        Ok(())
    }
}

#[async_trait]
impl TranscriptionAdapter for MockTranscriber {
    async fn transcribe(&self, audio: &AudioBuffer) -> Result<Transcript, CircleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if audio.is_empty() {
            return Err(CircleError::Transcription {
                message: "empty audio".into(),
                kind: FailureKind::Rejected,
                source: None,
            });
        }
        let next = self.script.lock().await.pop_front();
        match next {
            None => Ok(Transcript {
                text: DEFAULT_MOCK_TRANSCRIPT.to_string(),
                confidence: None,
            }),
            Some(ScriptedTranscript::Text(text)) => Ok(Transcript {
                text,
                confidence: None,
            }),
            Some(ScriptedTranscript::Confident(text, confidence)) => Ok(Transcript {
                text,
                confidence: Some(confidence),
            }),
            Some(ScriptedTranscript::Fail(kind)) => Err(CircleError::Transcription {
                message: "scripted transcription failure".into(),
                kind,
                source: None,
            }),
        }
    }

    fn supported_mime_types(&self) -> Vec<String> {
        self.mime_types.clone()
    }
}

/// A synthesizer returning a fixed-size silent clip, or failing on demand.
pub struct MockSynthesizer {
    fail: std::sync::atomic::AtomicBool,
    calls: AtomicUsize,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            fail: std::sync::atomic::AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockSynthesizer {
    fn name(&self) -> &str {
        "mock-synthesizer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Synthesis
    }

    async fn health_check(&self) -> Result<HealthStatus, CircleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CircleError> {
        Ok(())
    }
}

#[async_trait]
impl SynthesisAdapter for MockSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioBuffer, CircleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CircleError::Synthesis {
                message: format!("scripted synthesis failure for voice {voice_id}"),
                kind: FailureKind::Network,
                source: None,
            });
        }
        Ok(AudioBuffer {
            bytes: vec![0u8; 64 + text.len()],
            mime_type: "audio/mpeg".to_string(),
            duration_seconds: 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> AudioBuffer {
        AudioBuffer {
            bytes: vec![1, 2, 3],
            mime_type: "audio/wav".into(),
            duration_seconds: 0.1,
        }
    }

    #[tokio::test]
    async fn transcriber_follows_script_then_default() {
        let t = MockTranscriber::with_script(vec![
            ScriptedTranscript::Confident("it was raining".into(), 0.8),
            ScriptedTranscript::Fail(FailureKind::Timeout),
        ]);
        let first = t.transcribe(&clip()).await.unwrap();
        assert_eq!(first.text, "it was raining");
        assert_eq!(first.confidence, Some(0.8));
        assert!(t.transcribe(&clip()).await.is_err());
        assert_eq!(t.transcribe(&clip()).await.unwrap().text, DEFAULT_MOCK_TRANSCRIPT);
        assert_eq!(t.call_count(), 3);
    }

    #[tokio::test]
    async fn synthesizer_can_fail() {
        let s = MockSynthesizer::new();
        assert!(s.synthesize("hello", "v1").await.is_ok());
        s.set_failing(true);
        assert!(s.synthesize("hello", "v1").await.is_err());
    }
}
