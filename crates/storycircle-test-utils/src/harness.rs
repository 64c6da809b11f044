// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full circle stack with mock collaborators, a
//! temp SQLite database and the virtual capture backend. Each participant
//! gets their own [`SubmissionOrchestrator`] from [`TestHarness::session`].

use std::sync::Arc;
use std::time::Duration;

use storycircle_capture::{AudioCaptureDevice, AudioEncoding, DeviceClass, VirtualBackend};
use storycircle_config::model::StorageConfig;
use storycircle_core::{
    CircleError, IdentityAdapter, StorageAdapter, TranscriptionAdapter, UserProfile,
};
use storycircle_engine::{
    CircleReader, CircleServices, Moderator, OrchestratorSettings, SubmissionOrchestrator,
    service_encodings,
};
use storycircle_speech::VoiceSynthesis;
use storycircle_storage::SqliteStorage;

use crate::mock_identity::{MockEmberContext, MockIdentity};
use crate::mock_provider::MockProvider;
use crate::mock_speech::{MockSynthesizer, MockTranscriber, ScriptedTranscript};
use crate::mock_storage::FaultyStore;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    transcripts: Vec<ScriptedTranscript>,
    transcription_enabled: bool,
    settings: OrchestratorSettings,
    backend: VirtualBackend,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut settings = OrchestratorSettings::default();
        settings.gate.cooldown = Duration::ZERO;
        settings.open_with_question = false;
        Self {
            responses: Vec::new(),
            transcripts: Vec::new(),
            transcription_enabled: true,
            settings,
            backend: VirtualBackend::new(),
        }
    }

    /// Set mock provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Script the transcriber's results, in order.
    pub fn with_transcripts(mut self, transcripts: Vec<ScriptedTranscript>) -> Self {
        self.transcripts = transcripts;
        self
    }

    /// Build without a transcriber, as when `[transcription] enabled = false`.
    pub fn without_transcription(mut self) -> Self {
        self.transcription_enabled = false;
        self
    }

    /// Replace the session settings. The harness default disables the
    /// cooldown and the opening question.
    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_backend(mut self, backend: VirtualBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, CircleError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| CircleError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        }));
        storage.initialize().await?;

        let transcriber = Arc::new(MockTranscriber::with_script(self.transcripts));
        let provider = Arc::new(MockProvider::with_responses(self.responses));

        Ok(TestHarness {
            store: Arc::new(FaultyStore::new(storage.clone())),
            storage,
            provider,
            transcriber,
            transcription_enabled: self.transcription_enabled,
            synthesizer: Arc::new(MockSynthesizer::new()),
            identity: Arc::new(MockIdentity::new()),
            context: Arc::new(MockEmberContext::new()),
            backend: Arc::new(self.backend),
            settings: self.settings,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete circle stack for integration tests.
///
/// Mocks are public so tests can script and inspect them directly. Sessions
/// write through `store`, so failures armed there hit the submission path;
/// `storage` is the same database without injection.
pub struct TestHarness {
    pub storage: Arc<SqliteStorage>,
    pub store: Arc<FaultyStore>,
    pub provider: Arc<MockProvider>,
    pub transcriber: Arc<MockTranscriber>,
    pub synthesizer: Arc<MockSynthesizer>,
    pub identity: Arc<MockIdentity>,
    pub context: Arc<MockEmberContext>,
    pub backend: Arc<VirtualBackend>,
    pub settings: OrchestratorSettings,
    transcription_enabled: bool,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default options.
    pub async fn new() -> Result<Self, CircleError> {
        Self::builder().build().await
    }

    pub fn services(&self) -> CircleServices {
        let transcriber: Option<Arc<dyn TranscriptionAdapter>> = if self.transcription_enabled {
            Some(self.transcriber.clone())
        } else {
            None
        };
        CircleServices {
            storage: self.store.clone(),
            blobs: self.store.clone(),
            transcriber,
            training: Some(self.storage.clone()),
            provider: self.provider.clone(),
            identity: self.identity.clone(),
            context: self.context.clone(),
        }
    }

    /// Records `owner_id` as the ember's owner and adds them as a user.
    pub async fn register_ember(&self, ember_id: &str, owner_id: &str) -> Result<(), CircleError> {
        if self.identity.profile(owner_id).await?.is_none() {
            self.identity.add_user(owner_id, owner_id).await;
        }
        self.storage.register_ember(ember_id, owner_id).await
    }

    /// A fresh capture device over the shared virtual backend.
    pub fn capture_device(&self) -> AudioCaptureDevice {
        let services = self.services();
        AudioCaptureDevice::new(
            self.backend.clone(),
            DeviceClass::Standard,
            AudioEncoding::ALL.to_vec(),
            service_encodings(services.transcriber.as_ref()),
        )
    }

    /// A session for `user_id` on `ember_id`, adding the user if unknown.
    pub async fn session(
        &self,
        ember_id: &str,
        user_id: &str,
    ) -> Result<SubmissionOrchestrator, CircleError> {
        let user = match self.identity.profile(user_id).await? {
            Some(profile) => profile,
            None => self.identity.add_user(user_id, user_id).await,
        };
        Ok(self.session_for(ember_id, user))
    }

    pub fn session_for(&self, ember_id: &str, user: UserProfile) -> SubmissionOrchestrator {
        SubmissionOrchestrator::new(
            self.services(),
            self.settings.clone(),
            self.capture_device(),
            ember_id,
            user,
        )
    }

    pub fn reader(&self) -> CircleReader {
        CircleReader::new(self.storage.clone(), self.identity.clone())
    }

    pub fn moderator(&self) -> Moderator {
        Moderator::new(self.storage.clone())
    }

    pub fn voice(&self) -> VoiceSynthesis {
        VoiceSynthesis::new(
            self.synthesizer.clone(),
            self.identity.clone(),
            self.settings.timeouts.synthesis,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storycircle_engine::SubmissionState;

    #[tokio::test]
    async fn harness_builds_and_submits_text() {
        let harness = TestHarness::new().await.unwrap();
        harness.register_ember("ember-1", "owner").await.unwrap();
        let mut session = harness.session("ember-1", "alice").await.unwrap();
        session.set_draft("We went to the park").unwrap();
        let outcome = session.submit().await.unwrap();
        assert_eq!(outcome.message.content, "We went to the park");
        assert_eq!(session.state(), SubmissionState::Submitted);
    }

    #[tokio::test]
    async fn sessions_share_one_store() {
        let harness = TestHarness::new().await.unwrap();
        let mut alice = harness.session("ember-1", "alice").await.unwrap();
        let mut bob = harness.session("ember-1", "bob").await.unwrap();
        alice.set_draft("Alice's memory of the day").unwrap();
        bob.set_draft("Bob's memory of the day").unwrap();
        alice.submit().await.unwrap();
        bob.submit().await.unwrap();

        let circle = harness
            .reader()
            .read_circle("ember-1", harness.settings.conversation_type)
            .await
            .unwrap();
        assert!(circle.len() >= 2);
    }
}
