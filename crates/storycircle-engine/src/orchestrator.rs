// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-participant submission state machine.
//!
//! States run `Idle -> Recording -> Stopped -> Processing -> Submitted`.
//! A typed-only answer may be submitted straight from `Idle`. Processing
//! sequences upload, optional transcription and the append; once the answer
//! is stored, question gating and generation run as non-fatal follow-up.
//! Any failure before the append returns the session to the state it was in,
//! keeping the draft and the recording so the user can simply submit again.
//! The upload and transcription of a recording are kept with it, so a retry
//! only repeats the steps that did not finish.
//!
//! Audio preview (`Playing`) is tracked by the session's [`PlaybackSlot`] and
//! never overlaps with recording.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use storycircle_capture::{AudioCaptureDevice, AudioEncoding, CaptureBackend, DeviceClass};
use storycircle_config::CircleConfig;
use storycircle_config::model::CaptureConfig;
use storycircle_core::{
    AudioBuffer, BlobStore, CircleError, Conversation, ConversationType, EmberContext,
    EmberContextSource, FailureKind, IdentityAdapter, Message, NewMessage, ProviderAdapter,
    StorageAdapter, TrainingSample, TrainingSink, Transcript, TranscriptionAdapter,
    TranscriptionStatus, UserProfile,
};
use storycircle_speech::{PlaybackKind, PlaybackSlot, PlaybackTicket, forward_training};
use tracing::{debug, info, warn};

use crate::content::{TranscriptionOutcome, merge_content};
use crate::fivews::analyze;
use crate::gate::{GateDecision, GateOptions, count_ai_questions, should_generate};
use crate::generator::{GeneratorSettings, QuestionGenerator};
use crate::timeout::{TimeoutPolicy, with_timeout};

/// States in the submission FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    /// Nothing recorded; typed text may be pending.
    Idle,
    /// The capture device is held.
    Recording,
    /// A recording is ready to submit.
    Stopped,
    /// Submission in flight. Submit is disabled.
    Processing,
    /// The last answer was stored.
    Submitted,
}

impl std::fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionState::Idle => write!(f, "idle"),
            SubmissionState::Recording => write!(f, "recording"),
            SubmissionState::Stopped => write!(f, "stopped"),
            SubmissionState::Processing => write!(f, "processing"),
            SubmissionState::Submitted => write!(f, "submitted"),
        }
    }
}

/// External collaborators shared by every session.
#[derive(Clone)]
pub struct CircleServices {
    pub storage: Arc<dyn StorageAdapter>,
    pub blobs: Arc<dyn BlobStore>,
    /// `None` when transcription is disabled.
    pub transcriber: Option<Arc<dyn TranscriptionAdapter>>,
    pub training: Option<Arc<dyn TrainingSink>>,
    pub provider: Arc<dyn ProviderAdapter>,
    pub identity: Arc<dyn IdentityAdapter>,
    pub context: Arc<dyn EmberContextSource>,
}

/// Policy knobs for a session.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub conversation_type: ConversationType,
    pub gate: GateOptions,
    pub generator: GeneratorSettings,
    pub timeouts: TimeoutPolicy,
    pub open_with_question: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            conversation_type: ConversationType::Story,
            gate: GateOptions::default(),
            generator: GeneratorSettings::default(),
            timeouts: TimeoutPolicy::default(),
            open_with_question: true,
        }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &CircleConfig) -> Result<Self, CircleError> {
        let conversation_type = ConversationType::from_str(&config.circle.conversation_type)
            .map_err(|_| {
                CircleError::Config(format!(
                    "unknown conversation type: {}",
                    config.circle.conversation_type
                ))
            })?;
        let timeouts = TimeoutPolicy::from_config(&config.network)?;
        Ok(Self {
            conversation_type,
            gate: GateOptions::from(&config.questions),
            generator: GeneratorSettings::from_config(
                &config.anthropic,
                &config.questions,
                timeouts.completion,
            ),
            timeouts,
            open_with_question: config.questions.open_with_question,
        })
    }
}

/// Encodings accepted by the transcription service, or all of them when
/// nothing will be transcribed.
pub fn service_encodings(transcriber: Option<&Arc<dyn TranscriptionAdapter>>) -> Vec<AudioEncoding> {
    match transcriber {
        Some(t) => {
            let mut encodings = Vec::new();
            for encoding in t
                .supported_mime_types()
                .iter()
                .filter_map(|m| AudioEncoding::from_mime(m))
            {
                if !encodings.contains(&encoding) {
                    encodings.push(encoding);
                }
            }
            encodings
        }
        None => AudioEncoding::ALL.to_vec(),
    }
}

/// Builds the capture device described by `[capture]`.
pub fn capture_device_from_config(
    config: &CaptureConfig,
    backend: Arc<dyn CaptureBackend>,
    service: Vec<AudioEncoding>,
) -> Result<AudioCaptureDevice, CircleError> {
    let class = DeviceClass::from_str(&config.device_class)
        .map_err(|_| CircleError::Config(format!("unknown device class: {}", config.device_class)))?;
    let preferred = config
        .preferred_encodings
        .iter()
        .map(|name| {
            AudioEncoding::from_str(name)
                .map_err(|_| CircleError::Config(format!("unknown audio encoding: {name}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AudioCaptureDevice::new(backend, class, preferred, service))
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub conversation_id: String,
    /// The stored participant answer.
    pub message: Message,
    /// The follow-up question, if one was generated and stored.
    pub ai_question: Option<Message>,
    /// `None` when the history could not be read for gating.
    pub gate: Option<GateDecision>,
    pub transcription: TranscriptionStatus,
    /// The conversation reached its question limit and was closed.
    pub conversation_completed: bool,
}

/// A participant's circle as shown when they open it.
#[derive(Debug, Clone)]
pub struct OpenedCircle {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
    pub opening_question: Option<Message>,
}

#[derive(Default)]
struct FollowUp {
    gate: Option<GateDecision>,
    question: Option<Message>,
    completed: bool,
}

/// Drives one participant's answers for one ember.
pub struct SubmissionOrchestrator {
    services: CircleServices,
    settings: OrchestratorSettings,
    generator: QuestionGenerator,
    capture: AudioCaptureDevice,
    playback: Arc<PlaybackSlot>,
    ember_id: String,
    user: UserProfile,
    state: SubmissionState,
    draft: String,
    recording: Option<AudioBuffer>,
    /// Blob ref of `recording`, once uploaded.
    audio_ref: Option<String>,
    transcription: Option<TranscriptionOutcome>,
    handle: Option<storycircle_capture::CaptureHandle>,
}

impl SubmissionOrchestrator {
    pub fn new(
        services: CircleServices,
        settings: OrchestratorSettings,
        capture: AudioCaptureDevice,
        ember_id: impl Into<String>,
        user: UserProfile,
    ) -> Self {
        let generator = QuestionGenerator::new(
            Arc::clone(&services.provider),
            settings.generator.clone(),
        );
        Self {
            services,
            settings,
            generator,
            capture,
            playback: Arc::new(PlaybackSlot::new()),
            ember_id: ember_id.into(),
            user,
            state: SubmissionState::Idle,
            draft: String::new(),
            recording: None,
            audio_ref: None,
            transcription: None,
            handle: None,
        }
    }

    /// Creates a session for whoever the identity collaborator says is signed in.
    pub async fn for_current_user(
        services: CircleServices,
        settings: OrchestratorSettings,
        capture: AudioCaptureDevice,
        ember_id: impl Into<String>,
    ) -> Result<Self, CircleError> {
        let user = services.identity.current_user().await?;
        Ok(Self::new(services, settings, capture, ember_id, user))
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn ember_id(&self) -> &str {
        &self.ember_id
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn recording(&self) -> Option<&AudioBuffer> {
        self.recording.as_ref()
    }

    /// The session's playback slot, shared with synthesized playback.
    pub fn playback(&self) -> Arc<PlaybackSlot> {
        Arc::clone(&self.playback)
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        matches!(self.state, SubmissionState::Idle | SubmissionState::Stopped)
            && (!self.draft.trim().is_empty() || self.recording.is_some())
    }

    /// Replaces the typed text. Starting a new answer after a submission
    /// returns the session to `Idle`.
    pub fn set_draft(&mut self, text: impl Into<String>) -> Result<(), CircleError> {
        match self.state {
            SubmissionState::Processing => Err(CircleError::InvalidState(
                "cannot edit while a submission is processing".into(),
            )),
            SubmissionState::Submitted => {
                self.state = SubmissionState::Idle;
                self.draft = text.into();
                Ok(())
            }
            _ => {
                self.draft = text.into();
                Ok(())
            }
        }
    }

    /// Acquires the microphone. On failure the state is unchanged.
    pub fn start_recording(&mut self) -> Result<(), CircleError> {
        match self.state {
            SubmissionState::Idle | SubmissionState::Stopped | SubmissionState::Submitted => {}
            other => {
                return Err(CircleError::InvalidState(format!("cannot record while {other}")));
            }
        }

        if self.playback.stop().is_some() {
            debug!("playback stopped to start recording");
        }
        let handle = self.capture.begin_default_capture()?;

        if self.state == SubmissionState::Submitted {
            self.draft.clear();
        }
        self.handle = Some(handle);
        self.discard_recording();
        self.state = SubmissionState::Recording;
        debug!(ember_id = %self.ember_id, user_id = %self.user.id, "recording started");
        Ok(())
    }

    /// Releases the microphone and keeps the finished recording.
    pub fn stop_recording(&mut self) -> Result<(), CircleError> {
        if self.state != SubmissionState::Recording {
            return Err(CircleError::InvalidState(format!(
                "cannot stop recording while {}",
                self.state
            )));
        }
        let Some(handle) = self.handle.take() else {
            self.state = SubmissionState::Idle;
            return Err(CircleError::InvalidState("no active capture".into()));
        };

        match self.capture.end_capture(handle) {
            Ok(buffer) => {
                debug!(
                    duration_seconds = buffer.duration_seconds,
                    size_bytes = buffer.size_bytes(),
                    "recording stopped"
                );
                self.recording = Some(buffer);
                self.state = SubmissionState::Stopped;
                Ok(())
            }
            Err(e) => {
                self.state = SubmissionState::Idle;
                Err(e.into())
            }
        }
    }

    /// Abandons the current recording and releases the microphone.
    pub fn cancel_recording(&mut self) -> Result<(), CircleError> {
        if self.state != SubmissionState::Recording {
            return Err(CircleError::InvalidState(format!(
                "cannot cancel recording while {}",
                self.state
            )));
        }
        if let Some(handle) = self.handle.take() {
            self.capture.cancel_capture(handle);
        }
        self.state = SubmissionState::Idle;
        Ok(())
    }

    /// Plays back the finished recording through the session's slot.
    pub fn play_preview(&self) -> Result<PlaybackTicket, CircleError> {
        if matches!(self.state, SubmissionState::Recording | SubmissionState::Processing) {
            return Err(CircleError::InvalidState(format!(
                "cannot play while {}",
                self.state
            )));
        }
        let recording = self
            .recording
            .as_ref()
            .ok_or_else(|| CircleError::InvalidState("nothing recorded".into()))?;
        let (ticket, _) = self.playback.start(PlaybackKind::Raw, recording.clone(), None);
        Ok(ticket)
    }

    pub fn stop_playback(&self) {
        self.playback.stop();
    }

    /// Discards the draft and recording and returns to `Idle`.
    pub fn reset(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.capture.cancel_capture(handle);
        }
        self.playback.stop();
        self.draft.clear();
        self.discard_recording();
        self.state = SubmissionState::Idle;
    }

    fn discard_recording(&mut self) {
        self.recording = None;
        self.audio_ref = None;
        self.transcription = None;
    }

    /// Gets or creates the participant's conversation and, when it is empty,
    /// stores an opening question.
    pub async fn open_circle(&self) -> Result<OpenedCircle, CircleError> {
        let conversation = self.conversation().await?;
        let mut messages = self.services.storage.get_messages(&conversation.id, None).await?;

        let mut opening_question = None;
        if messages.is_empty() && self.settings.open_with_question {
            let text = self.compose_question(&[], "").await;
            match self
                .services
                .storage
                .append_first_message(&conversation.id, NewMessage::ai_question(text))
                .await
            {
                Ok(Some(question)) => {
                    messages.push(question.clone());
                    opening_question = Some(question);
                }
                Ok(None) => {
                    debug!(conversation_id = %conversation.id, "opening question already asked");
                    messages = self.services.storage.get_messages(&conversation.id, None).await?;
                }
                Err(e) => {
                    warn!(conversation_id = %conversation.id, error = %e, "failed to store opening question");
                }
            }
        }

        Ok(OpenedCircle {
            conversation,
            messages,
            opening_question,
        })
    }

    /// Submits the draft and/or recording.
    pub async fn submit(&mut self) -> Result<SubmissionOutcome, CircleError> {
        match self.state {
            SubmissionState::Idle | SubmissionState::Stopped => {}
            other => {
                return Err(CircleError::InvalidState(format!("cannot submit while {other}")));
            }
        }
        if self.draft.trim().is_empty() && self.recording.is_none() {
            return Err(CircleError::InvalidState("nothing to submit".into()));
        }

        let previous = self.state;
        self.state = SubmissionState::Processing;
        let result = self.process().await;

        match &result {
            Ok(outcome) => {
                info!(
                    ember_id = %self.ember_id,
                    user_id = %self.user.id,
                    conversation_id = %outcome.conversation_id,
                    sequence_number = outcome.message.sequence_number,
                    "answer submitted"
                );
                self.state = SubmissionState::Submitted;
                self.draft.clear();
                self.discard_recording();
            }
            Err(e) => {
                warn!(
                    ember_id = %self.ember_id,
                    user_id = %self.user.id,
                    error = %e,
                    retryable = e.is_retryable(),
                    "submission failed"
                );
                self.state = previous;
            }
        }
        result
    }

    async fn conversation(&self) -> Result<Conversation, CircleError> {
        self.services
            .storage
            .get_or_create_conversation(&self.ember_id, &self.user.id, self.settings.conversation_type)
            .await
    }

    async fn process(&mut self) -> Result<SubmissionOutcome, CircleError> {
        let conversation = self.conversation().await?;

        if self.audio_ref.is_none() {
            if let Some(recording) = &self.recording {
                let audio_ref = self.upload(recording).await?;
                self.audio_ref = Some(audio_ref);
            }
        }

        let outcome = match &self.transcription {
            Some(outcome) => outcome.clone(),
            None => {
                let outcome = self.transcribe().await;
                self.transcription = Some(outcome.clone());
                outcome
            }
        };

        let merged = merge_content(&self.draft, &outcome);
        let mut new_message =
            NewMessage::participant_answer(self.user.id.as_str(), merged.content.as_str())
                .with_transcription(merged.status, merged.confidence);
        if let (Some(recording), Some(audio_ref)) = (&self.recording, &self.audio_ref) {
            new_message = new_message.with_audio(
                audio_ref.clone(),
                recording.duration_seconds,
                recording.size_bytes(),
            );
        }

        let message = self
            .services
            .storage
            .append_message(&conversation.id, new_message)
            .await?;

        // The answer is stored; nothing below may fail the submission.
        if let TranscriptionOutcome::Completed(transcript) = &outcome {
            self.forward_training(transcript);
        }
        let follow_up = self.follow_up(&conversation.id, &merged.spoken_text).await;

        Ok(SubmissionOutcome {
            conversation_id: conversation.id,
            message,
            ai_question: follow_up.question,
            gate: follow_up.gate,
            transcription: merged.status,
            conversation_completed: follow_up.completed,
        })
    }

    async fn transcribe(&self) -> TranscriptionOutcome {
        let (Some(recording), Some(transcriber)) = (&self.recording, &self.services.transcriber)
        else {
            return TranscriptionOutcome::NotAttempted;
        };
        let result = with_timeout(
            "transcription",
            self.settings.timeouts.transcription,
            transcriber.transcribe(recording),
        )
        .await;
        match result {
            Ok(transcript) => TranscriptionOutcome::Completed(transcript),
            Err(e) => {
                warn!(ember_id = %self.ember_id, error = %e, "transcription failed, storing audio only");
                TranscriptionOutcome::Failed
            }
        }
    }

    async fn upload(&self, recording: &AudioBuffer) -> Result<String, CircleError> {
        with_timeout(
            "upload",
            self.settings.timeouts.upload,
            self.services.blobs.put(recording.bytes.clone(), &recording.mime_type),
        )
        .await
        .map_err(|e| match e {
            CircleError::Timeout { duration } => CircleError::Upload {
                message: format!("upload timed out after {duration:?}"),
                kind: FailureKind::Timeout,
            },
            other => other,
        })
    }

    fn forward_training(&self, transcript: &Transcript) {
        let (Some(sink), Some(recording)) = (&self.services.training, &self.recording) else {
            return;
        };
        forward_training(
            Arc::clone(sink),
            TrainingSample {
                user_id: self.user.id.clone(),
                transcript: transcript.text.clone(),
                audio_ref: self.audio_ref.clone(),
                duration_seconds: recording.duration_seconds,
                confidence: transcript.confidence,
            },
        );
    }

    async fn follow_up(&self, conversation_id: &str, comment: &str) -> FollowUp {
        let history = match self.services.storage.get_messages(conversation_id, None).await {
            Ok(history) => history,
            Err(e) => {
                warn!(conversation_id, error = %e, "could not read history, skipping question");
                return FollowUp::default();
            }
        };

        let mut completed = false;
        if count_ai_questions(&history) >= self.settings.gate.max_questions_per_conversation {
            match self.services.storage.complete_conversation(conversation_id).await {
                Ok(()) => {
                    info!(conversation_id, "question limit reached, conversation completed");
                    completed = true;
                }
                Err(e) => warn!(conversation_id, error = %e, "failed to complete conversation"),
            }
        }

        let decision = should_generate(&history, comment, &self.settings.gate, Utc::now());
        debug!(conversation_id, reason = %decision.reason, "question gate evaluated");
        if !decision.approved {
            return FollowUp {
                gate: Some(decision),
                question: None,
                completed,
            };
        }

        FollowUp {
            gate: Some(decision),
            question: self.ask(conversation_id, &history, comment).await,
            completed,
        }
    }

    async fn ember_context(&self) -> EmberContext {
        match self.services.context.context(&self.ember_id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(ember_id = %self.ember_id, error = %e, "ember context unavailable");
                EmberContext {
                    ember_id: self.ember_id.clone(),
                    ..Default::default()
                }
            }
        }
    }

    /// Generates and stores one AI question. `None` if it could not be stored.
    async fn ask(&self, conversation_id: &str, history: &[Message], comment: &str) -> Option<Message> {
        let text = self.compose_question(history, comment).await;
        match self
            .services
            .storage
            .append_message(conversation_id, NewMessage::ai_question(text))
            .await
        {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(conversation_id, error = %e, "failed to store AI question");
                None
            }
        }
    }

    /// Question text for the next turn. Falls back to a canned question.
    async fn compose_question(&self, history: &[Message], comment: &str) -> String {
        let context = self.ember_context().await;
        let circle = match self
            .services
            .storage
            .read_all_messages_for_ember(&self.ember_id, self.settings.conversation_type)
            .await
        {
            Ok(circle) => circle,
            Err(e) => {
                warn!(ember_id = %self.ember_id, error = %e, "circle read failed, analyzing own history");
                history.to_vec()
            }
        };
        let five_ws = analyze(&context, &circle);
        self.generator
            .generate(&context, &five_ws, history, comment)
            .await
            .text
    }
}
