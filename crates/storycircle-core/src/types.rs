// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Story Circle engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Placeholder content stored when a voice answer has no usable transcript.
pub const VOICE_PLACEHOLDER: &str = "[Voice Response]";

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Blob,
    Transcription,
    Synthesis,
    Provider,
    Identity,
    EmberContext,
    Training,
}

/// The kind of conversation a participant holds about an ember.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    /// The Story Circle question-and-answer conversation.
    Story,
    /// Free-form commentary outside the guided circle.
    General,
}

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Ai,
    Participant,
}

/// What role a message plays in the conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Question,
    Answer,
    AiQuestion,
}

/// Outcome of speech-to-text for a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionStatus {
    /// No audio was attached, or transcription was not attempted.
    None,
    Completed,
    Failed,
}

/// One participant's conversation about one ember.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub ember_id: String,
    pub owner_user_id: String,
    pub conversation_type: ConversationType,
    pub title: String,
    pub is_completed: bool,
    /// Denormalized count of messages currently in the conversation.
    pub message_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted message. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    /// Assigned by the store; strictly increasing within a conversation.
    pub sequence_number: i64,
    pub sender: Sender,
    pub message_type: MessageType,
    pub content: String,
    /// `None` for AI-authored messages.
    pub author_user_id: Option<String>,
    pub has_audio: bool,
    pub audio_ref: Option<String>,
    pub audio_duration_seconds: Option<f64>,
    pub audio_size_bytes: Option<i64>,
    pub transcription_status: TranscriptionStatus,
    pub transcription_confidence: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// True for questions asked by the AI, in either message type spelling.
    pub fn is_ai_question(&self) -> bool {
        self.sender == Sender::Ai
            && matches!(
                self.message_type,
                MessageType::Question | MessageType::AiQuestion
            )
    }
}

/// A message as submitted to the store, before id, sequence number and
/// timestamp are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub sender: Sender,
    pub message_type: MessageType,
    pub content: String,
    pub author_user_id: Option<String>,
    pub has_audio: bool,
    pub audio_ref: Option<String>,
    pub audio_duration_seconds: Option<f64>,
    pub audio_size_bytes: Option<i64>,
    pub transcription_status: TranscriptionStatus,
    pub transcription_confidence: Option<f32>,
}

impl NewMessage {
    /// A participant's typed or spoken answer.
    pub fn participant_answer(user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Participant,
            message_type: MessageType::Answer,
            content: content.into(),
            author_user_id: Some(user_id.into()),
            has_audio: false,
            audio_ref: None,
            audio_duration_seconds: None,
            audio_size_bytes: None,
            transcription_status: TranscriptionStatus::None,
            transcription_confidence: None,
        }
    }

    /// A question generated by the AI.
    pub fn ai_question(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Ai,
            message_type: MessageType::AiQuestion,
            content: content.into(),
            author_user_id: None,
            has_audio: false,
            audio_ref: None,
            audio_duration_seconds: None,
            audio_size_bytes: None,
            transcription_status: TranscriptionStatus::None,
            transcription_confidence: None,
        }
    }

    /// Attaches an uploaded audio artifact.
    pub fn with_audio(mut self, audio_ref: String, duration_seconds: f64, size_bytes: i64) -> Self {
        self.has_audio = true;
        self.audio_ref = Some(audio_ref);
        self.audio_duration_seconds = Some(duration_seconds);
        self.audio_size_bytes = Some(size_bytes);
        self
    }

    /// Records the transcription outcome for the attached audio.
    pub fn with_transcription(
        mut self,
        status: TranscriptionStatus,
        confidence: Option<f32>,
    ) -> Self {
        self.transcription_status = status;
        self.transcription_confidence = confidence;
        self
    }
}

/// Counts returned by a bulk clear of an ember's circle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearSummary {
    pub deleted_conversations: u64,
    pub deleted_messages: u64,
}

/// Display data for a user, owned by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

/// A participant's reference to an externally trained voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub user_id: String,
    pub external_voice_id: Option<String>,
}

impl VoiceProfile {
    /// The voice id, if synthesis can be requested for this participant.
    pub fn ready_voice_id(&self) -> Option<&str> {
        self.external_voice_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

/// A message with its author's display data resolved at read time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthoredMessage {
    pub message: Message,
    /// `None` for AI messages or when the identity collaborator has no profile.
    pub author: Option<UserProfile>,
}

/// A finished audio recording or synthesized clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub duration_seconds: f64,
}

impl AudioBuffer {
    pub fn size_bytes(&self) -> i64 {
        self.bytes.len() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Text recognized from an audio buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    /// Service-reported confidence in 0..=1, when available.
    pub confidence: Option<f32>,
}

/// A transcript forwarded for later voice-profile construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub user_id: String,
    pub transcript: String,
    pub audio_ref: Option<String>,
    pub duration_seconds: f64,
    pub confidence: Option<f32>,
}

/// Location fields attached to an ember by its metadata collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmberLocation {
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Aggregate, read-only view of an ember's metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmberContext {
    pub ember_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Names of people tagged in the media.
    pub tagged_people: Vec<String>,
    pub location: Option<EmberLocation>,
    /// Capture timestamp from the media itself (e.g. EXIF).
    pub captured_at: Option<DateTime<Utc>>,
    /// A user-entered, possibly partial date ("summer 1998").
    pub manual_date: Option<String>,
}

// --- Completion provider types ---

/// Expected shape of the completion output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// A single turn in a provider request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
}

/// A request to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<ProviderMessage>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
}

/// Token usage reported by the completion service. Observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A response from the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: TokenUsage,
}
