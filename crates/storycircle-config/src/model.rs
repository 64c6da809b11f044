// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Story Circle.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Encoding names accepted in `capture.preferred_encodings`.
pub const KNOWN_ENCODINGS: &[&str] = &["webm_opus", "ogg_opus", "mp4_aac", "mpeg", "wav"];

/// Values accepted for `capture.device_class` and `network.profile`.
pub const KNOWN_DEVICE_CLASSES: &[&str] = &["standard", "constrained"];
pub const KNOWN_NETWORK_PROFILES: &[&str] = &["stable", "constrained"];

/// Top-level Story Circle configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CircleConfig {
    /// Identity and logging settings.
    #[serde(default)]
    pub circle: GeneralConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Anthropic API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Speech-to-text service settings.
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Text-to-speech service settings.
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Follow-up question policy.
    #[serde(default)]
    pub questions: QuestionsConfig,

    /// Audio capture settings.
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Network profile and per-operation timeouts.
    #[serde(default)]
    pub network: NetworkConfig,
}

/// General settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Display name of this deployment.
    #[serde(default = "default_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Conversation type used by the circle ("story" or "general").
    #[serde(default = "default_conversation_type")]
    pub conversation_type: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            conversation_type: default_conversation_type(),
        }
    }
}

fn default_name() -> String {
    "storycircle".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_conversation_type() -> String {
    "story".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("storycircle").join("storycircle.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("storycircle.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` falls back to `ANTHROPIC_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for question generation.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Maximum tokens to generate per question.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Sampling temperature in 0..=1.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            temperature: default_temperature(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

/// Speech-to-text service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptionConfig {
    /// When false, voice answers are stored audio-only with placeholder text.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible transcription API.
    #[serde(default = "default_transcription_endpoint")]
    pub endpoint: String,

    /// API key. `None` falls back to `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier sent with each request.
    #[serde(default = "default_transcription_model")]
    pub model: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_transcription_endpoint(),
            api_key: None,
            model: default_transcription_model(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_transcription_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

/// Text-to-speech service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesisConfig {
    /// Base URL of the synthesis API.
    #[serde(default = "default_synthesis_endpoint")]
    pub endpoint: String,

    /// API key. `None` falls back to `ELEVENLABS_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Synthesis model identifier.
    #[serde(default = "default_synthesis_model")]
    pub model_id: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_synthesis_endpoint(),
            api_key: None,
            model_id: default_synthesis_model(),
        }
    }
}

fn default_synthesis_endpoint() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_synthesis_model() -> String {
    "eleven_multilingual_v2".to_string()
}

/// Follow-up question policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionsConfig {
    /// Minimum length in characters of a comment that may trigger a question.
    #[serde(default = "default_min_comment_length")]
    pub min_comment_length: usize,

    /// Maximum AI questions per conversation.
    #[serde(default = "default_max_questions")]
    pub max_questions_per_conversation: usize,

    /// Minimum seconds between two AI questions in one conversation.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Number of most recent messages included in the generation prompt.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Overrides the built-in system prompt template.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Ask an opening question when a participant's conversation is empty.
    #[serde(default = "default_true")]
    pub open_with_question: bool,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            min_comment_length: default_min_comment_length(),
            max_questions_per_conversation: default_max_questions(),
            cooldown_secs: default_cooldown_secs(),
            history_window: default_history_window(),
            system_prompt: None,
            open_with_question: true,
        }
    }
}

fn default_min_comment_length() -> usize {
    10
}

fn default_max_questions() -> usize {
    3
}

fn default_cooldown_secs() -> u64 {
    300
}

fn default_history_window() -> usize {
    10
}

/// Audio capture configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    /// "standard" (stereo, 48 kHz) or "constrained" (mono, 16 kHz).
    #[serde(default = "default_device_class")]
    pub device_class: String,

    /// Encodings in preference order. See [`KNOWN_ENCODINGS`].
    #[serde(default = "default_preferred_encodings")]
    pub preferred_encodings: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_class: default_device_class(),
            preferred_encodings: default_preferred_encodings(),
        }
    }
}

fn default_device_class() -> String {
    "standard".to_string()
}

fn default_preferred_encodings() -> Vec<String> {
    KNOWN_ENCODINGS.iter().map(|s| s.to_string()).collect()
}

/// Network profile and per-operation timeouts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// "stable" or "constrained". Selects which timeout table applies.
    #[serde(default = "default_network_profile")]
    pub profile: String,

    #[serde(default = "TimeoutConfig::stable")]
    pub stable: TimeoutConfig,

    #[serde(default = "TimeoutConfig::constrained")]
    pub constrained: TimeoutConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            profile: default_network_profile(),
            stable: TimeoutConfig::stable(),
            constrained: TimeoutConfig::constrained(),
        }
    }
}

fn default_network_profile() -> String {
    "stable".to_string()
}

/// Timeouts in seconds for each network-bound operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    pub upload_secs: u64,
    pub transcription_secs: u64,
    pub synthesis_secs: u64,
    pub completion_secs: u64,
}

impl TimeoutConfig {
    pub fn stable() -> Self {
        Self {
            upload_secs: 30,
            transcription_secs: 30,
            synthesis_secs: 20,
            completion_secs: 30,
        }
    }

    pub fn constrained() -> Self {
        Self {
            upload_secs: 90,
            transcription_secs: 90,
            synthesis_secs: 45,
            completion_secs: 60,
        }
    }

    pub(crate) fn entries(&self) -> [(&'static str, u64); 4] {
        [
            ("upload_secs", self.upload_secs),
            ("transcription_secs", self.transcription_secs),
            ("synthesis_secs", self.synthesis_secs),
            ("completion_secs", self.completion_secs),
        ]
    }
}
