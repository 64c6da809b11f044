// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Story Circle.
//!
//! [`CircleError`] is the single error type crossing adapter boundaries.
//! Optional enhancements (transcription, synthesis, question generation)
//! surface their own variants so callers can recover locally, while the
//! core write path (storage, authorization) propagates to the caller.

use std::time::Duration;

use thiserror::Error;

/// Failures raised while acquiring or using an audio input device.
///
/// Each variant maps to a different remediation, so they are never
/// collapsed into a generic failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The user or platform refused microphone access.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// No input device is attached, or the requested device disappeared.
    #[error("no audio input device found")]
    NoDeviceFound,

    /// No encoding is supported by both the device and the transcription service.
    #[error("no mutually supported audio encoding (requested: {requested})")]
    UnsupportedEncoding { requested: String },

    /// The device is already held by another capture in this session.
    #[error("audio input device is already in use")]
    DeviceBusy,

    /// The recording finished without any audio data.
    #[error("recording contains no audio")]
    EmptyRecording,

    /// Any other backend-specific failure.
    #[error("audio backend error: {0}")]
    Backend(String),
}

/// Classification of a network-bound failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// Connection reset, DNS failure, 5xx from the service.
    Network,
    /// The operation exceeded its timeout.
    Timeout,
    /// Credentials were missing or rejected.
    Authentication,
    /// Quota or rate limit exhausted.
    Quota,
    /// The service rejected the payload itself (4xx other than auth/quota).
    Rejected,
}

impl FailureKind {
    /// Whether a user re-click can reasonably succeed without changing anything.
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::Network | FailureKind::Timeout)
    }

    /// Classifies an HTTP status code returned by an external service.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => FailureKind::Authentication,
            402 | 429 => FailureKind::Quota,
            408 | 504 => FailureKind::Timeout,
            500..=599 => FailureKind::Network,
            _ => FailureKind::Rejected,
        }
    }
}

/// The primary error type used across all adapter traits and core operations.
#[derive(Debug, Error)]
pub enum CircleError {
    /// Configuration errors (invalid TOML, missing keys, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio capture failures.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Uploading an audio artifact to the blob store failed.
    #[error("upload failed ({kind}): {message}")]
    Upload { message: String, kind: FailureKind },

    /// Speech-to-text failure. Always recovered with placeholder text.
    #[error("transcription error ({kind}): {message}")]
    Transcription {
        message: String,
        kind: FailureKind,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Text-to-speech failure. Recovered by disabling playback.
    #[error("synthesis error ({kind}): {message}")]
    Synthesis {
        message: String,
        kind: FailureKind,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Completion service failure. Recovered with a canned question.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Persistence failure. Fatal to the current submission attempt.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An owner-only operation was attempted by someone else.
    #[error("user {user_id} is not authorized to {action}")]
    Unauthorized { action: String, user_id: String },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An operation was attempted from a state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Requested adapter was not found or is not configured.
    #[error("adapter not found: {adapter_type}/{name}")]
    AdapterNotFound { adapter_type: String, name: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CircleError {
    /// Convenience constructor for storage errors carrying only a message.
    pub fn storage(message: impl Into<String>) -> Self {
        CircleError::Storage {
            source: message.into().into(),
        }
    }

    /// Whether the caller may retry the same action without changing input.
    ///
    /// Network failures, timeouts, and persistence failures are retryable.
    /// Authentication, quota, authorization and validation failures are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            CircleError::Upload { kind, .. }
            | CircleError::Transcription { kind, .. }
            | CircleError::Synthesis { kind, .. } => kind.is_retryable(),
            CircleError::Timeout { .. } | CircleError::Storage { .. } => true,
            CircleError::Provider { .. } => true,
            CircleError::Capture(CaptureError::DeviceBusy) => true,
            _ => false,
        }
    }

    /// Whether this error belongs to the core write path (persistence or authorization).
    pub fn is_write_path(&self) -> bool {
        matches!(
            self,
            CircleError::Storage { .. }
                | CircleError::Unauthorized { .. }
                | CircleError::Upload { .. }
                | CircleError::NotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_classify() {
        assert_eq!(FailureKind::from_status(401), FailureKind::Authentication);
        assert_eq!(FailureKind::from_status(403), FailureKind::Authentication);
        assert_eq!(FailureKind::from_status(429), FailureKind::Quota);
        assert_eq!(FailureKind::from_status(503), FailureKind::Network);
        assert_eq!(FailureKind::from_status(504), FailureKind::Timeout);
        assert_eq!(FailureKind::from_status(422), FailureKind::Rejected);
    }

    #[test]
    fn retryable_classification() {
        let timeout = CircleError::Timeout {
            duration: Duration::from_secs(10),
        };
        assert!(timeout.is_retryable());

        let quota = CircleError::Upload {
            message: "over quota".into(),
            kind: FailureKind::Quota,
        };
        assert!(!quota.is_retryable());
        assert!(quota.is_write_path());

        let network = CircleError::Upload {
            message: "reset".into(),
            kind: FailureKind::Network,
        };
        assert!(network.is_retryable());

        let denied = CircleError::Unauthorized {
            action: "delete message".into(),
            user_id: "u1".into(),
        };
        assert!(!denied.is_retryable());
        assert!(denied.is_write_path());

        assert!(!CircleError::Capture(CaptureError::PermissionDenied).is_retryable());
    }

    #[test]
    fn capture_errors_are_distinct() {
        let denied: CircleError = CaptureError::PermissionDenied.into();
        let missing: CircleError = CaptureError::NoDeviceFound.into();
        assert!(denied.to_string().contains("permission"));
        assert!(missing.to_string().contains("no audio input device"));
        assert_ne!(CaptureError::PermissionDenied, CaptureError::NoDeviceFound);
    }
}
