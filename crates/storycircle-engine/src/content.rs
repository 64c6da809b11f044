// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging typed text and transcription into stored message content.

use storycircle_core::{Transcript, TranscriptionStatus, VOICE_PLACEHOLDER};

/// Label that separates typed text from an appended transcript.
pub const TRANSCRIPT_LABEL: &str = "[Voice transcript]:";

/// What happened to the recording, if there was one.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptionOutcome {
    /// No recording, or transcription is disabled.
    NotAttempted,
    Completed(Transcript),
    Failed,
}

/// Content and transcription fields for a participant answer.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedContent {
    /// Never empty.
    pub content: String,
    pub status: TranscriptionStatus,
    pub confidence: Option<f32>,
    /// Text written or spoken by the participant, without placeholders.
    pub spoken_text: String,
}

/// Typed text comes first; a transcript is appended after a blank line.
/// Audio without any usable text is stored as [`VOICE_PLACEHOLDER`].
pub fn merge_content(typed: &str, outcome: &TranscriptionOutcome) -> MergedContent {
    let typed = typed.trim();
    let (status, confidence, transcript) = match outcome {
        TranscriptionOutcome::NotAttempted => (TranscriptionStatus::None, None, None),
        TranscriptionOutcome::Completed(t) => {
            (TranscriptionStatus::Completed, t.confidence, Some(t.text.trim()))
        }
        TranscriptionOutcome::Failed => (TranscriptionStatus::Failed, None, None),
    };

    let spoken_text = match transcript {
        Some(t) if !typed.is_empty() => format!("{typed}\n\n{TRANSCRIPT_LABEL} {t}"),
        Some(t) => t.to_string(),
        None => typed.to_string(),
    };
    let content = if spoken_text.is_empty() {
        VOICE_PLACEHOLDER.to_string()
    } else {
        spoken_text.clone()
    };

    MergedContent {
        content,
        status,
        confidence,
        spoken_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(text: &str) -> TranscriptionOutcome {
        TranscriptionOutcome::Completed(Transcript {
            text: text.into(),
            confidence: Some(0.9),
        })
    }

    #[test]
    fn typed_only() {
        let m = merge_content("We went to the park", &TranscriptionOutcome::NotAttempted);
        assert_eq!(m.content, "We went to the park");
        assert_eq!(m.status, TranscriptionStatus::None);
    }

    #[test]
    fn transcript_only() {
        let m = merge_content("", &transcript("it was raining"));
        assert_eq!(m.content, "it was raining");
        assert_eq!(m.status, TranscriptionStatus::Completed);
        assert_eq!(m.confidence, Some(0.9));
    }

    #[test]
    fn typed_and_transcript() {
        let m = merge_content("Look at this", &transcript("it was raining"));
        assert_eq!(m.content, "Look at this\n\n[Voice transcript]: it was raining");
    }

    #[test]
    fn failed_audio_only_gets_placeholder() {
        let m = merge_content("  ", &TranscriptionOutcome::Failed);
        assert_eq!(m.content, VOICE_PLACEHOLDER);
        assert_eq!(m.status, TranscriptionStatus::Failed);
        assert!(m.spoken_text.is_empty());
    }

    #[test]
    fn failed_with_typed_text_keeps_text() {
        let m = merge_content("typed", &TranscriptionOutcome::Failed);
        assert_eq!(m.content, "typed");
        assert_eq!(m.status, TranscriptionStatus::Failed);
    }
}
