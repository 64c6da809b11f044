// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Story Circle engine.
//!
//! This crate provides the error taxonomy, the domain model (conversations,
//! messages, audio buffers, ember context) and the adapter traits every
//! external collaborator implements.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{CaptureError, CircleError, FailureKind};
pub use types::{
    AdapterType, AudioBuffer, AuthoredMessage, ClearSummary, Conversation, ConversationType,
    EmberContext, EmberLocation, HealthStatus, Message, MessageType, NewMessage, Sender,
    TrainingSample, Transcript, TranscriptionStatus, UserProfile, VOICE_PLACEHOLDER, VoiceProfile,
};

pub use traits::{
    BlobStore, EmberContextSource, IdentityAdapter, PluginAdapter, ProviderAdapter,
    StorageAdapter, SynthesisAdapter, TrainingSink, TranscriptionAdapter,
};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::Utc;

    use super::*;

    #[test]
    fn adapter_type_round_trips_through_display() {
        let variants = [
            AdapterType::Storage,
            AdapterType::Blob,
            AdapterType::Transcription,
            AdapterType::Synthesis,
            AdapterType::Provider,
            AdapterType::Identity,
            AdapterType::EmberContext,
            AdapterType::Training,
        ];
        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn wire_names_are_snake_case() {
        assert_eq!(MessageType::AiQuestion.to_string(), "ai_question");
        assert_eq!(Sender::Participant.to_string(), "participant");
        assert_eq!(TranscriptionStatus::None.to_string(), "none");
        assert_eq!(ConversationType::from_str("story").unwrap(), ConversationType::Story);

        let json = serde_json::to_string(&MessageType::AiQuestion).unwrap();
        assert_eq!(json, "\"ai_question\"");
    }

    #[test]
    fn ai_question_detection_accepts_both_spellings() {
        let mut msg = Message {
            id: "m1".into(),
            conversation_id: "c1".into(),
            sequence_number: 1,
            sender: Sender::Ai,
            message_type: MessageType::Question,
            content: "Who took this photo?".into(),
            author_user_id: None,
            has_audio: false,
            audio_ref: None,
            audio_duration_seconds: None,
            audio_size_bytes: None,
            transcription_status: TranscriptionStatus::None,
            transcription_confidence: None,
            created_at: Utc::now(),
        };
        assert!(msg.is_ai_question());
        msg.message_type = MessageType::AiQuestion;
        assert!(msg.is_ai_question());
        msg.sender = Sender::Participant;
        assert!(!msg.is_ai_question());
    }

    #[test]
    fn new_message_builders() {
        let answer = NewMessage::participant_answer("u1", "We went to the park")
            .with_audio("blob:1".into(), 2.5, 4096)
            .with_transcription(TranscriptionStatus::Completed, Some(0.9));
        assert_eq!(answer.sender, Sender::Participant);
        assert_eq!(answer.author_user_id.as_deref(), Some("u1"));
        assert!(answer.has_audio);
        assert_eq!(answer.audio_size_bytes, Some(4096));

        let question = NewMessage::ai_question("Where was this?");
        assert_eq!(question.author_user_id, None);
        assert_eq!(question.message_type, MessageType::AiQuestion);
    }

    #[test]
    fn voice_profile_readiness() {
        let ready = VoiceProfile {
            user_id: "u1".into(),
            external_voice_id: Some("voice-1".into()),
        };
        let blank = VoiceProfile {
            user_id: "u2".into(),
            external_voice_id: Some("  ".into()),
        };
        assert_eq!(ready.ready_voice_id(), Some("voice-1"));
        assert_eq!(blank.ready_voice_id(), None);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_blob_store<T: BlobStore>() {}
        fn _assert_transcription<T: TranscriptionAdapter>() {}
        fn _assert_synthesis<T: SynthesisAdapter>() {}
        fn _assert_provider<T: ProviderAdapter>() {}
        fn _assert_identity<T: IdentityAdapter>() {}
        fn _assert_training<T: TrainingSink>() {}
        fn _assert_context<T: EmberContextSource>() {}
    }
}
