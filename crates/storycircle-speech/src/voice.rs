// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice readiness and synthesized playback of participant messages.

use std::sync::Arc;
use std::time::Duration;

use storycircle_core::{
    AudioBuffer, CircleError, FailureKind, IdentityAdapter, Message, Sender, SynthesisAdapter,
};
use tracing::{debug, warn};

use crate::playback::{PlaybackKind, PlaybackSlot, PlaybackTicket};

/// State of the "play in voice" control for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackControl {
    /// Playback started under this ticket.
    Playing(PlaybackTicket),
    /// The control must be rendered disabled.
    Disabled { reason: &'static str },
}

impl PlaybackControl {
    pub fn is_enabled(&self) -> bool {
        matches!(self, PlaybackControl::Playing(_))
    }
}

/// Looks up trained voices and renders message text through them.
pub struct VoiceSynthesis {
    synthesizer: Arc<dyn SynthesisAdapter>,
    identity: Arc<dyn IdentityAdapter>,
    timeout: Duration,
}

impl VoiceSynthesis {
    /// `timeout` bounds each synthesis call; take it from the session's
    /// network profile.
    pub fn new(
        synthesizer: Arc<dyn SynthesisAdapter>,
        identity: Arc<dyn IdentityAdapter>,
        timeout: Duration,
    ) -> Self {
        Self {
            synthesizer,
            identity,
            timeout,
        }
    }

    async fn voice_id(&self, user_id: &str) -> Option<String> {
        match self.identity.voice_profile(user_id).await {
            Ok(profile) => profile.and_then(|p| p.ready_voice_id().map(str::to_string)),
            Err(e) => {
                warn!(user_id, error = %e, "voice profile lookup failed");
                None
            }
        }
    }

    /// Whether synthesis can be requested for `user_id`.
    pub async fn has_trained_voice(&self, user_id: &str) -> bool {
        self.voice_id(user_id).await.is_some()
    }

    /// Synthesizes `text` in the user's voice.
    ///
    /// Fails without calling the service when the user has no trained voice,
    /// and with a [`FailureKind::Timeout`] synthesis error when the call
    /// outlives the configured timeout.
    pub async fn synthesize_for(&self, user_id: &str, text: &str) -> Result<AudioBuffer, CircleError> {
        let Some(voice_id) = self.voice_id(user_id).await else {
            return Err(CircleError::Synthesis {
                message: format!("user {user_id} has no trained voice"),
                kind: FailureKind::Rejected,
                source: None,
            });
        };
        let call = self.synthesizer.synthesize(text, &voice_id);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(user_id, timeout = ?self.timeout, "synthesis timed out");
                Err(CircleError::Synthesis {
                    message: format!("synthesis timed out after {:?}", self.timeout),
                    kind: FailureKind::Timeout,
                    source: None,
                })
            }
        }
    }

    /// Plays a participant message in its author's voice through `slot`.
    ///
    /// Any failure disables the control instead of surfacing an error.
    pub async fn play_message(&self, message: &Message, slot: &PlaybackSlot) -> PlaybackControl {
        let author = match (&message.sender, &message.author_user_id) {
            (Sender::Participant, Some(author)) => author.as_str(),
            _ => return PlaybackControl::Disabled { reason: "no trained voice" },
        };
        if !self.has_trained_voice(author).await {
            return PlaybackControl::Disabled { reason: "no trained voice" };
        }

        match self.synthesize_for(author, &message.content).await {
            Ok(audio) => {
                let (ticket, _) =
                    slot.start(PlaybackKind::Synthesized, audio, Some(message.id.clone()));
                debug!(message_id = %message.id, "synthesized playback started");
                PlaybackControl::Playing(ticket)
            }
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "synthesis failed, disabling playback");
                PlaybackControl::Disabled { reason: "synthesis failed" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use storycircle_core::{
        AdapterType, HealthStatus, MessageType, PluginAdapter, TranscriptionStatus, UserProfile,
        VoiceProfile,
    };

    use super::*;

    struct Synth {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    #[async_trait]
    impl PluginAdapter for Synth {
        fn name(&self) -> &str {
            "synth"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
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
    impl SynthesisAdapter for Synth {
        async fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<AudioBuffer, CircleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(CircleError::Synthesis {
                    message: "boom".into(),
                    kind: FailureKind::Network,
                    source: None,
                });
            }
            Ok(AudioBuffer {
                bytes: vec![1; 8],
                mime_type: "audio/mpeg".into(),
                duration_seconds: 0.5,
            })
        }
    }

    struct Identity;

    #[async_trait]
    impl PluginAdapter for Identity {
        fn name(&self) -> &str {
            "identity"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Identity
        }
        async fn health_check(&self) -> Result<HealthStatus, CircleError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), CircleError> {
            Ok(())
        }
    }

    #[async_trait]
    impl IdentityAdapter for Identity {
        async fn current_user(&self) -> Result<UserProfile, CircleError> {
            Ok(UserProfile {
                id: "alice".into(),
                display_name: "Alice".into(),
                avatar_ref: None,
            })
        }
        async fn profile(&self, _user_id: &str) -> Result<Option<UserProfile>, CircleError> {
            Ok(None)
        }
        async fn voice_profile(&self, user_id: &str) -> Result<Option<VoiceProfile>, CircleError> {
            Ok(match user_id {
                "alice" => Some(VoiceProfile {
                    user_id: "alice".into(),
                    external_voice_id: Some("voice-alice".into()),
                }),
                "bob" => Some(VoiceProfile {
                    user_id: "bob".into(),
                    external_voice_id: Some("  ".into()),
                }),
                _ => None,
            })
        }
    }

    const LIMIT: Duration = Duration::from_secs(20);

    fn voice_with(fail: bool, delay: Duration) -> (VoiceSynthesis, Arc<Synth>) {
        let synth = Arc::new(Synth {
            calls: AtomicUsize::new(0),
            fail,
            delay,
        });
        (VoiceSynthesis::new(synth.clone(), Arc::new(Identity), LIMIT), synth)
    }

    fn voice(fail: bool) -> (VoiceSynthesis, Arc<Synth>) {
        voice_with(fail, Duration::ZERO)
    }

    fn answer(author: &str) -> Message {
        Message {
            id: format!("msg-{author}"),
            conversation_id: "c1".into(),
            sequence_number: 1,
            sender: Sender::Participant,
            message_type: MessageType::Answer,
            content: "We went to the park".into(),
            author_user_id: Some(author.into()),
            has_audio: false,
            audio_ref: None,
            audio_duration_seconds: None,
            audio_size_bytes: None,
            transcription_status: TranscriptionStatus::None,
            transcription_confidence: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn readiness_requires_a_non_blank_voice_id() {
        let (voice, _) = voice(false);
        assert!(voice.has_trained_voice("alice").await);
        assert!(!voice.has_trained_voice("bob").await);
        assert!(!voice.has_trained_voice("carol").await);
    }

    #[tokio::test]
    async fn no_voice_disables_without_calling_service() {
        let (voice, synth) = voice(false);
        let slot = PlaybackSlot::new();
        let control = voice.play_message(&answer("bob"), &slot).await;
        assert!(!control.is_enabled());
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
        assert!(!slot.is_playing());
    }

    #[tokio::test]
    async fn ready_voice_takes_the_slot() {
        let (voice, _) = voice(false);
        let slot = PlaybackSlot::new();
        let control = voice.play_message(&answer("alice"), &slot).await;
        assert!(control.is_enabled());
        assert_eq!(
            slot.current(),
            Some((PlaybackKind::Synthesized, Some("msg-alice".to_string())))
        );
    }

    #[tokio::test]
    async fn synthesis_failure_disables_control() {
        let (voice, synth) = voice(true);
        let slot = PlaybackSlot::new();
        let control = voice.play_message(&answer("alice"), &slot).await;
        assert_eq!(control, PlaybackControl::Disabled { reason: "synthesis failed" });
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_synthesis_times_out() {
        let (voice, synth) = voice_with(false, Duration::from_secs(3600));
        let started = tokio::time::Instant::now();

        let err = voice
            .synthesize_for("alice", "We went to the park")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CircleError::Synthesis {
                kind: FailureKind::Timeout,
                ..
            }
        ));
        assert!(err.is_retryable());
        assert!(started.elapsed() >= LIMIT);
        assert!(started.elapsed() < Duration::from_secs(3600));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_synthesis_disables_control() {
        let (voice, _) = voice_with(false, Duration::from_secs(3600));
        let slot = PlaybackSlot::new();
        let control = voice.play_message(&answer("alice"), &slot).await;
        assert_eq!(control, PlaybackControl::Disabled { reason: "synthesis failed" });
        assert!(!slot.is_playing());
    }
}
