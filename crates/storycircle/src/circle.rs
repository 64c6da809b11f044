// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring from configuration to a running circle, and the CLI commands
//! that drive it.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tracing::{info, warn};

use storycircle_anthropic::AnthropicProvider;
use storycircle_capture::CaptureBackend;
use storycircle_config::CircleConfig;
use storycircle_core::{
    AuthoredMessage, CircleError, Message, PluginAdapter, ProviderAdapter, Sender,
    StorageAdapter, TranscriptionAdapter,
};
use storycircle_engine::{
    CircleReader, CircleServices, Moderator, OrchestratorSettings, SubmissionOrchestrator,
    capture_device_from_config, service_encodings,
};
use storycircle_speech::HttpTranscriber;
use storycircle_storage::SqliteStorage;

use crate::local::{LocalContext, LocalIdentity, OfflineProvider};

/// Everything a command needs, built once from configuration.
pub struct Circle {
    config: CircleConfig,
    storage: Arc<SqliteStorage>,
    services: CircleServices,
    settings: OrchestratorSettings,
    provider_adapter: Arc<dyn PluginAdapter>,
    transcriber_adapter: Option<Arc<dyn PluginAdapter>>,
}

impl Circle {
    /// Opens the store and resolves the optional collaborators.
    ///
    /// A missing completion key degrades to canned questions and a missing
    /// transcription key disables transcription; neither is fatal.
    pub async fn open(config: CircleConfig, user: Option<String>) -> Result<Self, CircleError> {
        let settings = OrchestratorSettings::from_config(&config)?;

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let (provider, provider_adapter): (Arc<dyn ProviderAdapter>, Arc<dyn PluginAdapter>) =
            match AnthropicProvider::new(&config.anthropic) {
                Ok(p) => {
                    let p = Arc::new(p);
                    (p.clone() as Arc<dyn ProviderAdapter>, p as Arc<dyn PluginAdapter>)
                }
                Err(e) => {
                    warn!(error = %e, "completion service unavailable, using fallback questions");
                    let p = Arc::new(OfflineProvider::new(e.to_string()));
                    (p.clone() as Arc<dyn ProviderAdapter>, p as Arc<dyn PluginAdapter>)
                }
            };

        let mut transcriber: Option<Arc<dyn TranscriptionAdapter>> = None;
        let mut transcriber_adapter: Option<Arc<dyn PluginAdapter>> = None;
        if config.transcription.enabled {
            match HttpTranscriber::new(&config.transcription) {
                Ok(t) => {
                    let t = Arc::new(t);
                    transcriber = Some(t.clone() as Arc<dyn TranscriptionAdapter>);
                    transcriber_adapter = Some(t as Arc<dyn PluginAdapter>);
                }
                Err(e) => warn!(error = %e, "transcription disabled"),
            }
        }

        let services = CircleServices {
            storage: storage.clone(),
            blobs: storage.clone(),
            transcriber,
            training: Some(storage.clone()),
            provider,
            identity: Arc::new(LocalIdentity::new(user)),
            context: Arc::new(LocalContext),
        };

        Ok(Self {
            config,
            storage,
            services,
            settings,
            provider_adapter,
            transcriber_adapter,
        })
    }

    /// Shuts adapters down in reverse registration order, storage last.
    ///
    /// Every adapter gets its turn; the first failure is returned.
    pub async fn close(&self) -> Result<(), CircleError> {
        let mut first_error = None;
        for adapter in self.adapters().iter().rev() {
            if let Err(e) = adapter.shutdown().await {
                warn!(adapter = adapter.name(), error = %e, "shutdown failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn session(
        &self,
        ember_id: &str,
        backend: Arc<dyn CaptureBackend>,
    ) -> Result<SubmissionOrchestrator, CircleError> {
        let capture = capture_device_from_config(
            &self.config.capture,
            backend,
            service_encodings(self.services.transcriber.as_ref()),
        )?;
        SubmissionOrchestrator::for_current_user(
            self.services.clone(),
            self.settings.clone(),
            capture,
            ember_id,
        )
        .await
    }

    /// Prints every participant's messages for an ember.
    pub async fn messages(&self, ember_id: &str) -> Result<(), CircleError> {
        let reader = CircleReader::new(self.storage.clone(), self.services.identity.clone());
        let circle = reader
            .read_circle(ember_id, self.settings.conversation_type)
            .await?;
        if circle.is_empty() {
            println!("no messages for ember {ember_id}");
        }
        for authored in &circle {
            println!("{}", format_authored(authored));
        }
        Ok(())
    }

    /// Opens the user's circle, asking the opening question if it is empty.
    pub async fn open_circle(&self, ember_id: &str) -> Result<(), CircleError> {
        let session = self.session(ember_id, default_backend(0.0)).await?;
        let opened = session.open_circle().await?;
        println!(
            "conversation {} ({} messages)",
            opened.conversation.id,
            opened.messages.len()
        );
        for message in &opened.messages {
            println!("{}", format_message(message, None));
        }
        Ok(())
    }

    /// Submits typed text and/or a recording of `record_secs` seconds.
    pub async fn submit(
        &self,
        ember_id: &str,
        text: Option<String>,
        record_secs: Option<f64>,
    ) -> Result<(), CircleError> {
        let seconds = record_secs.unwrap_or(0.0);
        let mut session = self.session(ember_id, default_backend(seconds)).await?;

        if let Some(text) = text {
            session.set_draft(text)?;
        }
        if record_secs.is_some() {
            session.start_recording()?;
            eprintln!("recording for {seconds:.1}s...");
            tokio::time::sleep(Duration::from_secs_f64(seconds.max(0.0))).await;
            session.stop_recording()?;
        }

        let outcome = session.submit().await?;
        println!("{}", format_message(&outcome.message, None));
        if outcome.transcription != storycircle_core::TranscriptionStatus::None {
            println!("  transcription: {}", outcome.transcription);
        }
        if let Some(question) = &outcome.ai_question {
            println!("{}", format_message(question, None));
        } else if let Some(gate) = &outcome.gate {
            info!(reason = %gate.reason, "no follow-up question");
        }
        if outcome.conversation_completed {
            println!("conversation {} completed", outcome.conversation_id);
        }
        Ok(())
    }

    pub async fn register(&self, ember_id: &str, owner_id: &str) -> Result<(), CircleError> {
        self.storage.register_ember(ember_id, owner_id).await?;
        println!("ember {ember_id} owned by {owner_id}");
        Ok(())
    }

    /// Deletes one message. Without `confirmed` only describes the action.
    pub async fn delete(
        &self,
        ember_id: &str,
        message_id: &str,
        requester_id: &str,
        confirmed: bool,
    ) -> Result<(), CircleError> {
        let pending = Moderator::new(self.storage.clone()).request_delete(
            ember_id,
            message_id,
            requester_id,
        );
        if !confirmed {
            println!("{}", pending.describe());
            println!("re-run with --yes to confirm");
            return Ok(());
        }
        if pending.confirm().await? {
            println!("deleted message {message_id}");
        } else {
            println!("message {message_id} not found");
        }
        Ok(())
    }

    /// Clears every conversation on an ember. Without `confirmed` only
    /// describes the action.
    pub async fn clear(
        &self,
        ember_id: &str,
        requester_id: &str,
        confirmed: bool,
    ) -> Result<(), CircleError> {
        let pending = Moderator::new(self.storage.clone()).request_clear(ember_id, requester_id);
        if !confirmed {
            println!("{}", pending.describe());
            println!("re-run with --yes to confirm");
            return Ok(());
        }
        let summary = pending.confirm().await?;
        println!(
            "removed {} conversations and {} messages",
            summary.deleted_conversations, summary.deleted_messages
        );
        Ok(())
    }

    /// Adapters reported by `storycircle health`.
    pub fn adapters(&self) -> Vec<Arc<dyn PluginAdapter>> {
        let storage: Arc<dyn PluginAdapter> = self.storage.clone();
        let mut adapters = vec![storage, self.provider_adapter.clone()];
        if let Some(t) = &self.transcriber_adapter {
            adapters.push(t.clone());
        }
        adapters
    }
}

#[cfg(feature = "cpal")]
fn default_backend(_clip_seconds: f64) -> Arc<dyn CaptureBackend> {
    Arc::new(storycircle_capture::CpalBackend::new())
}

#[cfg(not(feature = "cpal"))]
fn default_backend(clip_seconds: f64) -> Arc<dyn CaptureBackend> {
    Arc::new(storycircle_capture::VirtualBackend::new().with_clip_seconds(clip_seconds))
}

fn format_message(message: &Message, author: Option<&str>) -> String {
    let who = match (message.sender, author) {
        (Sender::Ai, _) => "Interviewer".to_string(),
        (_, Some(name)) => name.to_string(),
        (_, None) => message
            .author_user_id
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
    };
    let audio = if message.has_audio { " [audio]" } else { "" };
    let line = format!(
        "#{:<3} {} {}{}: {}",
        message.sequence_number,
        message.created_at.format("%Y-%m-%d %H:%M"),
        who,
        audio,
        message.content
    );
    if !std::io::stdout().is_terminal() {
        return line;
    }
    match message.sender {
        Sender::Ai => line.cyan().to_string(),
        _ => line,
    }
}

fn format_authored(authored: &AuthoredMessage) -> String {
    let name = authored.author.as_ref().map(|a| a.display_name.as_str());
    format!(
        "{}  ({})",
        format_message(&authored.message, name),
        authored.message.id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use storycircle_core::{MessageType, TranscriptionStatus};

    fn message(sender: Sender, content: &str) -> Message {
        Message {
            id: "m1".into(),
            conversation_id: "c1".into(),
            sequence_number: 2,
            sender,
            message_type: if sender == Sender::Ai {
                MessageType::AiQuestion
            } else {
                MessageType::Answer
            },
            content: content.into(),
            author_user_id: Some("alice".into()),
            has_audio: false,
            audio_ref: None,
            audio_duration_seconds: None,
            audio_size_bytes: None,
            transcription_status: TranscriptionStatus::None,
            transcription_confidence: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn participant_lines_name_the_author() {
        let line = format_message(&message(Sender::Participant, "We went to the park"), Some("Alice"));
        assert!(line.contains("Alice: We went to the park"));
        assert!(line.starts_with("#2"));
    }

    #[test]
    fn ai_lines_are_attributed_to_the_interviewer() {
        let line = format_message(&message(Sender::Ai, "Where was this taken?"), None);
        assert!(line.contains("Interviewer: Where was this taken?"));
    }

    #[test]
    fn missing_author_falls_back_to_user_id() {
        let line = format_message(&message(Sender::Participant, "hi"), None);
        assert!(line.contains("alice: hi"));
    }
}
