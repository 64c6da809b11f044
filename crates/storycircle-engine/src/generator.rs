// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Next-question generation over the completion provider.
//!
//! The prompt carries the ember context, the Five W's statuses and a bounded
//! excerpt of the conversation. Any provider failure, timeout or unusable
//! output yields a canned question aimed at the weakest W, so the
//! conversation can always continue.

use std::sync::Arc;
use std::time::Duration;

use storycircle_config::model::{AnthropicConfig, QuestionsConfig};
use storycircle_core::types::{ProviderMessage, ProviderRequest, ResponseFormat};
use storycircle_core::{EmberContext, Message, ProviderAdapter, Sender};
use tracing::{debug, info, warn};

use crate::fivews::{FiveWs, W};
use crate::timeout::with_timeout;

/// System prompt template. `{{name}}` placeholders are substituted at call time.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a warm, curious interviewer helping a family capture the story behind a shared photo titled \"{{ember_title}}\".
Ask exactly one short follow-up question (under 25 words) that invites the participant to share more.
Focus on the least identified of the Five W's. Current status: {{five_ws}}.
Never repeat a question that was already asked. Reply with the question only.";

/// Asked when nothing better is available.
const GENERIC_FALLBACK: &str = "Is there anything else you remember about this moment?";

/// Canned question for the weakest W, or a generic one.
pub fn fallback_question(weakest: Option<W>) -> &'static str {
    match weakest {
        Some(W::Who) => "Who else was there with you in this moment?",
        Some(W::What) => "What was happening when this was taken?",
        Some(W::Where) => "Where was this taken?",
        Some(W::When) => "When did this happen?",
        Some(W::Why) => "What makes this moment meaningful to you?",
        None => GENERIC_FALLBACK,
    }
}

/// Replaces every `{{key}}` in `template`.
pub fn render_template(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{key}}}}}"), value)
    })
}

/// Cleans raw completion text into a single question.
///
/// Returns `None` when nothing usable remains.
pub fn post_process(raw: &str) -> Option<String> {
    let mut text = raw.trim();
    for prefix in ["Question:", "question:", "Q:"] {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest.trim_start();
        }
    }
    let text = text.trim_matches(|c| matches!(c, '"' | '\'' | '\u{201c}' | '\u{201d}' | '`'));
    let text = text.trim();

    let question = match text.find('?') {
        Some(end) => &text[..=end],
        None => text.lines().next().unwrap_or_default(),
    };
    let question = question.trim();
    if question.is_empty() {
        None
    } else {
        Some(question.to_string())
    }
}

/// Where a generated question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    Provider,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuestion {
    pub text: String,
    pub source: QuestionSource,
}

/// Provider settings and prompt limits.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Most recent messages included in the prompt.
    pub history_window: usize,
    pub system_prompt: String,
    pub timeout: Duration,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::from_config(
            &AnthropicConfig::default(),
            &QuestionsConfig::default(),
            Duration::from_secs(30),
        )
    }
}

impl GeneratorSettings {
    pub fn from_config(
        anthropic: &AnthropicConfig,
        questions: &QuestionsConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            model: anthropic.default_model.clone(),
            max_tokens: anthropic.max_tokens,
            temperature: anthropic.temperature,
            history_window: questions.history_window,
            system_prompt: questions
                .system_prompt
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            timeout,
        }
    }
}

pub struct QuestionGenerator {
    provider: Arc<dyn ProviderAdapter>,
    settings: GeneratorSettings,
}

impl QuestionGenerator {
    pub fn new(provider: Arc<dyn ProviderAdapter>, settings: GeneratorSettings) -> Self {
        Self { provider, settings }
    }

    fn context_section(context: &EmberContext) -> String {
        let mut lines = Vec::new();
        if let Some(title) = context.title.as_deref() {
            lines.push(format!("Title: {title}"));
        }
        if let Some(description) = context.description.as_deref() {
            lines.push(format!("Description: {description}"));
        }
        if !context.tagged_people.is_empty() {
            lines.push(format!("People tagged: {}", context.tagged_people.join(", ")));
        }
        if let Some(loc) = &context.location {
            let place: Vec<&str> = [loc.name.as_deref(), loc.city.as_deref(), loc.country.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !place.is_empty() {
                lines.push(format!("Location: {}", place.join(", ")));
            }
        }
        if let Some(at) = context.captured_at {
            lines.push(format!("Taken: {}", at.format("%B %-d, %Y")));
        } else if let Some(date) = context.manual_date.as_deref() {
            lines.push(format!("Taken: {date}"));
        }
        if lines.is_empty() {
            "No details about this photo are known yet.".to_string()
        } else {
            lines.join("\n")
        }
    }

    fn history_section(&self, history: &[Message]) -> String {
        let start = history.len().saturating_sub(self.settings.history_window);
        let excerpt = &history[start..];
        if excerpt.is_empty() {
            return "The conversation has not started yet.".to_string();
        }
        excerpt
            .iter()
            .map(|m| {
                let speaker = match m.sender {
                    Sender::Ai => "Interviewer",
                    Sender::Participant => "Participant",
                };
                format!("{speaker}: {}", m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Builds the completion request.
    pub fn build_request(
        &self,
        context: &EmberContext,
        five_ws: &FiveWs,
        history: &[Message],
        comment: &str,
    ) -> ProviderRequest {
        let title = context.title.clone().unwrap_or_else(|| "Untitled".to_string());
        let vars = [("ember_title", title), ("five_ws", five_ws.summary())];
        let system_prompt = render_template(&self.settings.system_prompt, &vars);

        let mut user = format!(
            "Photo details:\n{}\n\nConversation so far:\n{}",
            Self::context_section(context),
            self.history_section(history)
        );
        if !comment.trim().is_empty() {
            user.push_str(&format!("\n\nLatest comment:\n{}", comment.trim()));
        }
        user.push_str("\n\nWhat is the single best next question?");

        ProviderRequest {
            model: self.settings.model.clone(),
            system_prompt: Some(system_prompt),
            messages: vec![ProviderMessage {
                role: "user".into(),
                content: user,
            }],
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
            response_format: ResponseFormat::Text,
        }
    }

    /// Produces the next question. Never fails.
    pub async fn generate(
        &self,
        context: &EmberContext,
        five_ws: &FiveWs,
        history: &[Message],
        comment: &str,
    ) -> GeneratedQuestion {
        let fallback = || GeneratedQuestion {
            text: fallback_question(five_ws.weakest()).to_string(),
            source: QuestionSource::Fallback,
        };

        let request = self.build_request(context, five_ws, history, comment);
        let response = with_timeout(
            "completion",
            self.settings.timeout,
            self.provider.complete(request),
        )
        .await;

        match response {
            Ok(response) => {
                info!(
                    ember_id = %context.ember_id,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "question generated"
                );
                match post_process(&response.content) {
                    Some(text) => GeneratedQuestion {
                        text,
                        source: QuestionSource::Provider,
                    },
                    None => {
                        warn!(ember_id = %context.ember_id, "completion returned no usable question");
                        fallback()
                    }
                }
            }
            Err(e) => {
                warn!(ember_id = %context.ember_id, error = %e, "question generation failed, using fallback");
                let q = fallback();
                debug!(question = %q.text, "fallback question selected");
                q
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use storycircle_core::types::{ProviderResponse, TokenUsage};
    use storycircle_core::{
        AdapterType, CircleError, HealthStatus, MessageType, PluginAdapter, TranscriptionStatus,
    };

    use super::*;
    use crate::fivews::{WStatus, analyze};

    struct ScriptedProvider {
        reply: Result<String, String>,
        delay: Duration,
        seen: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.into()),
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("overloaded".into()),
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PluginAdapter for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Provider
        }
        async fn health_check(&self) -> Result<HealthStatus, CircleError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), CircleError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ProviderAdapter for ScriptedProvider {
        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, CircleError> {
            self.seen.lock().unwrap().push(request);
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Ok(text) => Ok(ProviderResponse {
                    id: "r1".into(),
                    content: text.clone(),
                    model: "m".into(),
                    stop_reason: None,
                    usage: TokenUsage {
                        input_tokens: 10,
                        output_tokens: 5,
                    },
                }),
                Err(msg) => Err(CircleError::Provider {
                    message: msg.clone(),
                    source: None,
                }),
            }
        }
    }

    fn msg(sender: Sender, content: &str, seq: i64) -> Message {
        Message {
            id: format!("m{seq}"),
            conversation_id: "c".into(),
            sequence_number: seq,
            sender,
            message_type: match sender {
                Sender::Ai => MessageType::AiQuestion,
                Sender::Participant => MessageType::Answer,
            },
            content: content.into(),
            author_user_id: None,
            has_audio: false,
            audio_ref: None,
            audio_duration_seconds: None,
            audio_size_bytes: None,
            transcription_status: TranscriptionStatus::None,
            transcription_confidence: None,
            created_at: Utc::now(),
        }
    }

    fn ctx() -> EmberContext {
        EmberContext {
            ember_id: "e1".into(),
            title: Some("Picnic".into()),
            ..Default::default()
        }
    }

    #[test]
    fn post_process_cleans_output() {
        assert_eq!(
            post_process("  \"Who took this photo? And when?\"  ").as_deref(),
            Some("Who took this photo?")
        );
        assert_eq!(post_process("Question: Where was this?").as_deref(), Some("Where was this?"));
        assert_eq!(post_process("Tell me more\nabout it").as_deref(), Some("Tell me more"));
        assert_eq!(post_process("  \"\" "), None);
    }

    #[test]
    fn template_substitution() {
        let out = render_template("{{a}} and {{b}} and {{a}}", &[("a", "x".into()), ("b", "y".into())]);
        assert_eq!(out, "x and y and x");
    }

    #[test]
    fn history_is_bounded_to_window() {
        let settings = GeneratorSettings {
            history_window: 2,
            ..GeneratorSettings::default()
        };
        let generator = QuestionGenerator::new(ScriptedProvider::ok("?"), settings);
        let history = [
            msg(Sender::Ai, "first question", 1),
            msg(Sender::Participant, "first answer", 2),
            msg(Sender::Ai, "second question", 3),
        ];
        let req = generator.build_request(&ctx(), &analyze(&ctx(), &history), &history, "more");
        let user = &req.messages[0].content;
        assert!(!user.contains("first question"));
        assert!(user.contains("Participant: first answer"));
        assert!(user.contains("Interviewer: second question"));
        assert!(user.contains("Latest comment:\nmore"));
        let system = req.system_prompt.unwrap();
        assert!(system.contains("\"Picnic\""));
        assert!(system.contains("who: unidentified"));
    }

    #[tokio::test]
    async fn provider_question_is_used() {
        let provider = ScriptedProvider::ok("Who was holding the camera?");
        let generator = QuestionGenerator::new(provider.clone(), GeneratorSettings::default());
        let five_ws = analyze(&ctx(), &[]);
        let q = generator.generate(&ctx(), &five_ws, &[], "We had a picnic").await;
        assert_eq!(q.source, QuestionSource::Provider);
        assert_eq!(q.text, "Who was holding the camera?");
        assert_eq!(provider.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failure_falls_back_to_weakest_w() {
        let generator = QuestionGenerator::new(ScriptedProvider::failing(), GeneratorSettings::default());
        let five_ws = FiveWs {
            who: WStatus::Identified,
            what: WStatus::Identified,
            where_: WStatus::Unidentified,
            when: WStatus::PartiallyIdentified,
            why: WStatus::Identified,
        };
        let q = generator.generate(&ctx(), &five_ws, &[], "comment").await;
        assert_eq!(q.source, QuestionSource::Fallback);
        assert_eq!(q.text, "Where was this taken?");
    }

    #[tokio::test]
    async fn slow_provider_falls_back() {
        let provider = Arc::new(ScriptedProvider {
            reply: Ok("Too late?".into()),
            delay: Duration::from_secs(5),
            seen: Mutex::new(Vec::new()),
        });
        let settings = GeneratorSettings {
            timeout: Duration::from_millis(20),
            ..GeneratorSettings::default()
        };
        let generator = QuestionGenerator::new(provider, settings);
        let q = generator.generate(&ctx(), &analyze(&ctx(), &[]), &[], "comment").await;
        assert_eq!(q.source, QuestionSource::Fallback);
    }

    #[tokio::test]
    async fn empty_output_falls_back() {
        let generator = QuestionGenerator::new(ScriptedProvider::ok("   "), GeneratorSettings::default());
        let q = generator.generate(&ctx(), &analyze(&ctx(), &[]), &[], "comment").await;
        assert_eq!(q.source, QuestionSource::Fallback);
        assert_eq!(q.text, fallback_question(Some(W::Who)));
    }
}
