// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Follow-up question completions backed by the Anthropic Messages API.
//!
//! Only single-shot requests are made; there is no streaming path.

pub mod client;
pub mod types;

use async_trait::async_trait;
use storycircle_config::model::AnthropicConfig;
use storycircle_core::error::CircleError;
use storycircle_core::traits::{PluginAdapter, ProviderAdapter};
use storycircle_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, ResponseFormat, TokenUsage,
};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, ApiUsage, MessageRequest};

const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Appended to the system prompt when a JSON response is requested.
const JSON_INSTRUCTION: &str =
    "Respond with a single JSON object and nothing else. Do not wrap it in code fences.";

/// [`ProviderAdapter`] for Claude models.
pub struct AnthropicProvider {
    client: AnthropicClient,
    /// Used when a request leaves `temperature` unset.
    temperature: f32,
}

impl AnthropicProvider {
    /// Fails with [`CircleError::Config`] when neither `anthropic.api_key`
    /// nor `ANTHROPIC_API_KEY` provides a key.
    pub fn new(config: &AnthropicConfig) -> Result<Self, CircleError> {
        let key = resolve_api_key(&config.api_key)?;
        let client = AnthropicClient::new(key, config.api_version.clone(), config.default_model.clone())?;
        info!(model = %config.default_model, "question provider ready");
        Ok(Self::with_client(client, config.temperature))
    }

    pub fn with_client(client: AnthropicClient, temperature: f32) -> Self {
        Self { client, temperature }
    }

    fn to_message_request(&self, request: &ProviderRequest) -> MessageRequest {
        let model = Some(request.model.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or(self.client.default_model())
            .to_string();

        let system = match request.response_format {
            ResponseFormat::Text => request.system_prompt.clone(),
            ResponseFormat::Json => Some(match &request.system_prompt {
                Some(prompt) => format!("{prompt}\n\n{JSON_INSTRUCTION}"),
                None => JSON_INSTRUCTION.to_string(),
            }),
        };

        let messages = request
            .messages
            .iter()
            .map(|turn| ApiMessage {
                role: turn.role.clone(),
                content: turn.content.clone(),
            })
            .collect();

        let temperature = request.temperature.unwrap_or(self.temperature).clamp(0.0, 1.0);

        MessageRequest {
            model,
            messages,
            system,
            max_tokens: request.max_tokens,
            temperature: Some(temperature),
        }
    }
}

impl From<ApiUsage> for TokenUsage {
    fn from(usage: ApiUsage) -> Self {
        TokenUsage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    /// Always healthy; a probe request would spend tokens.
    async fn health_check(&self) -> Result<HealthStatus, CircleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CircleError> {
        debug!("question provider stopped");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, CircleError> {
        let response = self.client.complete_message(&self.to_message_request(&request)).await?;
        let usage = TokenUsage::from(response.usage);
        info!(
            model = %response.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "question completion usage"
        );

        Ok(ProviderResponse {
            content: response.text(),
            id: response.id,
            model: response.model,
            stop_reason: response.stop_reason,
            usage,
        })
    }
}

/// A non-empty `anthropic.api_key` wins over the environment.
pub fn resolve_api_key(config_key: &Option<String>) -> Result<String, CircleError> {
    match config_key.as_deref() {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => std::env::var(API_KEY_ENV).map_err(|_| {
            CircleError::Config(format!(
                "no API key found: set anthropic.api_key or {API_KEY_ENV}"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storycircle_core::types::ProviderMessage;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> AnthropicProvider {
        let client = AnthropicClient::new("sk-test".into(), "2023-06-01".into(), "claude-haiku-test".into())
            .unwrap()
            .with_base_url(base_url.to_string());
        AnthropicProvider::with_client(client, 0.7)
    }

    fn request(format: ResponseFormat) -> ProviderRequest {
        ProviderRequest {
            model: String::new(),
            system_prompt: Some("You ask warm questions.".into()),
            messages: vec![ProviderMessage {
                role: "user".into(),
                content: "We went to the park".into(),
            }],
            max_tokens: 300,
            temperature: None,
            response_format: format,
        }
    }

    #[test]
    fn configured_key_wins() {
        assert_eq!(resolve_api_key(&Some("sk-config".into())).unwrap(), "sk-config");
    }

    #[test]
    fn missing_key_falls_back_to_env() {
        // Only an error when ANTHROPIC_API_KEY is unset.
        if let Err(err) = resolve_api_key(&Some(String::new())) {
            assert!(err.to_string().contains("no API key found"), "got: {err}");
        }
    }

    #[test]
    fn empty_model_uses_client_default() {
        let p = provider("http://localhost");
        let req = p.to_message_request(&request(ResponseFormat::Text));
        assert_eq!(req.model, "claude-haiku-test");
        assert_eq!(req.system.as_deref(), Some("You ask warm questions."));
        assert_eq!(req.temperature, Some(0.7));
    }

    #[test]
    fn json_format_extends_system_prompt() {
        let p = provider("http://localhost");
        let req = p.to_message_request(&request(ResponseFormat::Json));
        let system = req.system.unwrap();
        assert!(system.starts_with("You ask warm questions."));
        assert!(system.ends_with(JSON_INSTRUCTION));
    }

    #[test]
    fn request_temperature_overrides_config() {
        let p = provider("http://localhost");
        let mut req = request(ResponseFormat::Text);
        req.temperature = Some(0.2);
        assert_eq!(p.to_message_request(&req).temperature, Some(0.2));
    }

    #[tokio::test]
    async fn complete_maps_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"max_tokens": 300})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_q",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "Who else was at the park?"}],
                "model": "claude-sonnet-4-20250514",
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 40, "output_tokens": 8}
            })))
            .mount(&server)
            .await;

        let response = provider(&server.uri())
            .complete(request(ResponseFormat::Text))
            .await
            .unwrap();
        assert_eq!(response.content, "Who else was at the park?");
        assert_eq!(response.usage.output_tokens, 8);
    }

    #[tokio::test]
    async fn complete_surfaces_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(serde_json::json!({
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .complete(request(ResponseFormat::Text))
            .await
            .unwrap_err();
        assert!(matches!(err, CircleError::Provider { .. }));
    }
}
