// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! One call is one request. Failures are classified with [`FailureKind`] and
//! handed back; the question generator decides what to do with them.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use storycircle_core::{CircleError, FailureKind};
use tracing::debug;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

const API_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Upper bound on a single completion round trip. Callers apply their own,
/// usually shorter, timeout on top.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn provider_error(
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
) -> CircleError {
    CircleError::Provider { message, source }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, CircleError> {
    HeaderValue::from_str(value)
        .map_err(|e| CircleError::Config(format!("invalid {name} header value: {e}")))
}

/// Client bound to one API key, API version and default model.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    default_model: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, api_version: String, model: String) -> Result<Self, CircleError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", header_value("x-api-key", &api_key)?);
        headers.insert(
            "anthropic-version",
            header_value("anthropic-version", &api_version)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| provider_error(format!("failed to build HTTP client: {e}"), Some(Box::new(e))))?;

        Ok(Self {
            client,
            default_model: model,
            base_url: API_BASE_URL.to_string(),
        })
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Points the client at another endpoint, e.g. a mock server.
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends one completion request.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, CircleError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    FailureKind::Timeout
                } else {
                    FailureKind::Network
                };
                provider_error(format!("request failed ({kind}): {e}"), Some(Box::new(e)))
            })?;

        let status = response.status();
        debug!(status = %status, "completion response received");

        let body = response
            .text()
            .await
            .map_err(|e| provider_error(format!("failed to read response body: {e}"), Some(Box::new(e))))?;

        if !status.is_success() {
            return Err(provider_error(describe_failure(status, &body), None));
        }
        serde_json::from_str(&body).map_err(|e| {
            provider_error(format!("failed to parse API response: {e}"), Some(Box::new(e)))
        })
    }
}

/// Human-readable failure including its [`FailureKind`], preferring the
/// API's own error message over the raw body.
fn describe_failure(status: StatusCode, body: &str) -> String {
    let kind = FailureKind::from_status(status.as_u16());
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api) => format!(
            "Anthropic API error {} ({kind}): {}",
            api.error.kind, api.error.message
        ),
        Err(_) => format!("API returned {status} ({kind}): {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiMessage;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "claude-haiku-test";

    async fn server_answering(template: ResponseTemplate) -> (MockServer, AnthropicClient) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(template)
            .expect(1)
            .mount(&server)
            .await;
        let client = AnthropicClient::new("sk-test".into(), "2023-06-01".into(), MODEL.into())
            .unwrap()
            .with_base_url(server.uri());
        (server, client)
    }

    fn question_request() -> MessageRequest {
        MessageRequest {
            model: MODEL.into(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: "We drove to the lake every August.".into(),
            }],
            system: Some("Ask one short follow-up question.".into()),
            max_tokens: 150,
            temperature: None,
        }
    }

    fn api_error(kind: &str, message: &str) -> serde_json::Value {
        serde_json::json!({"type": "error", "error": {"type": kind, "message": message}})
    }

    #[tokio::test]
    async fn returns_joined_text_and_usage() {
        let body = serde_json::json!({
            "id": "msg_lake",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Who usually drove?"}],
            "model": MODEL,
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 42, "output_tokens": 6}
        });
        let (_server, client) = server_answering(ResponseTemplate::new(200).set_body_json(body)).await;

        let response = client.complete_message(&question_request()).await.unwrap();
        assert_eq!(response.id, "msg_lake");
        assert_eq!(response.text(), "Who usually drove?");
        assert_eq!(response.usage.input_tokens, 42);
    }

    #[tokio::test]
    async fn rate_limit_fails_once_as_quota() {
        let template = ResponseTemplate::new(429).set_body_json(api_error("rate_limit_error", "slow down"));
        let (_server, client) = server_answering(template).await;

        let err = client.complete_message(&question_request()).await.unwrap_err();
        assert!(matches!(err, CircleError::Provider { .. }));
        let text = err.to_string();
        assert!(text.contains("rate_limit_error"), "got: {text}");
        assert!(text.contains("quota"), "got: {text}");
    }

    #[tokio::test]
    async fn bad_request_reports_api_message() {
        let template =
            ResponseTemplate::new(400).set_body_json(api_error("invalid_request_error", "unknown model"));
        let (_server, client) = server_answering(template).await;

        let text = client.complete_message(&question_request()).await.unwrap_err().to_string();
        assert!(text.contains("invalid_request_error"), "got: {text}");
        assert!(text.contains("unknown model"), "got: {text}");
    }

    #[tokio::test]
    async fn plain_text_gateway_error_keeps_body() {
        let (_server, client) =
            server_answering(ResponseTemplate::new(502).set_body_string("upstream unavailable")).await;

        let text = client.complete_message(&question_request()).await.unwrap_err().to_string();
        assert!(text.contains("502"), "got: {text}");
        assert!(text.contains("upstream unavailable"), "got: {text}");
    }

    #[tokio::test]
    async fn malformed_success_body_is_provider_error() {
        let (_server, client) =
            server_answering(ResponseTemplate::new(200).set_body_string("{\"id\":")).await;

        let err = client.complete_message(&question_request()).await.unwrap_err();
        assert!(err.to_string().contains("parse"), "got: {err}");
    }

    #[tokio::test]
    async fn auth_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(401).set_body_json(api_error(
                "authentication_error",
                "checked",
            )))
            .expect(1)
            .mount(&server)
            .await;
        let client = AnthropicClient::new("sk-test".into(), "2023-06-01".into(), MODEL.into())
            .unwrap()
            .with_base_url(server.uri());

        let text = client.complete_message(&question_request()).await.unwrap_err().to_string();
        assert!(text.contains("authentication_error"), "got: {text}");
    }

    #[test]
    fn header_with_newline_is_config_error() {
        let err = AnthropicClient::new("bad\nkey".into(), "2023-06-01".into(), MODEL.into()).unwrap_err();
        assert!(matches!(err, CircleError::Config(_)));
    }
}
