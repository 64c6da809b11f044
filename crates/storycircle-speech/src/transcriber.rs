// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech-to-text over an OpenAI-compatible `/audio/transcriptions` endpoint.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use storycircle_config::model::TranscriptionConfig;
use storycircle_core::{
    AdapterType, AudioBuffer, CircleError, FailureKind, HealthStatus, PluginAdapter, Transcript,
    TranscriptionAdapter,
};
use tracing::{debug, info};

use crate::http::{CLIENT_TIMEOUT, error_message, resolve_api_key, transport_kind};

/// MIME types accepted by the transcription endpoint, most preferred first.
const ACCEPTED_MIME_TYPES: &[&str] = &[
    "audio/webm",
    "audio/ogg",
    "audio/mp4",
    "audio/mpeg",
    "audio/wav",
];

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    #[serde(default)]
    confidence: Option<f32>,
}

/// HTTP transcription adapter. Makes exactly one request per call.
#[derive(Debug, Clone)]
pub struct HttpTranscriber {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpTranscriber {
    /// Builds the adapter from config. The key falls back to `OPENAI_API_KEY`.
    pub fn new(config: &TranscriptionConfig) -> Result<Self, CircleError> {
        let api_key = resolve_api_key(&config.api_key, "OPENAI_API_KEY", "transcription.api_key")?;
        let transcriber = Self::with_endpoint(&config.endpoint, api_key, config.model.clone())?;
        info!(model = %config.model, "transcription adapter initialized");
        Ok(transcriber)
    }

    /// Builds the adapter against an explicit base URL.
    pub fn with_endpoint(
        endpoint: &str,
        api_key: String,
        model: String,
    ) -> Result<Self, CircleError> {
        let client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(|e| CircleError::Transcription {
                message: format!("failed to build HTTP client: {e}"),
                kind: FailureKind::Network,
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    fn url(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url)
    }
}

fn file_name_for(mime_type: &str) -> &'static str {
    let base = mime_type.split(';').next().unwrap_or_default().trim();
    match base {
        "audio/webm" => "answer.webm",
        "audio/ogg" => "answer.ogg",
        "audio/mp4" => "answer.m4a",
        "audio/mpeg" => "answer.mp3",
        _ => "answer.wav",
    }
}

#[async_trait]
impl PluginAdapter for HttpTranscriber {
    fn name(&self) -> &str {
        "http-transcriber"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transcription
    }

    async fn health_check(&self) -> Result<HealthStatus, CircleError> {
        // Transcription is billed per request; never probe it.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CircleError> {
        Ok(())
    }
}

#[async_trait]
impl TranscriptionAdapter for HttpTranscriber {
    async fn transcribe(&self, audio: &AudioBuffer) -> Result<Transcript, CircleError> {
        if audio.is_empty() {
            return Err(CircleError::Transcription {
                message: "audio buffer is empty".into(),
                kind: FailureKind::Rejected,
                source: None,
            });
        }

        let part = Part::bytes(audio.bytes.clone())
            .file_name(file_name_for(&audio.mime_type))
            .mime_str(&audio.mime_type)
            .map_err(|e| CircleError::Transcription {
                message: format!("invalid audio MIME type {}: {e}", audio.mime_type),
                kind: FailureKind::Rejected,
                source: Some(Box::new(e)),
            })?;
        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", part);

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CircleError::Transcription {
                message: format!("HTTP request failed: {e}"),
                kind: transport_kind(&e),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, bytes = audio.bytes.len(), "transcription response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CircleError::Transcription {
                message: error_message(status, &body),
                kind: FailureKind::from_status(status.as_u16()),
                source: None,
            });
        }

        let parsed: TranscriptionResponse =
            response.json().await.map_err(|e| CircleError::Transcription {
                message: format!("failed to parse transcription response: {e}"),
                kind: FailureKind::Rejected,
                source: Some(Box::new(e)),
            })?;

        let text = parsed.text.trim();
        if text.is_empty() {
            return Err(CircleError::Transcription {
                message: "transcription returned no text".into(),
                kind: FailureKind::Rejected,
                source: None,
            });
        }

        Ok(Transcript {
            text: text.to_string(),
            confidence: parsed.confidence.map(|c| c.clamp(0.0, 1.0)),
        })
    }

    fn supported_mime_types(&self) -> Vec<String> {
        ACCEPTED_MIME_TYPES.iter().map(|m| m.to_string()).collect()
    }
}
