// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-to-speech over an ElevenLabs-style `/v1/text-to-speech/{voice_id}` endpoint.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use storycircle_config::model::SynthesisConfig;
use storycircle_core::{
    AdapterType, AudioBuffer, CircleError, FailureKind, HealthStatus, PluginAdapter,
    SynthesisAdapter,
};
use tracing::{debug, info};

use crate::http::{CLIENT_TIMEOUT, error_message, resolve_api_key, transport_kind};

/// Bit rate assumed when estimating the duration of returned MP3 audio.
const ASSUMED_BITS_PER_SECOND: f64 = 128_000.0;

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// HTTP synthesis adapter.
#[derive(Debug, Clone)]
pub struct HttpSynthesizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_id: String,
}

impl HttpSynthesizer {
    /// Builds the adapter from config. The key falls back to `ELEVENLABS_API_KEY`.
    pub fn new(config: &SynthesisConfig) -> Result<Self, CircleError> {
        let api_key = resolve_api_key(&config.api_key, "ELEVENLABS_API_KEY", "synthesis.api_key")?;
        let synthesizer = Self::with_endpoint(&config.endpoint, api_key, config.model_id.clone())?;
        info!(model = %config.model_id, "synthesis adapter initialized");
        Ok(synthesizer)
    }

    pub fn with_endpoint(
        endpoint: &str,
        api_key: String,
        model_id: String,
    ) -> Result<Self, CircleError> {
        let client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(|e| CircleError::Synthesis {
                message: format!("failed to build HTTP client: {e}"),
                kind: FailureKind::Network,
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model_id,
        })
    }

    fn url(&self, voice_id: &str) -> String {
        format!("{}/v1/text-to-speech/{voice_id}", self.base_url)
    }
}

#[async_trait]
impl PluginAdapter for HttpSynthesizer {
    fn name(&self) -> &str {
        "http-synthesizer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
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
impl SynthesisAdapter for HttpSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioBuffer, CircleError> {
        if voice_id.trim().is_empty() {
            return Err(CircleError::Synthesis {
                message: "no voice id supplied".into(),
                kind: FailureKind::Rejected,
                source: None,
            });
        }
        if text.trim().is_empty() {
            return Err(CircleError::Synthesis {
                message: "nothing to synthesize".into(),
                kind: FailureKind::Rejected,
                source: None,
            });
        }

        let response = self
            .client
            .post(self.url(voice_id))
            .header("xi-api-key", &self.api_key)
            .header(ACCEPT, "audio/mpeg")
            .json(&SynthesisRequest {
                text,
                model_id: &self.model_id,
            })
            .send()
            .await
            .map_err(|e| CircleError::Synthesis {
                message: format!("HTTP request failed: {e}"),
                kind: transport_kind(&e),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, voice_id, "synthesis response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CircleError::Synthesis {
                message: error_message(status, &body),
                kind: FailureKind::from_status(status.as_u16()),
                source: None,
            });
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "audio/mpeg".to_string());
        let bytes = response.bytes().await.map_err(|e| CircleError::Synthesis {
            message: format!("failed to read synthesized audio: {e}"),
            kind: transport_kind(&e),
            source: Some(Box::new(e)),
        })?;

        if bytes.is_empty() {
            return Err(CircleError::Synthesis {
                message: "service returned no audio".into(),
                kind: FailureKind::Rejected,
                source: None,
            });
        }

        let duration_seconds = bytes.len() as f64 * 8.0 / ASSUMED_BITS_PER_SECOND;
        Ok(AudioBuffer {
            bytes: bytes.to_vec(),
            mime_type,
            duration_seconds,
        })
    }
}
