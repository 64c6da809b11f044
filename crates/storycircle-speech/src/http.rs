// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP plumbing for the speech adapters.

use std::time::Duration;

use serde::Deserialize;
use storycircle_core::{CircleError, FailureKind};

/// Upper bound on a single request. Tighter, profile-specific limits are
/// applied by the caller.
pub(crate) const CLIENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Resolves an API key from config, then from `env_var`.
pub fn resolve_api_key(
    config_key: &Option<String>,
    env_var: &str,
    setting: &str,
) -> Result<String, CircleError> {
    if let Some(key) = config_key {
        if !key.trim().is_empty() {
            return Ok(key.clone());
        }
    }

    std::env::var(env_var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            CircleError::Config(format!(
                "API key not found. Set {setting} in config or the {env_var} environment variable."
            ))
        })
}

/// Classifies a transport-level failure.
pub(crate) fn transport_kind(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else if let Some(status) = err.status() {
        FailureKind::from_status(status.as_u16())
    } else {
        FailureKind::Network
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
    detail: Option<ErrorDetail>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Structured { message: String },
    Plain(String),
}

/// Extracts a readable message from an error body, falling back to the raw text.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error.or(env.detail));
    match detail {
        Some(ErrorDetail::Structured { message }) | Some(ErrorDetail::Plain(message)) => {
            format!("service returned {status}: {message}")
        }
        None => format!("service returned {status}: {}", body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_key_wins() {
        let key = resolve_api_key(&Some("sk-config".into()), "STORYCIRCLE_TEST_UNSET", "x.api_key");
        assert_eq!(key.unwrap(), "sk-config");
    }

    #[test]
    fn missing_key_names_the_setting() {
        let err = resolve_api_key(&None, "STORYCIRCLE_TEST_DEFINITELY_UNSET", "synthesis.api_key")
            .unwrap_err()
            .to_string();
        assert!(err.contains("synthesis.api_key"), "got: {err}");
    }

    #[test]
    fn error_messages_are_extracted() {
        let status = reqwest::StatusCode::UNAUTHORIZED;
        let openai = r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error"}}"#;
        assert!(error_message(status, openai).ends_with("Incorrect API key"));

        let eleven = r#"{"detail":{"status":"voice_not_found","message":"Voice not found"}}"#;
        assert!(error_message(status, eleven).ends_with("Voice not found"));

        assert!(error_message(status, "nope").ends_with("nope"));
    }
}
