// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, value ranges, and cross-field timeout ordering.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{
    CircleConfig, KNOWN_DEVICE_CLASSES, KNOWN_ENCODINGS, KNOWN_NETWORK_PROFILES,
};

const KNOWN_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const KNOWN_CONVERSATION_TYPES: &[&str] = &["story", "general"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CircleConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |key: &str, message: String| errors.push(ConfigError::validation(key, message));

    if !KNOWN_LOG_LEVELS.contains(&config.circle.log_level.as_str()) {
        fail(
            "circle.log_level",
            format!(
                "`{}` must be one of: {}",
                config.circle.log_level,
                KNOWN_LOG_LEVELS.join(", ")
            ),
        );
    }

    if !KNOWN_CONVERSATION_TYPES.contains(&config.circle.conversation_type.as_str()) {
        fail(
            "circle.conversation_type",
            format!(
                "`{}` must be one of: {}",
                config.circle.conversation_type,
                KNOWN_CONVERSATION_TYPES.join(", ")
            ),
        );
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path", "must not be empty".to_string());
    }

    let temperature = config.anthropic.temperature;
    if !(0.0..=1.0).contains(&temperature) {
        fail(
            "anthropic.temperature",
            format!("must be between 0 and 1, got {temperature}"),
        );
    }

    if config.anthropic.max_tokens == 0 {
        fail("anthropic.max_tokens", "must be greater than 0".to_string());
    }

    if config.questions.max_questions_per_conversation == 0 {
        fail("questions.max_questions_per_conversation", "must be at least 1".to_string());
    }

    if config.questions.history_window == 0 {
        fail("questions.history_window", "must be at least 1".to_string());
    }

    if !KNOWN_DEVICE_CLASSES.contains(&config.capture.device_class.as_str()) {
        fail(
            "capture.device_class",
            format!(
                "`{}` must be one of: {}",
                config.capture.device_class,
                KNOWN_DEVICE_CLASSES.join(", ")
            ),
        );
    }

    if config.capture.preferred_encodings.is_empty() {
        fail("capture.preferred_encodings", "must list at least one encoding".to_string());
    }

    let mut seen = HashSet::new();
    for encoding in &config.capture.preferred_encodings {
        if !KNOWN_ENCODINGS.contains(&encoding.as_str()) {
            fail(
                "capture.preferred_encodings",
                format!(
                    "unknown encoding `{encoding}` (known: {})",
                    KNOWN_ENCODINGS.join(", ")
                ),
            );
        } else if !seen.insert(encoding.as_str()) {
            fail(
                "capture.preferred_encodings",
                format!("lists `{encoding}` more than once"),
            );
        }
    }

    if !KNOWN_NETWORK_PROFILES.contains(&config.network.profile.as_str()) {
        fail(
            "network.profile",
            format!(
                "`{}` must be one of: {}",
                config.network.profile,
                KNOWN_NETWORK_PROFILES.join(", ")
            ),
        );
    }

    for (profile, table) in [
        ("stable", &config.network.stable),
        ("constrained", &config.network.constrained),
    ] {
        for (key, secs) in table.entries() {
            if secs == 0 {
                fail(&format!("network.{profile}.{key}"), "must be greater than 0".to_string());
            }
        }
    }

    let stable = config.network.stable.entries();
    for (i, (key, constrained_secs)) in config.network.constrained.entries().into_iter().enumerate()
    {
        let stable_secs = stable[i].1;
        if constrained_secs < stable_secs {
            fail(
                &format!("network.constrained.{key}"),
                format!("{constrained_secs}s must not be shorter than network.stable.{key} ({stable_secs}s)"),
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
