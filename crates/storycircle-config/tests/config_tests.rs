// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Story Circle configuration system.

use storycircle_config::diagnostic::{ConfigError, suggest_key};
use storycircle_config::model::CircleConfig;
use storycircle_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_circle_config() {
    let toml = r#"
[circle]
name = "family-archive"
log_level = "debug"
conversation_type = "story"

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[anthropic]
api_key = "sk-ant-123"
temperature = 0.4

[transcription]
enabled = true
endpoint = "http://localhost:9000/v1"
model = "whisper-1"

[synthesis]
endpoint = "http://localhost:9001"
model_id = "eleven_turbo_v2"

[questions]
min_comment_length = 20
max_questions_per_conversation = 5
cooldown_secs = 60
history_window = 6
open_with_question = false

[capture]
device_class = "constrained"
preferred_encodings = ["ogg_opus", "wav"]

[network]
profile = "constrained"

[network.constrained]
upload_secs = 120
transcription_secs = 120
synthesis_secs = 60
completion_secs = 90
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.circle.name, "family-archive");
    assert_eq!(config.circle.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.anthropic.api_key.as_deref(), Some("sk-ant-123"));
    assert!((config.anthropic.temperature - 0.4).abs() < f32::EPSILON);
    assert_eq!(config.transcription.endpoint, "http://localhost:9000/v1");
    assert_eq!(config.synthesis.model_id, "eleven_turbo_v2");
    assert_eq!(config.questions.min_comment_length, 20);
    assert_eq!(config.questions.max_questions_per_conversation, 5);
    assert_eq!(config.questions.cooldown_secs, 60);
    assert_eq!(config.questions.history_window, 6);
    assert!(!config.questions.open_with_question);
    assert_eq!(config.capture.device_class, "constrained");
    assert_eq!(config.capture.preferred_encodings, vec!["ogg_opus", "wav"]);
    assert_eq!(config.network.profile, "constrained");
    assert_eq!(config.network.constrained.upload_secs, 120);
    // Untouched table keeps its defaults.
    assert_eq!(config.network.stable.upload_secs, 30);
}

/// Unknown field in [questions] section produces an error.
#[test]
fn unknown_field_in_questions_produces_error() {
    let toml = r#"
[questions]
cooldown_sec = 30
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("cooldown_sec"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.circle.name, "storycircle");
    assert_eq!(config.circle.log_level, "info");
    assert_eq!(config.circle.conversation_type, "story");
    assert!(config.anthropic.api_key.is_none());
    assert_eq!(config.anthropic.default_model, "claude-sonnet-4-20250514");
    assert!(config.storage.database_path.ends_with("storycircle.db"));
    assert!(config.storage.wal_mode);
    assert!(config.transcription.enabled);
    assert_eq!(config.transcription.model, "whisper-1");
    assert_eq!(config.questions.max_questions_per_conversation, 3);
    assert_eq!(config.questions.cooldown_secs, 300);
    assert_eq!(config.questions.history_window, 10);
    assert!(config.questions.open_with_question);
    assert_eq!(config.capture.device_class, "standard");
    assert_eq!(config.capture.preferred_encodings.first().map(String::as_str), Some("webm_opus"));
    assert_eq!(config.network.profile, "stable");
}

/// A dotted override (as produced by the env mapping) lands on the right key.
#[test]
fn dotted_override_sets_underscored_key() {
    use figment::{Figment, providers::Serialized};

    let key = storycircle_config::loader::map_env_key("questions_max_questions_per_conversation");
    let config: CircleConfig = Figment::new()
        .merge(Serialized::defaults(CircleConfig::default()))
        .merge((key.as_str(), 7))
        .extract()
        .expect("should set nested key via dot notation");

    assert_eq!(config.questions.max_questions_per_conversation, 7);
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: CircleConfig = Figment::new()
        .merge(Serialized::defaults(CircleConfig::default()))
        .merge(Toml::file("/nonexistent/path/storycircle.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.circle.name, "storycircle");
}

/// Explicit file paths load through the same validation.
#[test]
fn load_and_validate_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storycircle.toml");
    std::fs::write(&path, "[questions]\ncooldown_secs = 42\n").unwrap();

    let config = storycircle_config::load_and_validate_path(&path).expect("should load");
    assert_eq!(config.questions.cooldown_secs, 42);
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[presence]
typing_indicators = true
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("presence"),
        "error should mention unknown field, got: {err_str}"
    );
}

#[test]
fn diagnostic_suggests_close_key() {
    let valid_keys = &["min_comment_length", "max_questions_per_conversation", "cooldown_secs"];
    assert_eq!(
        suggest_key("max_question_per_conversation", valid_keys),
        Some("max_questions_per_conversation".to_string())
    );
    assert!(suggest_key("zzzzzz", valid_keys).is_none());
}

/// Error output from load_and_validate_str names the unknown key and a suggestion.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[questions]
cooldown_sec = 30
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "cooldown_sec"
                && suggestion.as_deref() == Some("cooldown_secs")
                && valid_keys.contains("history_window")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'cooldown_sec', got: {errors:?}"
    );
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[questions]
cooldown_secs = "five minutes"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("cooldown_secs"),
        "error should mention type mismatch, got: {err_str}"
    );
}

/// ConfigError implements miette::Diagnostic and renders with the graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "devcie_class".to_string(),
        section: "[capture]".to_string(),
        suggestion: Some("device_class".to_string()),
        valid_keys: "device_class, preferred_encodings".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().expect("should have help text").to_string();
    assert!(help.contains("did you mean `device_class`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("devcie_class"));
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn validation_catches_zero_question_limit() {
    let toml = r#"
[questions]
max_questions_per_conversation = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero limit should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { key, .. } if key == "questions.max_questions_per_conversation")
    }));
}
