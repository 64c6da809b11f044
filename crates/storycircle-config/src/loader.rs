// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./storycircle.toml` > `~/.config/storycircle/storycircle.toml`
//! > `/etc/storycircle/storycircle.toml`, with environment variable overrides via
//! the `STORYCIRCLE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CircleConfig;

pub(crate) const LOCAL_FILE: &str = "storycircle.toml";
pub(crate) const SYSTEM_FILE: &str = "/etc/storycircle/storycircle.toml";

/// Section prefixes for env var mapping, most specific first.
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("network_stable_", "network.stable."),
    ("network_constrained_", "network.constrained."),
    ("network_", "network."),
    ("circle_", "circle."),
    ("storage_", "storage."),
    ("anthropic_", "anthropic."),
    ("transcription_", "transcription."),
    ("synthesis_", "synthesis."),
    ("questions_", "questions."),
    ("capture_", "capture."),
];

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("storycircle").join(LOCAL_FILE))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/storycircle/storycircle.toml` (system-wide)
/// 3. `~/.config/storycircle/storycircle.toml` (user XDG config)
/// 4. `./storycircle.toml` (local directory)
/// 5. `STORYCIRCLE_*` environment variables
pub fn load_config() -> Result<CircleConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CircleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CircleConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CircleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CircleConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CircleConfig::default()))
        .merge(Toml::file(SYSTEM_FILE))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_FILE))
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config key.
///
/// Only the leading section is rewritten, so underscores inside key names
/// survive: `questions_cooldown_secs` becomes `questions.cooldown_secs`.
pub fn map_env_key(key: &str) -> String {
    for (prefix, section) in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{section}{rest}");
        }
    }
    key.to_string()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: key names contain underscores.
fn env_provider() -> Env {
    Env::prefixed("STORYCIRCLE_").map(|key| map_env_key(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_leading_section_only() {
        assert_eq!(map_env_key("questions_cooldown_secs"), "questions.cooldown_secs");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("anthropic_api_key"), "anthropic.api_key");
    }

    #[test]
    fn env_keys_map_nested_timeout_tables() {
        assert_eq!(
            map_env_key("network_constrained_upload_secs"),
            "network.constrained.upload_secs"
        );
        assert_eq!(map_env_key("network_profile"), "network.profile");
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(map_env_key("bogus"), "bogus");
    }
}
