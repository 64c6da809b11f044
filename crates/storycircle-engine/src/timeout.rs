// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network-profile timeouts and the cancellable wrapper that enforces them.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use storycircle_config::model::{NetworkConfig, TimeoutConfig};
use storycircle_core::CircleError;
use tracing::warn;

/// Connection quality the session runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NetworkProfile {
    #[default]
    Stable,
    Constrained,
}

impl FromStr for NetworkProfile {
    type Err = CircleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(NetworkProfile::Stable),
            "constrained" => Ok(NetworkProfile::Constrained),
            other => Err(CircleError::Config(format!("unknown network profile: {other}"))),
        }
    }
}

/// Per-operation limits for one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub upload: Duration,
    pub transcription: Duration,
    pub synthesis: Duration,
    pub completion: Duration,
}

impl From<&TimeoutConfig> for TimeoutPolicy {
    fn from(t: &TimeoutConfig) -> Self {
        Self {
            upload: Duration::from_secs(t.upload_secs),
            transcription: Duration::from_secs(t.transcription_secs),
            synthesis: Duration::from_secs(t.synthesis_secs),
            completion: Duration::from_secs(t.completion_secs),
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::from(&TimeoutConfig::stable())
    }
}

impl TimeoutPolicy {
    /// Selects the table for the configured profile.
    pub fn from_config(config: &NetworkConfig) -> Result<Self, CircleError> {
        let profile: NetworkProfile = config.profile.parse()?;
        Ok(Self::for_profile(config, profile))
    }

    pub fn for_profile(config: &NetworkConfig, profile: NetworkProfile) -> Self {
        match profile {
            NetworkProfile::Stable => Self::from(&config.stable),
            NetworkProfile::Constrained => Self::from(&config.constrained),
        }
    }
}

/// Runs `fut`, cancelling it after `limit`.
pub async fn with_timeout<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T, CircleError>
where
    F: Future<Output = Result<T, CircleError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "operation timed out");
            Err(CircleError::Timeout { duration: limit })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_selects_table() {
        let config = NetworkConfig::default();
        let stable = TimeoutPolicy::for_profile(&config, NetworkProfile::Stable);
        let constrained = TimeoutPolicy::for_profile(&config, NetworkProfile::Constrained);
        assert!(constrained.upload > stable.upload);
        assert!(constrained.completion > stable.completion);
    }

    #[test]
    fn unknown_profile_is_a_config_error() {
        let config = NetworkConfig {
            profile: "satellite".into(),
            ..Default::default()
        };
        assert!(matches!(TimeoutPolicy::from_config(&config), Err(CircleError::Config(_))));
    }

    #[tokio::test]
    async fn fast_operation_passes_through() {
        let v = with_timeout("test", Duration::from_secs(1), async { Ok::<_, CircleError>(7) })
            .await
            .unwrap();
        assert_eq!(v, 7);
    }

    #[tokio::test]
    async fn slow_operation_times_out_as_retryable() {
        let err = with_timeout("test", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, CircleError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CircleError::Timeout { .. }));
        assert!(err.is_retryable());
    }
}
