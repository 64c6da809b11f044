// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget forwarding of transcripts to a voice training sink.

use std::sync::Arc;

use storycircle_core::{TrainingSample, TrainingSink};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Spawns a task that records `sample`. Failures are logged and dropped.
///
/// The handle is returned for tests; callers normally ignore it.
pub fn forward_training(sink: Arc<dyn TrainingSink>, sample: TrainingSample) -> JoinHandle<()> {
    tokio::spawn(async move {
        let user_id = sample.user_id.clone();
        match sink.record_sample(sample).await {
            Ok(()) => debug!(user_id = %user_id, "training sample recorded"),
            Err(e) => warn!(user_id = %user_id, error = %e, "failed to forward training sample"),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use storycircle_core::{AdapterType, CircleError, HealthStatus, PluginAdapter};

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        fail: bool,
        samples: Mutex<Vec<TrainingSample>>,
    }

    #[async_trait]
    impl PluginAdapter for RecordingSink {
        fn name(&self) -> &str {
            "recording-sink"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Training
        }
        async fn health_check(&self) -> Result<HealthStatus, CircleError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), CircleError> {
            Ok(())
        }
    }

    #[async_trait]
    impl TrainingSink for RecordingSink {
        async fn record_sample(&self, sample: TrainingSample) -> Result<(), CircleError> {
            if self.fail {
                return Err(CircleError::storage("disk full"));
            }
            self.samples.lock().unwrap().push(sample);
            Ok(())
        }
    }

    fn sample() -> TrainingSample {
        TrainingSample {
            user_id: "u1".into(),
            transcript: "it was raining".into(),
            audio_ref: Some("blob:1".into()),
            duration_seconds: 2.0,
            confidence: Some(0.9),
        }
    }

    #[tokio::test]
    async fn sample_reaches_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        forward_training(sink.clone(), sample()).await.unwrap();
        assert_eq!(sink.samples.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sink_failure_is_swallowed() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        // The task completes normally even though the sink failed.
        assert!(forward_training(sink, sample()).await.is_ok());
    }
}
