//! Retry with exponential backoff around a judge model.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::humantime_duration;
use crate::judge::{JudgeError, JudgeModel};

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: usize,

    /// First backoff delay, e.g. "200ms"
    #[serde(with = "humantime_duration")]
    pub min_delay: Duration,

    /// Upper bound on a single backoff delay
    #[serde(with = "humantime_duration")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Judge decorator that retries transient failures.
///
/// Only errors where [`JudgeError::is_transient`] holds are retried; the last
/// error is returned once retries are exhausted.
pub struct RetryingJudge {
    inner: Arc<dyn JudgeModel>,
    config: RetryConfig,
}

impl RetryingJudge {
    pub fn new(inner: Arc<dyn JudgeModel>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl JudgeModel for RetryingJudge {
    async fn invoke(&self, prompt: &str) -> Result<String, JudgeError> {
        let inner = &self.inner;
        (|| async move { inner.invoke(prompt).await })
            .retry(self.config.backoff())
            .sleep(tokio::time::sleep)
            .when(|e: &JudgeError| e.is_transient())
            .notify(|e: &JudgeError, delay: Duration| {
                tracing::warn!(judge = inner.name(), error = %e, delay = ?delay, "Retrying judge call");
            })
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
