//! Runtime configuration: harness settings plus the judge stack behind them.
//!
//! ```yaml
//! harness:
//!   mode: fact_checking
//!   affirmative_tokens: [supported]
//!   negative_tokens: [unsupported]
//! provider:
//!   type: anthropic
//!   config: { base_url: "https://api.anthropic.com/v1" }
//! completion:
//!   model: claude-3-5-haiku-latest
//!   timeout: 20s
//! retry: { max_retries: 3, min_delay: 250ms }
//! circuit_breaker: { failure_threshold: 5, recovery_timeout: 1m }
//! cache: { max_entries: 5000, ttl: 30m }
//! ```
//!
//! `retry`, `circuit_breaker` and `cache` are optional; a missing section
//! disables that decorator.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use arbiter_core::config::is_json_path;
use arbiter_core::{ConfigurationError, HarnessConfig};

use crate::cache::{CacheConfig, CachedJudge};
use crate::judge::JudgeModel;
use crate::providers::{CompletionConfig, ProviderError, ProviderJudge, ProviderRegistry};
use crate::resilience::{CircuitBreakerConfig, CircuitBreakerJudge, RetryConfig, RetryingJudge};

/// Serde adapter for durations written as "15s", "250ms", "1h 30m" or a
/// plain number of seconds.
pub mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Secs(u64),
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => {
                humantime::parse_duration(&text).map_err(serde::de::Error::custom)
            }
            Repr::Secs(secs) => Ok(Duration::from_secs(secs)),
        }
    }
}

/// Which provider backs the judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSection {
    /// Registered provider type, e.g. "anthropic" or "static"
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Provider-specific settings
    #[serde(default = "empty_object")]
    pub config: JsonValue,
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

/// Full runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Evaluator settings
    pub harness: HarnessConfig,

    /// Judge provider
    pub provider: ProviderSection,

    /// Completion request settings
    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
}

impl RuntimeConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a file; `.json` is JSON, anything else YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        if is_json_path(path) {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// Build the judge described by this configuration.
    ///
    /// Layering, outermost first: cache, circuit breaker, retry, provider.
    /// Cache hits therefore skip the breaker, and the breaker counts a call
    /// as failed only after retries are exhausted.
    pub fn build_judge(
        &self,
        registry: &ProviderRegistry,
    ) -> Result<Arc<dyn JudgeModel>, ProviderError> {
        let provider = registry.create(&self.provider.provider_type, &self.provider.config)?;
        let mut judge: Arc<dyn JudgeModel> =
            Arc::new(ProviderJudge::new(provider, self.completion.clone()));

        if let Some(retry) = &self.retry {
            judge = Arc::new(RetryingJudge::new(judge, retry.clone()));
        }
        if let Some(breaker) = &self.circuit_breaker {
            judge = Arc::new(CircuitBreakerJudge::new(judge, breaker.clone()));
        }
        if let Some(cache) = &self.cache {
            judge = Arc::new(CachedJudge::new(judge, cache));
        }

        tracing::debug!(
            provider = %self.provider.provider_type,
            model = %self.completion.model,
            retry = self.retry.is_some(),
            circuit_breaker = self.circuit_breaker.is_some(),
            cache = self.cache.is_some(),
            "Judge stack built"
        );

        Ok(judge)
    }
}
