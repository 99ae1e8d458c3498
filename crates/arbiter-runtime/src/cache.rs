//! Reply cache for judge models.
//!
//! Rendering is deterministic, so identical requests produce identical
//! prompts. Caching the judge reply per prompt avoids paying for the same
//! judgement twice. Failed calls are never cached.

use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::humantime_duration;
use crate::judge::{JudgeError, JudgeModel};

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached replies
    pub max_entries: u64,

    /// Entry lifetime, e.g. "1h"
    #[serde(with = "humantime_duration")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Judge decorator that caches successful replies by prompt.
pub struct CachedJudge {
    inner: Arc<dyn JudgeModel>,
    cache: Cache<String, String>,
}

impl CachedJudge {
    pub fn new(inner: Arc<dyn JudgeModel>, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { inner, cache }
    }

    /// Drop every cached reply.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl JudgeModel for CachedJudge {
    async fn invoke(&self, prompt: &str) -> Result<String, JudgeError> {
        if let Some(reply) = self.cache.get(prompt).await {
            tracing::debug!(judge = self.inner.name(), "Judge reply served from cache");
            return Ok(reply);
        }

        let reply = self.inner.invoke(prompt).await?;
        self.cache.insert(prompt.to_string(), reply.clone()).await;
        Ok(reply)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Echoes the prompt, failing on "fail".
    struct EchoJudge {
        calls: AtomicU32,
    }

    #[async_trait]
    impl JudgeModel for EchoJudge {
        async fn invoke(&self, prompt: &str) -> Result<String, JudgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt == "fail" {
                Err(JudgeError::Other("no reply".to_string()))
            } else {
                Ok(format!("reply to {prompt}"))
            }
        }
    }

    #[tokio::test]
    async fn test_repeated_prompt_hits_cache() {
        let inner = Arc::new(EchoJudge {
            calls: AtomicU32::new(0),
        });
        let judge = CachedJudge::new(inner.clone(), &CacheConfig::default());

        assert_eq!(judge.invoke("a").await.unwrap(), "reply to a");
        assert_eq!(judge.invoke("a").await.unwrap(), "reply to a");
        assert_eq!(judge.invoke("b").await.unwrap(), "reply to b");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_not_cached() {
        let inner = Arc::new(EchoJudge {
            calls: AtomicU32::new(0),
        });
        let judge = CachedJudge::new(inner.clone(), &CacheConfig::default());

        assert!(judge.invoke("fail").await.is_err());
        assert!(judge.invoke("fail").await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let inner = Arc::new(EchoJudge {
            calls: AtomicU32::new(0),
        });
        let judge = CachedJudge::new(inner.clone(), &CacheConfig::default());

        judge.invoke("a").await.unwrap();
        judge.invalidate_all();
        judge.invoke("a").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
