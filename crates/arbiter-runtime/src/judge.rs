//! The judge model capability.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::providers::ProviderError;

/// Errors from a judge model invocation.
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Judge timed out after {0:?}")]
    Timeout(Duration),

    #[error("Circuit open, judge calls suspended")]
    CircuitOpen,

    #[error("Judge failed: {0}")]
    Other(String),
}

impl JudgeError {
    /// Whether retrying the same prompt could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            JudgeError::Provider(e) => e.is_transient(),
            JudgeError::Timeout(_) => true,
            JudgeError::CircuitOpen | JudgeError::Other(_) => false,
        }
    }
}

/// A model that answers a single judge prompt.
///
/// Each call is independent: no conversation history is carried between
/// invocations. Timeouts and retries are the implementation's
/// concern and surface as [`JudgeError`].
#[async_trait]
pub trait JudgeModel: Send + Sync {
    /// Send `prompt` as a single-turn request and return the raw reply.
    async fn invoke(&self, prompt: &str) -> Result<String, JudgeError>;

    /// Name used in logs and response metadata.
    fn name(&self) -> &str {
        "judge"
    }
}

#[async_trait]
impl<T: JudgeModel + ?Sized> JudgeModel for Arc<T> {
    async fn invoke(&self, prompt: &str) -> Result<String, JudgeError> {
        (**self).invoke(prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A judge that always gives the same reply.
///
/// Useful for offline runs and for replaying a recorded judge answer.
#[derive(Debug, Clone)]
pub struct FixedJudge {
    reply: String,
}

impl FixedJudge {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl JudgeModel for FixedJudge {
    async fn invoke(&self, _prompt: &str) -> Result<String, JudgeError> {
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_judge_ignores_prompt() {
        let judge = FixedJudge::new("YES");
        assert_eq!(judge.invoke("anything").await.unwrap(), "YES");
        assert_eq!(judge.invoke("something else").await.unwrap(), "YES");
        assert_eq!(judge.name(), "fixed");
    }

    #[tokio::test]
    async fn test_arc_delegates() {
        let judge: Arc<dyn JudgeModel> = Arc::new(FixedJudge::new("no"));
        let wrapped = Arc::new(judge);
        assert_eq!(wrapped.invoke("p").await.unwrap(), "no");
        assert_eq!(wrapped.name(), "fixed");
    }

    #[test]
    fn test_transient_classification() {
        assert!(JudgeError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(JudgeError::Provider(ProviderError::HttpError("reset".into())).is_transient());
        assert!(!JudgeError::Provider(ProviderError::AuthError).is_transient());
        assert!(!JudgeError::CircuitOpen.is_transient());
    }
}
