//! Adapter from a chat-completion provider to a judge model.

use async_trait::async_trait;
use std::sync::Arc;

use super::{ChatMessage, CompletionConfig, LlmProvider};
use crate::judge::{JudgeError, JudgeModel};

/// Judge backed by an [`LlmProvider`].
///
/// Every invocation is a fresh single-turn conversation: an optional system
/// message followed by the judge prompt as the only user message. The
/// configured timeout bounds the whole call.
pub struct ProviderJudge {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
}

impl ProviderJudge {
    pub fn new(provider: Arc<dyn LlmProvider>, config: CompletionConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    fn messages(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }
}

impl std::fmt::Debug for ProviderJudge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderJudge")
            .field("provider", &self.provider.name())
            .field("model", &self.config.model)
            .finish()
    }
}

#[async_trait]
impl JudgeModel for ProviderJudge {
    async fn invoke(&self, prompt: &str) -> Result<String, JudgeError> {
        let timeout = self.config.timeout;
        let call = self.provider.complete(self.messages(prompt), &self.config);

        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(response)) => {
                tracing::debug!(
                    provider = self.provider.name(),
                    model = %response.model,
                    tokens = response.usage.total(),
                    "Judge reply received"
                );
                Ok(response.content)
            }
            Ok(Err(e)) => Err(JudgeError::Provider(e)),
            Err(_) => {
                tracing::warn!(provider = self.provider.name(), timeout = ?timeout, "Judge call timed out");
                Err(JudgeError::Timeout(timeout))
            }
        }
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}
