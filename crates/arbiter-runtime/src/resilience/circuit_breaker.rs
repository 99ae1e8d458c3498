//! Circuit breaker around a judge model.
//!
//! After repeated judge failures the circuit opens and further calls fail
//! immediately with [`JudgeError::CircuitOpen`] instead of waiting on a
//! provider that is down. Failures are still reported as errors, never as
//! verdicts.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::humantime_duration;
use crate::judge::{JudgeError, JudgeModel};

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,

    /// Time before a probe call is allowed, e.g. "30s"
    #[serde(with = "humantime_duration")]
    pub recovery_timeout: Duration,

    /// Successful probes needed to close the circuit
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// Calls are rejected
    Open { opened_at: Instant },

    /// Probing whether the judge recovered
    HalfOpen { successes: u32 },
}

/// Tracks judge health for one judge.
pub struct CircuitBreaker {
    state: RwLock<CircuitState>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: RwLock::new(CircuitState::Closed { failures: 0 }),
            config,
        }
    }

    /// Whether calls should be rejected right now.
    ///
    /// An open circuit whose recovery timeout elapsed moves to half-open and
    /// lets the call through.
    pub fn is_open(&self) -> bool {
        let mut state = self.state.write();
        match *state {
            CircuitState::Open { opened_at } => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    *state = CircuitState::HalfOpen { successes: 0 };
                    tracing::info!("Circuit half-open, probing judge");
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.write();
        match *state {
            CircuitState::HalfOpen { successes } => {
                if successes + 1 >= self.config.success_threshold {
                    *state = CircuitState::Closed { failures: 0 };
                    tracing::info!("Circuit closed after successful recovery");
                } else {
                    *state = CircuitState::HalfOpen {
                        successes: successes + 1,
                    };
                }
            }
            CircuitState::Closed { .. } => {
                *state = CircuitState::Closed { failures: 0 };
            }
            CircuitState::Open { .. } => {}
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.state.write();
        match *state {
            CircuitState::Closed { failures } => {
                if failures + 1 >= self.config.failure_threshold {
                    *state = CircuitState::Open {
                        opened_at: Instant::now(),
                    };
                    tracing::warn!(failures = failures + 1, "Circuit opened after repeated judge failures");
                } else {
                    *state = CircuitState::Closed {
                        failures: failures + 1,
                    };
                }
            }
            CircuitState::HalfOpen { .. } => {
                *state = CircuitState::Open {
                    opened_at: Instant::now(),
                };
                tracing::warn!("Circuit reopened after failed recovery probe");
            }
            CircuitState::Open { .. } => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state.read().clone()
    }

    /// Force the circuit closed.
    pub fn reset(&self) {
        *self.state.write() = CircuitState::Closed { failures: 0 };
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

/// Judge decorator that applies a [`CircuitBreaker`].
pub struct CircuitBreakerJudge {
    inner: Arc<dyn JudgeModel>,
    breaker: CircuitBreaker,
}

impl CircuitBreakerJudge {
    pub fn new(inner: Arc<dyn JudgeModel>, config: CircuitBreakerConfig) -> Self {
        Self {
            inner,
            breaker: CircuitBreaker::new(config),
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[async_trait]
impl JudgeModel for CircuitBreakerJudge {
    async fn invoke(&self, prompt: &str) -> Result<String, JudgeError> {
        if self.breaker.is_open() {
            tracing::warn!(judge = self.inner.name(), "Circuit open, rejecting judge call");
            return Err(JudgeError::CircuitOpen);
        }

        match self.inner.invoke(prompt).await {
            Ok(reply) => {
                self.breaker.record_success();
                Ok(reply)
            }
            Err(e) => {
                self.breaker.record_failure();
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
