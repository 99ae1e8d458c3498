//! Judge decorators for unreliable providers.
//!
//! The harness never retries or masks failures itself. These wrappers are
//! judge models in their own right, so failure policy stays with the judge:
//! - Retry with exponential backoff for transient errors
//! - Circuit breaker to stop hammering a provider that is down

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerJudge, CircuitState};
pub use retry::{RetryConfig, RetryingJudge};
