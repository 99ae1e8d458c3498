//! # arbiter-runtime
//!
//! Runs Arbiter evaluators against a judge model.
//!
//! `arbiter-core` renders prompts and classifies replies; this crate adds the
//! async part in between: the [`JudgeModel`] capability, the
//! [`EvaluationHarness`] that calls it, a provider adapter, and optional judge
//! decorators (retry, circuit breaker, reply cache).
//!
//! ## Error policy
//!
//! Only configuration problems and judge failures are errors. A judge reply
//! that cannot be classified is a failing verdict with low confidence, so
//! infrastructure failures stay distinguishable from negative evaluations.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use arbiter_core::EvaluationRequest;
//! use arbiter_runtime::{EvaluationHarness, FixedJudge};
//!
//! # tokio_test_block_on(async {
//! let harness = EvaluationHarness::relevancy(Arc::new(FixedJudge::new("YES")));
//! let request = EvaluationRequest::new(
//!     "Where does the adventure take place?",
//!     "The adventure takes place in a forest.",
//! )
//! .with_context(["The story is set in a forest."]);
//!
//! let response = harness.evaluate(&request).await.unwrap();
//! assert!(response.pass);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod harness;
pub mod judge;
pub mod providers;
pub mod resilience;

pub use cache::{CacheConfig, CachedJudge};
pub use config::{ProviderSection, RuntimeConfig};
pub use harness::EvaluationHarness;
pub use judge::{FixedJudge, JudgeError, JudgeModel};
pub use providers::{
    CompletionConfig, LlmProvider, ProviderError, ProviderJudge, ProviderRegistry,
};
pub use resilience::{CircuitBreakerConfig, CircuitBreakerJudge, RetryConfig, RetryingJudge};

use arbiter_core::ConfigurationError;
use thiserror::Error;

/// Errors from the evaluation harness.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Judge invocation failed: {0}")]
    JudgeInvocation(#[from] JudgeError),

    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),
}
