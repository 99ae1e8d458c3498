//! # arbiter-core
//!
//! Deterministic building blocks for LLM-judged response evaluation.
//!
//! This crate renders judge prompts and classifies judge replies:
//! - **Relevancy**: is the response in line with the query and context?
//! - **Fact-checking**: is the claim supported by the document?
//!
//! ## Key Guarantees
//!
//! 1. **No model calls**: the judge is invoked by `arbiter-runtime`
//! 2. **Deterministic**: identical inputs render byte-identical prompts
//! 3. **Fail-closed**: replies that are not recognized as affirmative fail
//! 4. **Fail-fast configuration**: bad templates are rejected at construction
//!
//! ## Example
//!
//! ```rust
//! use arbiter_core::{EvaluationRequest, Evaluator};
//!
//! let evaluator = Evaluator::relevancy();
//! let request = EvaluationRequest::new(
//!     "Where does the adventure take place?",
//!     "The adventure takes place in a forest.",
//! )
//! .with_context(["The story is set in a forest."]);
//!
//! let prompt = evaluator.render_prompt(&request);
//! assert!(prompt.contains("The story is set in a forest."));
//!
//! let response = evaluator.interpret("YES");
//! assert!(response.pass);
//! ```

pub mod config;
pub mod evaluator;
pub mod template;
pub mod types;
pub mod verdict;

// Re-export main types at crate root
pub use config::{ConfigurationError, DocumentSource, EvaluatorMode, HarnessConfig};
pub use evaluator::{keys as metadata_keys, Evaluator};
pub use template::{PromptTemplate, FACT_CHECK_TEMPLATE, RELEVANCY_TEMPLATE};
pub use types::{
    ContextItem, EvaluationRequest, EvaluationResponse, Metadata, Verdict,
    DEFAULT_CONTEXT_SEPARATOR,
};
pub use verdict::VerdictParser;
