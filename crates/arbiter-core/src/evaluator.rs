//! The deterministic half of an evaluation: prompt in, verdict out.
//!
//! An [`Evaluator`] never talks to a model. It renders the judge prompt for a
//! request and turns the judge's reply into an [`EvaluationResponse`]. The
//! async harness in `arbiter-runtime` sits between the two calls.

use crate::config::{ConfigurationError, DocumentSource, EvaluatorMode, HarnessConfig};
use crate::template::PromptTemplate;
use crate::types::{EvaluationRequest, EvaluationResponse, Metadata, Verdict};
use crate::verdict::VerdictParser;

/// Metadata keys written on every response.
pub mod keys {
    pub const MODE: &str = "mode";
    pub const TEMPLATE: &str = "template";
    pub const VERDICT: &str = "verdict";
    pub const CONFIDENCE: &str = "confidence";
    pub const JUDGE: &str = "judge";
}

/// A validated evaluator configuration.
#[derive(Debug, Clone)]
pub struct Evaluator {
    mode: EvaluatorMode,
    template: PromptTemplate,
    custom_template: bool,
    parser: VerdictParser,
    context_separator: String,
    document_source: DocumentSource,
}

impl Evaluator {
    /// Validate `config` and build an evaluator.
    ///
    /// Fails if the template does not match the mode's placeholders or the
    /// reply token sets are unusable.
    pub fn new(config: &HarnessConfig) -> Result<Self, ConfigurationError> {
        let mode = config.mode;
        let template = PromptTemplate::new(
            config
                .template
                .as_deref()
                .unwrap_or_else(|| mode.default_template()),
        );
        template.validate(mode.as_str(), mode.placeholders())?;

        let parser = VerdictParser::new(&config.affirmative_tokens, &config.negative_tokens)?;

        tracing::debug!(
            mode = %mode,
            custom_template = config.has_custom_template(),
            "Evaluator configured"
        );

        Ok(Self {
            mode,
            template,
            custom_template: config.has_custom_template(),
            parser,
            context_separator: config.context_separator.clone(),
            document_source: config.document_source,
        })
    }

    /// Relevancy evaluator with the built-in prompt.
    pub fn relevancy() -> Self {
        Self::with_defaults(EvaluatorMode::Relevancy)
    }

    /// Fact-checking evaluator with the built-in prompt.
    pub fn fact_checking() -> Self {
        Self::with_defaults(EvaluatorMode::FactChecking)
    }

    fn with_defaults(mode: EvaluatorMode) -> Self {
        Self {
            mode,
            template: PromptTemplate::new(mode.default_template()),
            custom_template: false,
            parser: VerdictParser::default(),
            context_separator: crate::types::DEFAULT_CONTEXT_SEPARATOR.to_string(),
            document_source: DocumentSource::default(),
        }
    }

    pub fn mode(&self) -> EvaluatorMode {
        self.mode
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn parser(&self) -> &VerdictParser {
        &self.parser
    }

    /// Render the judge prompt for `request`.
    pub fn render_prompt(&self, request: &EvaluationRequest) -> String {
        match self.mode {
            EvaluatorMode::Relevancy => {
                let context = request.joined_context(&self.context_separator);
                self.template.render(&[
                    ("query", request.user_text.as_str()),
                    ("response", request.response_text.as_str()),
                    ("context", context.as_str()),
                ])
            }
            EvaluatorMode::FactChecking => {
                let joined;
                let document = match self.document_source {
                    DocumentSource::UserText => request.user_text.as_str(),
                    DocumentSource::Context => {
                        joined = request.joined_context(&self.context_separator);
                        joined.as_str()
                    }
                };
                self.template.render(&[
                    ("document", document),
                    ("claim", request.response_text.as_str()),
                ])
            }
        }
    }

    /// Classify a judge reply into a response.
    ///
    /// Unrecognized replies fail with `confidence = low`; the reply is kept
    /// verbatim in `raw_feedback`.
    pub fn interpret(&self, raw_reply: &str) -> EvaluationResponse {
        let verdict = self.parser.classify(raw_reply);
        let confidence = match verdict {
            Verdict::Ambiguous => "low",
            _ => "high",
        };

        let metadata = Metadata::new()
            .with(keys::MODE, self.mode.as_str())
            .with(
                keys::TEMPLATE,
                if self.custom_template { "custom" } else { "default" },
            )
            .with(keys::VERDICT, verdict.as_str())
            .with(keys::CONFIDENCE, confidence);

        EvaluationResponse::from_verdict(verdict, raw_reply, metadata)
    }
}
