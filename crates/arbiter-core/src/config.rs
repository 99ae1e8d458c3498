//! Harness configuration: evaluator mode, prompt template and reply tokens.
//!
//! Configuration is plain data loaded from YAML or JSON. It is checked when
//! an [`Evaluator`](crate::Evaluator) is built from it, never at call time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::template::{FACT_CHECK_TEMPLATE, RELEVANCY_TEMPLATE};
use crate::types::DEFAULT_CONTEXT_SEPARATOR;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("{mode} template is missing required placeholder {{{placeholder}}}")]
    MissingPlaceholder { mode: String, placeholder: String },

    #[error("{mode} template references unsupported placeholder {{{placeholder}}}")]
    UnknownPlaceholder { mode: String, placeholder: String },

    #[error("{0} token set must not be empty")]
    EmptyTokenSet(String),

    #[error("{0} token set contains a blank token")]
    EmptyToken(String),

    #[error("Token '{0}' is both affirmative and negative")]
    ConflictingToken(String),

    #[error("Unknown evaluator mode: {0}")]
    UnknownMode(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which evaluation the harness performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorMode {
    /// Is the response in line with the query and context?
    Relevancy,

    /// Is the claim supported by the document?
    #[serde(alias = "factchecking", alias = "fact-checking")]
    FactChecking,
}

impl EvaluatorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluatorMode::Relevancy => "relevancy",
            EvaluatorMode::FactChecking => "fact_checking",
        }
    }

    /// Placeholders a template for this mode must contain.
    pub fn placeholders(&self) -> &'static [&'static str] {
        match self {
            EvaluatorMode::Relevancy => &["query", "response", "context"],
            EvaluatorMode::FactChecking => &["document", "claim"],
        }
    }

    /// Built-in prompt for this mode.
    pub fn default_template(&self) -> &'static str {
        match self {
            EvaluatorMode::Relevancy => RELEVANCY_TEMPLATE,
            EvaluatorMode::FactChecking => FACT_CHECK_TEMPLATE,
        }
    }
}

impl fmt::Display for EvaluatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluatorMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relevancy" => Ok(EvaluatorMode::Relevancy),
            "fact_checking" | "factchecking" | "fact-checking" => Ok(EvaluatorMode::FactChecking),
            other => Err(ConfigurationError::UnknownMode(other.to_string())),
        }
    }
}

/// Where fact-checking mode reads the supporting document from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// `EvaluationRequest::user_text`
    #[default]
    UserText,

    /// The joined context items
    Context,
}

fn default_affirmative() -> Vec<String> {
    vec!["yes".to_string()]
}

fn default_negative() -> Vec<String> {
    vec!["no".to_string()]
}

fn default_separator() -> String {
    DEFAULT_CONTEXT_SEPARATOR.to_string()
}

/// Construction-time settings for an evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Evaluator mode
    pub mode: EvaluatorMode,

    /// Custom prompt template (defaults to the mode's built-in prompt)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Replies that pass, e.g. `["yes"]` or `["supported"]`
    #[serde(default = "default_affirmative")]
    pub affirmative_tokens: Vec<String>,

    /// Replies that fail
    #[serde(default = "default_negative")]
    pub negative_tokens: Vec<String>,

    /// Separator placed between context items
    #[serde(default = "default_separator")]
    pub context_separator: String,

    /// Fact-checking document field
    #[serde(default)]
    pub document_source: DocumentSource,
}

impl HarnessConfig {
    /// Defaults for `mode`.
    pub fn new(mode: EvaluatorMode) -> Self {
        Self {
            mode,
            template: None,
            affirmative_tokens: default_affirmative(),
            negative_tokens: default_negative(),
            context_separator: default_separator(),
            document_source: DocumentSource::default(),
        }
    }

    pub fn relevancy() -> Self {
        Self::new(EvaluatorMode::Relevancy)
    }

    pub fn fact_checking() -> Self {
        Self::new(EvaluatorMode::FactChecking)
    }

    /// Override the prompt template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Override the reply token sets.
    pub fn with_tokens<A, N>(mut self, affirmative: A, negative: N) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        self.affirmative_tokens = affirmative.into_iter().map(Into::into).collect();
        self.negative_tokens = negative.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context_separator(mut self, separator: impl Into<String>) -> Self {
        self.context_separator = separator.into();
        self
    }

    pub fn with_document_source(mut self, source: DocumentSource) -> Self {
        self.document_source = source;
        self
    }

    /// Whether a custom template is configured.
    pub fn has_custom_template(&self) -> bool {
        self.template.is_some()
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a file, choosing the format by extension.
    ///
    /// `.json` files are parsed as JSON; anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        if is_json_path(path) {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }
}

/// Whether `path` has a `.json` extension.
pub fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let config = HarnessConfig::from_yaml("mode: relevancy").unwrap();
        assert_eq!(config, HarnessConfig::relevancy());
        assert_eq!(config.context_separator, "\n");
        assert_eq!(config.affirmative_tokens, vec!["yes"]);
    }

    #[test]
    fn test_mode_aliases() {
        let config = HarnessConfig::from_yaml("mode: factchecking").unwrap();
        assert_eq!(config.mode, EvaluatorMode::FactChecking);
        assert_eq!("Fact-Checking".parse::<EvaluatorMode>().unwrap(), EvaluatorMode::FactChecking);
        assert!(matches!(
            "sentiment".parse::<EvaluatorMode>(),
            Err(ConfigurationError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_full_json_config() {
        let json = r#"{
            "mode": "fact_checking",
            "template": "Doc: {document}\nClaim: {claim}",
            "affirmative_tokens": ["SUPPORTED"],
            "negative_tokens": ["UNSUPPORTED"],
            "document_source": "context"
        }"#;
        let config = HarnessConfig::from_json(json).unwrap();
        assert!(config.has_custom_template());
        assert_eq!(config.document_source, DocumentSource::Context);
        assert_eq!(config.negative_tokens, vec!["UNSUPPORTED"]);
    }

    #[test]
    fn test_unknown_mode_fails_to_parse() {
        let result = HarnessConfig::from_yaml("mode: sentiment");
        assert!(matches!(result, Err(ConfigurationError::Yaml(_))));
    }

    #[test]
    fn test_json_extension_detection() {
        assert!(is_json_path(Path::new("harness.JSON")));
        assert!(!is_json_path(Path::new("harness.yaml")));
        assert!(!is_json_path(Path::new("harness")));
    }
}
