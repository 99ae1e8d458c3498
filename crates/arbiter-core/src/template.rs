//! Prompt templates with named `{placeholder}` substitution.
//!
//! Templates are validated against the placeholders an evaluator mode can
//! supply when they are built, so rendering itself cannot fail.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ConfigurationError;

lazy_static! {
    /// `{name}` where name is an identifier. Braces around anything else
    /// (JSON examples, prose) are left alone.
    static ref PLACEHOLDER_PATTERN: Regex =
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

/// Default relevancy judge prompt.
pub const RELEVANCY_TEMPLATE: &str = "\
Your task is to evaluate if the response for the query is in line with the context information provided.
You have two options to answer. Either YES or NO.
Answer YES, if the response for the query is in line with context information, otherwise NO.

Query:
{query}

Response:
{response}

Context:
{context}

Answer:";

/// Default fact-checking judge prompt.
pub const FACT_CHECK_TEMPLATE: &str = "\
Evaluate whether or not the following claim is supported by the provided document.
Respond with \"yes\" if the claim is supported, or \"no\" if it is not.

Document:
{document}

Claim:
{claim}";

/// A prompt template and the placeholders it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    placeholders: Vec<String>,
}

impl PromptTemplate {
    /// Parse a template, collecting its placeholders in first-use order.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut placeholders: Vec<String> = Vec::new();
        for caps in PLACEHOLDER_PATTERN.captures_iter(&source) {
            let name = &caps[1];
            if !placeholders.iter().any(|p| p == name) {
                placeholders.push(name.to_string());
            }
        }
        Self {
            source,
            placeholders,
        }
    }

    /// The raw template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholders referenced by the template, de-duplicated.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn contains(&self, placeholder: &str) -> bool {
        self.placeholders.iter().any(|p| p == placeholder)
    }

    /// Check that the template uses exactly the `allowed` placeholders.
    ///
    /// Every allowed placeholder must appear; any other placeholder is
    /// rejected because nothing would fill it.
    pub fn validate(&self, mode: &str, allowed: &[&str]) -> Result<(), ConfigurationError> {
        if let Some(missing) = allowed.iter().find(|p| !self.contains(p)) {
            return Err(ConfigurationError::MissingPlaceholder {
                mode: mode.to_string(),
                placeholder: (*missing).to_string(),
            });
        }
        if let Some(unknown) = self
            .placeholders
            .iter()
            .find(|p| !allowed.contains(&p.as_str()))
        {
            return Err(ConfigurationError::UnknownPlaceholder {
                mode: mode.to_string(),
                placeholder: unknown.clone(),
            });
        }
        Ok(())
    }

    /// Substitute placeholders in a single pass.
    ///
    /// Values are inserted verbatim and never re-scanned. Placeholders with no
    /// matching value are kept as written.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        PLACEHOLDER_PATTERN
            .replace_all(&self.source, |caps: &regex::Captures<'_>| {
                let name = &caps[1];
                values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (*value).to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_collected_in_order() {
        let template = PromptTemplate::new("{b} then {a} then {b} again");
        assert_eq!(template.placeholders(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_json_braces_are_not_placeholders() {
        let template = PromptTemplate::new(r#"Reply as {"answer": "yes"} for {claim}"#);
        assert_eq!(template.placeholders(), &["claim".to_string()]);
    }

    #[test]
    fn test_default_templates_have_mode_placeholders() {
        assert!(PromptTemplate::new(RELEVANCY_TEMPLATE)
            .validate("relevancy", &["query", "response", "context"])
            .is_ok());
        assert!(PromptTemplate::new(FACT_CHECK_TEMPLATE)
            .validate("fact_checking", &["document", "claim"])
            .is_ok());
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let template = PromptTemplate::new("Query: {query}\nResponse: {response}");
        let err = template
            .validate("relevancy", &["query", "response", "context"])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingPlaceholder { ref placeholder, .. } if placeholder == "context"
        ));
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let template = PromptTemplate::new("{document} {claim} {evidence}");
        let err = template.validate("fact_checking", &["document", "claim"]).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UnknownPlaceholder { ref placeholder, .. } if placeholder == "evidence"
        ));
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let template = PromptTemplate::new("D: {document}\nC: {claim}");
        let rendered = template.render(&[("document", "contains {claim} literally"), ("claim", "X")]);
        assert_eq!(rendered, "D: contains {claim} literally\nC: X");
    }

    #[test]
    fn test_render_repeated_placeholder() {
        let template = PromptTemplate::new("{claim} / {claim}");
        assert_eq!(template.render(&[("claim", "c")]), "c / c");
    }
}
