//! Value types exchanged with the evaluation harness.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Separator used to join context items when none is configured.
pub const DEFAULT_CONTEXT_SEPARATOR: &str = "\n";

/// A retrieved context fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextItem {
    /// The fragment text
    pub text: String,

    /// Optional source metadata (document id, score, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ContextItem {
    /// Create a context item without metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl From<&str> for ContextItem {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for ContextItem {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// A single evaluation input.
///
/// In relevancy mode `user_text` is the user query and `response_text` the
/// generated answer. In fact-checking mode `user_text` carries the supporting
/// document and `response_text` the claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Original user query (or document, when fact-checking)
    #[serde(alias = "userText")]
    pub user_text: String,

    /// Retrieved supporting material, in retrieval order
    #[serde(default, alias = "contextItems")]
    pub context_items: Vec<ContextItem>,

    /// The answer or claim under evaluation
    #[serde(alias = "responseText")]
    pub response_text: String,
}

impl EvaluationRequest {
    /// Create a request with no context.
    pub fn new(user_text: impl Into<String>, response_text: impl Into<String>) -> Self {
        Self {
            user_text: user_text.into(),
            context_items: Vec::new(),
            response_text: response_text.into(),
        }
    }

    /// Create a fact-checking request from a document and a claim.
    pub fn fact_check(document: impl Into<String>, claim: impl Into<String>) -> Self {
        Self::new(document, claim)
    }

    /// Replace the context items.
    pub fn with_context<I, C>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ContextItem>,
    {
        self.context_items = items.into_iter().map(Into::into).collect();
        self
    }

    /// Join context item texts in order with `separator`.
    pub fn joined_context(&self, separator: &str) -> String {
        self.context_items
            .iter()
            .map(|item| item.text.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Classification of a judge reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Reply matched an affirmative token
    Affirmative,
    /// Reply matched a negative token
    Negative,
    /// Reply matched neither; treated as a failing verdict
    Ambiguous,
}

impl Verdict {
    /// Whether this verdict passes. Only affirmative replies pass.
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Affirmative)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Affirmative => "affirmative",
            Verdict::Negative => "negative",
            Verdict::Ambiguous => "ambiguous",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String key/value pairs that keep insertion order.
///
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetadataVisitor;

        impl<'de> Visitor<'de> for MetadataVisitor {
            type Value = Metadata;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of string keys to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Metadata, A::Error> {
                let mut metadata = Metadata::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    metadata.insert(k, v);
                }
                Ok(metadata)
            }
        }

        deserializer.deserialize_map(MetadataVisitor)
    }
}

/// The outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    /// Pass/fail verdict
    pub pass: bool,

    /// How the judge reply was classified
    pub verdict: Verdict,

    /// The judge reply, unmodified
    #[serde(alias = "rawFeedback")]
    pub raw_feedback: String,

    /// Auxiliary details (mode, template, verdict, confidence, ...)
    #[serde(default)]
    pub metadata: Metadata,
}

impl EvaluationResponse {
    /// Build a response from a classified reply.
    pub fn from_verdict(verdict: Verdict, raw_feedback: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            pass: verdict.is_pass(),
            verdict,
            raw_feedback: raw_feedback.into(),
            metadata,
        }
    }

    /// Whether the verdict came from an unrecognized reply.
    pub fn is_ambiguous(&self) -> bool {
        self.verdict == Verdict::Ambiguous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_context_preserves_order() {
        let request = EvaluationRequest::new("q", "a").with_context(["first", "second", "third"]);
        assert_eq!(request.joined_context("\n"), "first\nsecond\nthird");
        assert_eq!(request.joined_context(" | "), "first | second | third");
    }

    #[test]
    fn test_joined_context_empty() {
        let request = EvaluationRequest::new("q", "a");
        assert_eq!(request.joined_context(DEFAULT_CONTEXT_SEPARATOR), "");
    }

    #[test]
    fn test_request_accepts_camel_case_json() {
        let json = r#"{
            "userText": "Where does the adventure take place?",
            "contextItems": [{"text": "The story is set in a forest.", "metadata": {"source": "doc-1"}}],
            "responseText": "In a forest."
        }"#;
        let request: EvaluationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.context_items.len(), 1);
        assert_eq!(
            request.context_items[0].metadata.get("source").map(String::as_str),
            Some("doc-1")
        );
        assert_eq!(request.response_text, "In a forest.");
    }

    #[test]
    fn test_metadata_keeps_insertion_order() {
        let mut metadata = Metadata::new();
        metadata.insert("zeta", "1");
        metadata.insert("alpha", "2");
        metadata.insert("mid", "3");
        metadata.insert("zeta", "4");

        let keys: Vec<_> = metadata.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(metadata.get("zeta"), Some("4"));
        assert_eq!(metadata.len(), 3);
    }

    #[test]
    fn test_metadata_serializes_in_order() {
        let metadata = Metadata::new().with("mode", "relevancy").with("confidence", "high");
        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, r#"{"mode":"relevancy","confidence":"high"}"#);
    }

    #[test]
    fn test_only_affirmative_passes() {
        assert!(Verdict::Affirmative.is_pass());
        assert!(!Verdict::Negative.is_pass());
        assert!(!Verdict::Ambiguous.is_pass());
    }
}
