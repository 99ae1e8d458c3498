//! Judge reply classification.
//!
//! Replies are normalized (whitespace and emphasis/quote characters trimmed,
//! case-folded) and matched against affirmative and negative token sets.
//! A token matches when the reply equals it or starts with it followed by a
//! non-alphanumeric character, so `"No, because..."` is negative while
//! `"yesterday"` is not affirmative. Anything unmatched is `Ambiguous` and
//! fails.

use crate::types::Verdict;
use crate::ConfigurationError;

/// Characters stripped from both ends of a reply before matching.
const WRAPPER_CHARS: &[char] = &['*', '_', '"', '\'', '`'];

/// Affirmative and negative reply tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictParser {
    affirmative: Vec<String>,
    negative: Vec<String>,
}

impl Default for VerdictParser {
    fn default() -> Self {
        Self {
            affirmative: vec!["yes".to_string()],
            negative: vec!["no".to_string()],
        }
    }
}

impl VerdictParser {
    /// Build a parser from token sets. Tokens are case-folded and trimmed.
    pub fn new<A, N>(affirmative: A, negative: N) -> Result<Self, ConfigurationError>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        let affirmative = normalize_tokens(affirmative, "affirmative")?;
        let negative = normalize_tokens(negative, "negative")?;

        if affirmative.is_empty() {
            return Err(ConfigurationError::EmptyTokenSet("affirmative".to_string()));
        }
        if let Some(token) = affirmative.iter().find(|t| negative.contains(t)) {
            return Err(ConfigurationError::ConflictingToken(token.clone()));
        }

        Ok(Self {
            affirmative,
            negative,
        })
    }

    pub fn affirmative_tokens(&self) -> &[String] {
        &self.affirmative
    }

    pub fn negative_tokens(&self) -> &[String] {
        &self.negative
    }

    /// Classify a raw judge reply.
    pub fn classify(&self, reply: &str) -> Verdict {
        let normalized = normalize_reply(reply);

        let best_affirmative = longest_match(&normalized, &self.affirmative);
        let best_negative = longest_match(&normalized, &self.negative);

        match (best_affirmative, best_negative) {
            (Some(a), Some(n)) if a > n => Verdict::Affirmative,
            (Some(_), Some(_)) => Verdict::Negative,
            (Some(_), None) => Verdict::Affirmative,
            (None, Some(_)) => Verdict::Negative,
            (None, None) => Verdict::Ambiguous,
        }
    }
}

fn normalize_tokens<I>(tokens: I, kind: &str) -> Result<Vec<String>, ConfigurationError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        let token = token.as_ref().trim().to_lowercase();
        if token.is_empty() {
            return Err(ConfigurationError::EmptyToken(kind.to_string()));
        }
        if !out.contains(&token) {
            out.push(token);
        }
    }
    Ok(out)
}

/// Trim whitespace and wrapper characters, then case-fold.
pub fn normalize_reply(reply: &str) -> String {
    reply
        .trim()
        .trim_matches(|c: char| c.is_whitespace() || WRAPPER_CHARS.contains(&c))
        .to_lowercase()
}

/// Length of the longest token matching at the start of `normalized`.
fn longest_match(normalized: &str, tokens: &[String]) -> Option<usize> {
    tokens
        .iter()
        .filter(|token| matches_token(normalized, token))
        .map(|token| token.len())
        .max()
}

fn matches_token(normalized: &str, token: &str) -> bool {
    match normalized.strip_prefix(token) {
        Some(rest) => rest.chars().next().map_or(true, |c| !c.is_alphanumeric()),
        None => false,
    }
}
