//! Token matching strategies for the listing scan
//!
//! The shipped models were trained on plain substring containment, which
//! also fires when a token appears inside an unrelated identifier
//! (`onBinder` contains `onBind`). That heuristic stays the default.
//! [`WordBoundaryMatcher`] is available for experiments but changes the
//! feature distribution the models see.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Decides whether a feature token occurs in a listing text
pub trait TokenMatcher: Send + Sync {
    fn contains(&self, token: &str, text: &str) -> bool;
}

/// Plain substring containment
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl TokenMatcher for SubstringMatcher {
    fn contains(&self, token: &str, text: &str) -> bool {
        text.contains(token)
    }
}

/// Substring containment that rejects matches glued to identifier characters
#[derive(Debug, Clone, Copy, Default)]
pub struct WordBoundaryMatcher;

impl WordBoundaryMatcher {
    fn is_ident_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_' || c == '$'
    }
}

impl TokenMatcher for WordBoundaryMatcher {
    fn contains(&self, token: &str, text: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        text.match_indices(token).any(|(start, _)| {
            let end = start + token.len();
            let before_ok = text[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !Self::is_ident_char(c));
            let after_ok = text[end..]
                .chars()
                .next()
                .map_or(true, |c| !Self::is_ident_char(c));
            before_ok && after_ok
        })
    }
}

/// Matcher selection for configuration and CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MatcherKind {
    /// Plain substring containment (what the models were trained on)
    #[default]
    Substring,
    /// Substring containment bounded by non-identifier characters
    WordBoundary,
}

impl MatcherKind {
    pub fn build(self) -> Box<dyn TokenMatcher> {
        match self {
            MatcherKind::Substring => Box::new(SubstringMatcher),
            MatcherKind::WordBoundary => Box::new(WordBoundaryMatcher),
        }
    }
}
