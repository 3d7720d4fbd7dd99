use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A string with case, punctuation and whitespace variance stripped.
///
/// Only [`normalize`] produces these; equality over `NormalizedTerm` is the
/// cache and knowledge-base key, so every lookup path must go through the
/// same constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedTerm(String);

impl NormalizedTerm {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NormalizedTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalize free text before any similarity lookup.
///
/// NFKC fold, lowercase, punctuation removed, runs of whitespace collapsed to
/// a single space, leading/trailing whitespace trimmed. Empty or
/// whitespace-only input yields the empty term. Idempotent:
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> NormalizedTerm {
    let folded: String = text
        .nfkc()
        .flat_map(char::to_lowercase)
        .filter(|c| !c.is_ascii_punctuation() && *c != '\u{2019}' && *c != '\u{2018}')
        .collect();

    let collapsed = RE_WHITESPACE.replace_all(&folded, " ");
    NormalizedTerm(collapsed.trim().to_string())
}

/// A pair of normalized terms stored in lexicographic order.
///
/// `(A, B)` and `(B, A)` build the same pair, so both orientations land on
/// one cache slot and one knowledge-base lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermPair {
    first: NormalizedTerm,
    second: NormalizedTerm,
}

impl TermPair {
    pub fn new(a: NormalizedTerm, b: NormalizedTerm) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn from_raw(a: &str, b: &str) -> Self {
        Self::new(normalize(a), normalize(b))
    }

    pub fn first(&self) -> &NormalizedTerm {
        &self.first
    }

    pub fn second(&self) -> &NormalizedTerm {
        &self.second
    }

    pub fn identical(&self) -> bool {
        self.first == self.second
    }

    pub fn has_empty_side(&self) -> bool {
        self.first.is_empty() || self.second.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Node.js").as_str(), "nodejs");
        assert_eq!(normalize("C++").as_str(), "c");
        assert_eq!(normalize("  Machine   Learning ").as_str(), "machine learning");
    }

    #[test]
    fn folds_fullwidth_input() {
        assert_eq!(normalize("ＡＷＳ").as_str(), "aws");
    }

    #[test]
    fn empty_input_yields_empty_term() {
        assert!(normalize("").is_empty());
        assert!(normalize("   ").is_empty());
        assert!(normalize("...").is_empty());
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["Node.js", "  Data, Science!  ", "TypeScript", "état de l'art"] {
            let once = normalize(raw);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn pair_order_is_canonical() {
        let ab = TermPair::from_raw("TypeScript", "JavaScript");
        let ba = TermPair::from_raw("JavaScript", "TypeScript");
        assert_eq!(ab, ba);
        assert_eq!(ab.first().as_str(), "javascript");
        assert_eq!(ab.second().as_str(), "typescript");
    }

    #[test]
    fn identical_terms_detected_after_normalization() {
        let pair = TermPair::from_raw("React.JS", "reactjs");
        assert!(pair.identical());
    }
}
