use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Normalized source term -> translation, kept in insertion order so fuzzy
/// tie-breaks are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermMapping {
    entries: IndexMap<String, String>,
}

impl TermMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, term: &str) -> Option<&str> {
        self.entries.get(term).map(String::as_str)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.entries.contains_key(term)
    }

    /// Replaces the translation of an existing term in place, keeping its
    /// position. Returns the previous translation.
    pub fn insert(&mut self, term: String, translation: String) -> Option<String> {
        self.entries.insert(term, translation)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TermMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Fuzzy,
    None,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub query_text: String,
    pub translation: String,
    pub match_type: MatchType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_term: Option<String>,
}

impl MatchResult {
    pub fn exact(query: &str, translation: &str) -> Self {
        Self {
            query_text: query.to_string(),
            translation: translation.to_string(),
            match_type: MatchType::Exact,
            score: None,
            matched_term: None,
        }
    }

    pub fn fuzzy(query: &str, translation: &str, score: u8, matched_term: &str) -> Self {
        Self {
            query_text: query.to_string(),
            translation: translation.to_string(),
            match_type: MatchType::Fuzzy,
            score: Some(score),
            matched_term: Some(matched_term.to_string()),
        }
    }

    pub fn none(query: &str) -> Self {
        Self {
            query_text: query.to_string(),
            translation: format!("Sorry, no translation found for '{query}'"),
            match_type: MatchType::None,
            score: None,
            matched_term: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.match_type != MatchType::None
    }
}
