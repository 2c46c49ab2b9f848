use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::services::normalize::normalize_language;

/// Ordered (source, target) pair. Serialized as its `"source-target"` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguagePair {
    source: String,
    target: String,
}

impl LanguagePair {
    /// Normalizes both names. Fails when either is empty afterwards.
    pub fn new(source: &str, target: &str) -> Result<Self, CoreError> {
        let source = normalize_language(source);
        let target = normalize_language(target);

        if source.is_empty() || target.is_empty() {
            return Err(CoreError::validation(
                "source language and target language are required",
            ));
        }

        Ok(Self { source, target })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn key(&self) -> String {
        format!("{}-{}", self.source, self.target)
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

impl FromStr for LanguagePair {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, target) = s
            .split_once('-')
            .ok_or_else(|| CoreError::validation(format!("invalid language pair key: {s:?}")))?;
        LanguagePair::new(source, target)
    }
}

impl TryFrom<String> for LanguagePair {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguagePair> for String {
    fn from(pair: LanguagePair) -> Self {
        pair.key()
    }
}
