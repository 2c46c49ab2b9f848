use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::language::LanguagePair;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContributionStatus {
    Pending,
    Validated,
    Rejected,
}

impl ContributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionStatus::Pending => "pending",
            ContributionStatus::Validated => "validated",
            ContributionStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ContributionStatus::Pending)
    }
}

impl Default for ContributionStatus {
    fn default() -> Self {
        ContributionStatus::Pending
    }
}

impl fmt::Display for ContributionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContributionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ContributionStatus::Pending),
            "validated" => Ok(ContributionStatus::Validated),
            "rejected" => Ok(ContributionStatus::Rejected),
            _ => Err(CoreError::InvalidStatus(format!(
                "{s:?} (must be pending, validated, or rejected)"
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub id: Uuid,

    pub source_text: String,
    pub target_text: String,

    pub source_language: String,
    pub target_language: String,

    #[serde(default)]
    pub source_example: Option<String>,

    #[serde(default)]
    pub target_example: Option<String>,

    #[serde(default)]
    pub status: ContributionStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contribution {
    pub fn pair(&self) -> Result<LanguagePair, CoreError> {
        LanguagePair::new(&self.source_language, &self.target_language)
    }
}

/// Raw submission fields, before normalization.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NewContribution {
    #[serde(default)]
    pub source_text: String,

    #[serde(default)]
    pub target_text: String,

    #[serde(default)]
    pub source_language: String,

    #[serde(default)]
    pub target_language: String,

    #[serde(default)]
    pub source_example: Option<String>,

    #[serde(default)]
    pub target_example: Option<String>,
}

/// Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionFilter {
    pub status: Option<ContributionStatus>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
}

impl ContributionFilter {
    pub fn matches(&self, c: &Contribution) -> bool {
        self.status.map_or(true, |s| s == c.status)
            && self
                .source_language
                .as_deref()
                .map_or(true, |l| l == c.source_language)
            && self
                .target_language
                .as_deref()
                .map_or(true, |l| l == c.target_language)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguagePairStats {
    pub total: u64,
    pub pending: u64,
    pub validated: u64,
    pub rejected: u64,
}

impl LanguagePairStats {
    pub fn is_consistent(&self) -> bool {
        self.pending + self.validated + self.rejected == self.total
    }

    /// Applies `delta`, or returns `None` if a counter would go negative.
    pub fn apply(&self, delta: StatsDelta) -> Option<LanguagePairStats> {
        Some(LanguagePairStats {
            total: shift(self.total, delta.total)?,
            pending: shift(self.pending, delta.pending)?,
            validated: shift(self.validated, delta.validated)?,
            rejected: shift(self.rejected, delta.rejected)?,
        })
    }
}

fn shift(value: u64, by: i64) -> Option<u64> {
    if by >= 0 {
        value.checked_add(by as u64)
    } else {
        value.checked_sub(by.unsigned_abs())
    }
}

/// Counter change applied atomically by a contribution store. Every delta
/// built here keeps `total == pending + validated + rejected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsDelta {
    total: i64,
    pending: i64,
    validated: i64,
    rejected: i64,
}

impl StatsDelta {
    pub fn submitted() -> Self {
        StatsDelta {
            total: 1,
            pending: 1,
            ..StatsDelta::default()
        }
    }

    pub fn moved(from: ContributionStatus, to: ContributionStatus) -> Self {
        let mut d = StatsDelta::default();
        *d.slot(from) -= 1;
        *d.slot(to) += 1;
        d
    }

    pub fn inverse(&self) -> Self {
        StatsDelta {
            total: -self.total,
            pending: -self.pending,
            validated: -self.validated,
            rejected: -self.rejected,
        }
    }

    fn slot(&mut self, status: ContributionStatus) -> &mut i64 {
        match status {
            ContributionStatus::Pending => &mut self.pending,
            ContributionStatus::Validated => &mut self.validated,
            ContributionStatus::Rejected => &mut self.rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!(
            "Validated".parse::<ContributionStatus>().unwrap(),
            ContributionStatus::Validated
        );
        assert!(matches!(
            "approved".parse::<ContributionStatus>(),
            Err(CoreError::InvalidStatus(_))
        ));
    }

    #[test]
    fn deltas_keep_stats_consistent() {
        let stats = LanguagePairStats::default()
            .apply(StatsDelta::submitted())
            .and_then(|s| s.apply(StatsDelta::submitted()))
            .and_then(|s| {
                s.apply(StatsDelta::moved(
                    ContributionStatus::Pending,
                    ContributionStatus::Rejected,
                ))
            })
            .unwrap();

        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.rejected, 1);
        assert!(stats.is_consistent());
    }

    #[test]
    fn inverse_undoes_delta() {
        let d = StatsDelta::moved(ContributionStatus::Pending, ContributionStatus::Validated);
        let start = LanguagePairStats {
            total: 1,
            pending: 1,
            ..LanguagePairStats::default()
        };
        let moved = start.apply(d).unwrap();
        assert_eq!(moved.apply(d.inverse()).unwrap(), start);
    }

    #[test]
    fn apply_refuses_underflow() {
        let d = StatsDelta::moved(ContributionStatus::Pending, ContributionStatus::Validated);
        assert!(LanguagePairStats::default().apply(d).is_none());
    }

    #[test]
    fn filter_matches_unset_fields() {
        let now = Utc::now();
        let c = Contribution {
            id: Uuid::new_v4(),
            source_text: "merci".into(),
            target_text: "pua' sʉn".into(),
            source_language: "french".into(),
            target_language: "ghomala".into(),
            source_example: None,
            target_example: None,
            status: ContributionStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        assert!(ContributionFilter::default().matches(&c));
        assert!(ContributionFilter {
            source_language: Some("french".into()),
            ..Default::default()
        }
        .matches(&c));
        assert!(!ContributionFilter {
            status: Some(ContributionStatus::Validated),
            ..Default::default()
        }
        .matches(&c));
    }
}
