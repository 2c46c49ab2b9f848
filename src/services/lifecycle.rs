//! Contribution review workflow: submit, move between statuses, list.
//!
//! Status graph: `pending -> validated`, `pending -> rejected`, and any
//! status to itself (a no-op). `validated` and `rejected` are terminal;
//! moving out of them is an `InvalidStatus` error.
//!
//! Every counter or term write for a language pair happens while holding
//! that pair's lock. A record and its counter change are one store write,
//! so `total == pending + validated + rejected` holds for the stored
//! records at all times. Only the term merge on validation is a separate
//! write; when it fails the record and counters are moved back.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::model::contribution::{
    Contribution, ContributionFilter, ContributionStatus, LanguagePairStats, NewContribution,
    StatsDelta,
};
use crate::model::language::LanguagePair;
use crate::services::normalize::{normalize, normalize_language};
use crate::services::store::{ContributionStore, TermStore};

/// Outcome of a status change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub contribution: Contribution,
    pub previous: ContributionStatus,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.previous != self.contribution.status
    }
}

#[derive(Default)]
struct PairLocks {
    locks: Mutex<HashMap<LanguagePair, Arc<Mutex<()>>>>,
}

impl PairLocks {
    fn for_pair(&self, pair: &LanguagePair) -> Arc<Mutex<()>> {
        self.locks.lock().entry(pair.clone()).or_default().clone()
    }
}

pub struct ContributionManager {
    terms: Arc<dyn TermStore>,
    store: Arc<dyn ContributionStore>,
    supported: BTreeSet<LanguagePair>,
    locks: PairLocks,
}

impl ContributionManager {
    pub fn new(
        terms: Arc<dyn TermStore>,
        store: Arc<dyn ContributionStore>,
        supported: impl IntoIterator<Item = LanguagePair>,
    ) -> Self {
        Self {
            terms,
            store,
            supported: supported.into_iter().collect(),
            locks: PairLocks::default(),
        }
    }

    pub fn is_supported(&self, pair: &LanguagePair) -> bool {
        self.supported.contains(pair)
    }

    pub fn submit(&self, fields: NewContribution) -> Result<Contribution> {
        let source_text = fields.source_text.trim();
        let target_text = fields.target_text.trim();

        if normalize(source_text).is_empty() || target_text.is_empty() {
            return Err(CoreError::validation(
                "source text and target text are required",
            ));
        }

        let pair = LanguagePair::new(&fields.source_language, &fields.target_language)?;
        if !self.is_supported(&pair) {
            return Err(CoreError::UnsupportedPair(pair.key()));
        }

        let now = Utc::now();
        let contribution = Contribution {
            id: Uuid::new_v4(),
            source_text: source_text.to_string(),
            target_text: target_text.to_string(),
            source_language: pair.source().to_string(),
            target_language: pair.target().to_string(),
            source_example: non_empty(fields.source_example),
            target_example: non_empty(fields.target_example),
            status: ContributionStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let lock = self.locks.for_pair(&pair);
        let _guard = lock.lock();

        self.store
            .create_with_stats(&contribution, StatsDelta::submitted())?;

        tracing::info!(
            id = %contribution.id,
            pair = %pair,
            source_text = %contribution.source_text,
            "contribution submitted"
        );

        Ok(contribution)
    }

    pub fn transition(&self, id: &str, new_status: &str) -> Result<Contribution> {
        self.apply_transition(id, new_status)
            .map(|t| t.contribution)
    }

    /// Like [`transition`](Self::transition), also reporting the status the
    /// contribution had before.
    pub fn apply_transition(&self, id: &str, new_status: &str) -> Result<Transition> {
        let new_status: ContributionStatus = new_status.parse()?;
        let id = Uuid::parse_str(id.trim())
            .map_err(|_| CoreError::NotFound(format!("contribution {id}")))?;

        let pair = self.load(id)?.pair()?;
        let lock = self.locks.for_pair(&pair);
        let _guard = lock.lock();

        // Re-read under the lock: another caller may have moved it meanwhile.
        let current = self.load(id)?;
        let previous = current.status;

        if previous == new_status {
            tracing::debug!(id = %id, status = %previous, "status unchanged");
            if previous == ContributionStatus::Validated {
                self.restore_term(&pair, &current)?;
            }
            return Ok(Transition {
                contribution: current,
                previous,
            });
        }

        if previous.is_terminal() {
            return Err(CoreError::InvalidStatus(format!(
                "contribution {id} is already {previous} and cannot move to {new_status}"
            )));
        }

        let mut next = current.clone();
        next.status = new_status;
        next.updated_at = Utc::now();

        let delta = StatsDelta::moved(previous, new_status);
        self.store.update_with_stats(&next, delta)?;

        if new_status == ContributionStatus::Validated {
            let term = normalize(&next.source_text);
            if let Err(e) = self.terms.put(&pair, &term, &next.target_text) {
                match self.store.update_with_stats(&current, delta.inverse()) {
                    Ok(_) => tracing::warn!(id = %id, "rolled back status after failed merge"),
                    // Record and counters still agree; a repeated request re-merges.
                    Err(undo) => tracing::error!(
                        id = %id,
                        error = %undo,
                        "failed to roll back status after failed merge"
                    ),
                }
                return Err(e);
            }
            tracing::info!(pair = %pair, term = %term, "term merged into dictionary");
        }

        tracing::info!(id = %id, from = %previous, to = %new_status, "contribution status updated");

        Ok(Transition {
            contribution: next,
            previous,
        })
    }

    /// Contributions matching `filter`, oldest first. Language names in the
    /// filter are normalized; blank ones match everything.
    pub fn list(&self, filter: ContributionFilter) -> Result<Vec<Contribution>> {
        let filter = ContributionFilter {
            status: filter.status,
            source_language: filter
                .source_language
                .map(|l| normalize_language(&l))
                .filter(|l| !l.is_empty()),
            target_language: filter
                .target_language
                .map(|l| normalize_language(&l))
                .filter(|l| !l.is_empty()),
        };
        self.store.query(&filter)
    }

    pub fn get(&self, id: Uuid) -> Result<Option<Contribution>> {
        self.store.get(id)
    }

    pub fn stats(&self, pair: &LanguagePair) -> Result<LanguagePairStats> {
        Ok(self.store.stats(pair)?.unwrap_or_default())
    }

    pub fn all_stats(&self) -> Result<BTreeMap<LanguagePair, LanguagePairStats>> {
        self.store.all_stats()
    }

    fn load(&self, id: Uuid) -> Result<Contribution> {
        self.store
            .get(id)?
            .ok_or_else(|| CoreError::NotFound(format!("contribution {id}")))
    }

    /// Puts a validated contribution's term back when it is missing, which
    /// only happens after a merge whose rollback also failed.
    fn restore_term(&self, pair: &LanguagePair, contribution: &Contribution) -> Result<()> {
        let term = normalize(&contribution.source_text);
        if self.terms.get(pair)?.contains(&term) {
            return Ok(());
        }

        self.terms.put(pair, &term, &contribution.target_text)?;
        tracing::warn!(pair = %pair, term = %term, "restored missing validated term");
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
