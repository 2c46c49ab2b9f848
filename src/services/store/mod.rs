//! Storage collaborators consumed by the resolver and the lifecycle manager.

pub mod file;
pub mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::model::contribution::{Contribution, ContributionFilter, LanguagePairStats, StatsDelta};
use crate::model::language::LanguagePair;
use crate::model::term::TermMapping;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

pub trait TermStore: Send + Sync {
    /// Snapshot of the pair's terms; empty when the pair has none yet.
    /// Later writes never show through a snapshot already handed out.
    fn get(&self, pair: &LanguagePair) -> Result<Arc<TermMapping>>;

    /// Inserts or replaces a single term.
    fn put(&self, pair: &LanguagePair, term: &str, translation: &str) -> Result<()>;

    /// Adds the terms of `mapping` that the pair does not have yet.
    /// Returns how many were added.
    fn seed(&self, pair: &LanguagePair, mapping: TermMapping) -> Result<usize>;

    fn sizes(&self) -> Result<BTreeMap<LanguagePair, usize>>;
}

/// Records and per-pair counters. Every write takes the record and the
/// counter change for its pair together, so either both land or neither.
pub trait ContributionStore: Send + Sync {
    /// Inserts a new record and applies `delta` to its pair's counters,
    /// starting from zeroed counters for an unseen pair. Returns the new
    /// counters.
    fn create_with_stats(
        &self,
        contribution: &Contribution,
        delta: StatsDelta,
    ) -> Result<LanguagePairStats>;

    fn get(&self, id: Uuid) -> Result<Option<Contribution>>;

    /// Replaces an existing record and applies `delta` to its pair's
    /// counters. Unknown ids are a `NotFound` error.
    fn update_with_stats(
        &self,
        contribution: &Contribution,
        delta: StatsDelta,
    ) -> Result<LanguagePairStats>;

    /// Matching contributions in creation order.
    fn query(&self, filter: &ContributionFilter) -> Result<Vec<Contribution>>;

    fn stats(&self, pair: &LanguagePair) -> Result<Option<LanguagePairStats>>;

    fn all_stats(&self) -> Result<BTreeMap<LanguagePair, LanguagePairStats>>;
}

/// Per-pair term mappings, shared by both store implementations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct TermTable {
    pairs: BTreeMap<LanguagePair, Arc<TermMapping>>,
}

impl TermTable {
    pub(crate) fn get(&self, pair: &LanguagePair) -> Arc<TermMapping> {
        self.pairs.get(pair).cloned().unwrap_or_default()
    }

    pub(crate) fn put(&mut self, pair: &LanguagePair, term: &str, translation: &str) {
        let mapping = self.pairs.entry(pair.clone()).or_default();
        // Copy-on-write: readers holding the old Arc keep their snapshot.
        Arc::make_mut(mapping).insert(term.to_string(), translation.to_string());
    }

    pub(crate) fn seed(&mut self, pair: &LanguagePair, seed: TermMapping) -> usize {
        let mapping = self.pairs.entry(pair.clone()).or_default();
        let missing: Vec<(&str, &str)> = seed.iter().filter(|(k, _)| !mapping.contains(k)).collect();
        if missing.is_empty() {
            return 0;
        }

        let target = Arc::make_mut(mapping);
        for (term, translation) in &missing {
            target.insert(term.to_string(), translation.to_string());
        }
        missing.len()
    }

    pub(crate) fn sizes(&self) -> BTreeMap<LanguagePair, usize> {
        self.pairs
            .iter()
            .map(|(pair, mapping)| (pair.clone(), mapping.len()))
            .collect()
    }
}

/// Contributions by id plus per-pair counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Ledger {
    #[serde(default)]
    contributions: IndexMap<Uuid, Contribution>,

    #[serde(default)]
    stats: BTreeMap<LanguagePair, LanguagePairStats>,
}

impl Ledger {
    pub(crate) fn create_with_stats(
        &mut self,
        contribution: &Contribution,
        delta: StatsDelta,
    ) -> Result<LanguagePairStats> {
        if self.contributions.contains_key(&contribution.id) {
            return Err(CoreError::storage(format!(
                "contribution {} already exists",
                contribution.id
            )));
        }
        self.commit(contribution, delta)
    }

    pub(crate) fn get(&self, id: Uuid) -> Option<Contribution> {
        self.contributions.get(&id).cloned()
    }

    pub(crate) fn update_with_stats(
        &mut self,
        contribution: &Contribution,
        delta: StatsDelta,
    ) -> Result<LanguagePairStats> {
        if !self.contributions.contains_key(&contribution.id) {
            return Err(CoreError::NotFound(format!(
                "contribution {}",
                contribution.id
            )));
        }
        self.commit(contribution, delta)
    }

    pub(crate) fn query(&self, filter: &ContributionFilter) -> Vec<Contribution> {
        self.contributions
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect()
    }

    /// Checks the counters first so a refused delta leaves the record alone.
    /// Re-inserting an existing id keeps its creation-order slot.
    fn commit(&mut self, contribution: &Contribution, delta: StatsDelta) -> Result<LanguagePairStats> {
        let pair = contribution.pair()?;
        let current = self.stats.get(&pair).copied().unwrap_or_default();
        let next = current.apply(delta).ok_or_else(|| {
            CoreError::storage(format!("counter underflow for {pair} applying {delta:?}"))
        })?;

        self.contributions
            .insert(contribution.id, contribution.clone());
        self.stats.insert(pair, next);
        Ok(next)
    }

    pub(crate) fn stats(&self, pair: &LanguagePair) -> Option<LanguagePairStats> {
        self.stats.get(pair).copied()
    }

    pub(crate) fn all_stats(&self) -> BTreeMap<LanguagePair, LanguagePairStats> {
        self.stats.clone()
    }
}
