use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use super::{ContributionStore, Ledger, TermStore, TermTable};
use crate::error::Result;
use crate::model::contribution::{Contribution, ContributionFilter, LanguagePairStats, StatsDelta};
use crate::model::language::LanguagePair;
use crate::model::term::TermMapping;

/// Process-lifetime store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    terms: RwLock<TermTable>,
    ledger: RwLock<Ledger>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TermStore for MemoryStore {
    fn get(&self, pair: &LanguagePair) -> Result<Arc<TermMapping>> {
        Ok(self.terms.read().get(pair))
    }

    fn put(&self, pair: &LanguagePair, term: &str, translation: &str) -> Result<()> {
        self.terms.write().put(pair, term, translation);
        Ok(())
    }

    fn seed(&self, pair: &LanguagePair, mapping: TermMapping) -> Result<usize> {
        Ok(self.terms.write().seed(pair, mapping))
    }

    fn sizes(&self) -> Result<BTreeMap<LanguagePair, usize>> {
        Ok(self.terms.read().sizes())
    }
}

impl ContributionStore for MemoryStore {
    fn create_with_stats(
        &self,
        contribution: &Contribution,
        delta: StatsDelta,
    ) -> Result<LanguagePairStats> {
        self.ledger.write().create_with_stats(contribution, delta)
    }

    fn get(&self, id: Uuid) -> Result<Option<Contribution>> {
        Ok(self.ledger.read().get(id))
    }

    fn update_with_stats(
        &self,
        contribution: &Contribution,
        delta: StatsDelta,
    ) -> Result<LanguagePairStats> {
        self.ledger.write().update_with_stats(contribution, delta)
    }

    fn query(&self, filter: &ContributionFilter) -> Result<Vec<Contribution>> {
        Ok(self.ledger.read().query(filter))
    }

    fn stats(&self, pair: &LanguagePair) -> Result<Option<LanguagePairStats>> {
        Ok(self.ledger.read().stats(pair))
    }

    fn all_stats(&self) -> Result<BTreeMap<LanguagePair, LanguagePairStats>> {
        Ok(self.ledger.read().all_stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> LanguagePair {
        LanguagePair::new("english", "ghomala").unwrap()
    }

    #[test]
    fn snapshot_is_not_affected_by_later_puts() {
        let store = MemoryStore::new();
        store.put(&pair(), "hello", "mbʉ́ nà").unwrap();

        let before = TermStore::get(&store, &pair()).unwrap();
        store.put(&pair(), "thank you", "pua' sʉn").unwrap();
        let after = TermStore::get(&store, &pair()).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn seed_keeps_existing_terms() {
        let store = MemoryStore::new();
        store.put(&pair(), "hello", "validated").unwrap();

        let added = store
            .seed(
                &pair(),
                [("hello", "seeded"), ("thank you", "pua' sʉn")]
                    .into_iter()
                    .collect(),
            )
            .unwrap();

        assert_eq!(added, 1);
        let terms = TermStore::get(&store, &pair()).unwrap();
        assert_eq!(terms.get("hello"), Some("validated"));
        assert_eq!(store.sizes().unwrap().get(&pair()), Some(&2));
    }

    #[test]
    fn unknown_pair_reads_empty() {
        let store = MemoryStore::new();
        assert!(TermStore::get(&store, &pair()).unwrap().is_empty());
        assert_eq!(store.stats(&pair()).unwrap(), None);
    }
}
