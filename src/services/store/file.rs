use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use uuid::Uuid;

use super::{ContributionStore, Ledger, TermStore, TermTable};
use crate::error::{CoreError, Result};
use crate::model::contribution::{Contribution, ContributionFilter, LanguagePairStats, StatsDelta};
use crate::model::language::LanguagePair;
use crate::model::term::TermMapping;

const TERMS_FILE: &str = "terms.json";
const CONTRIBUTIONS_FILE: &str = "contributions.json";

/// JSON files in a data directory, rewritten atomically on every mutation.
///
/// The in-memory state only changes once the new file is on disk, so a
/// failed write leaves both the file and the counters as they were. Locks
/// are taken with a bounded wait and report `Storage` on timeout.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    timeout: Duration,
    terms: RwLock<TermTable>,
    ledger: RwLock<Ledger>,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| CoreError::storage(format!("failed to create {}: {e}", dir.display())))?;

        let terms: TermTable = load(&dir.join(TERMS_FILE))?;
        let ledger: Ledger = load(&dir.join(CONTRIBUTIONS_FILE))?;

        tracing::info!(dir = %dir.display(), "opened json store");

        Ok(Self {
            dir,
            timeout,
            terms: RwLock::new(terms),
            ledger: RwLock::new(ledger),
        })
    }

    fn read<'a, T>(&self, lock: &'a RwLock<T>) -> Result<RwLockReadGuard<'a, T>> {
        lock.try_read_for(self.timeout)
            .ok_or_else(|| CoreError::storage("timed out waiting for store read lock"))
    }

    fn write<'a, T>(&self, lock: &'a RwLock<T>) -> Result<RwLockWriteGuard<'a, T>> {
        lock.try_write_for(self.timeout)
            .ok_or_else(|| CoreError::storage("timed out waiting for store write lock"))
    }

    /// Runs `f` on a copy of the terms, persists the copy, then commits it.
    fn mutate_terms<R>(&self, f: impl FnOnce(&mut TermTable) -> R) -> Result<R> {
        let mut guard = self.write(&self.terms)?;
        let mut next = guard.clone();
        let out = f(&mut next);
        save(&self.dir.join(TERMS_FILE), &next)?;
        *guard = next;
        Ok(out)
    }

    fn mutate_ledger<R>(&self, f: impl FnOnce(&mut Ledger) -> Result<R>) -> Result<R> {
        let mut guard = self.write(&self.ledger)?;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        save(&self.dir.join(CONTRIBUTIONS_FILE), &next)?;
        *guard = next;
        Ok(out)
    }
}

impl TermStore for JsonFileStore {
    fn get(&self, pair: &LanguagePair) -> Result<Arc<TermMapping>> {
        Ok(self.read(&self.terms)?.get(pair))
    }

    fn put(&self, pair: &LanguagePair, term: &str, translation: &str) -> Result<()> {
        self.mutate_terms(|t| t.put(pair, term, translation))
    }

    fn seed(&self, pair: &LanguagePair, mapping: TermMapping) -> Result<usize> {
        self.mutate_terms(|t| t.seed(pair, mapping))
    }

    fn sizes(&self) -> Result<BTreeMap<LanguagePair, usize>> {
        Ok(self.read(&self.terms)?.sizes())
    }
}

impl ContributionStore for JsonFileStore {
    fn create_with_stats(
        &self,
        contribution: &Contribution,
        delta: StatsDelta,
    ) -> Result<LanguagePairStats> {
        self.mutate_ledger(|l| l.create_with_stats(contribution, delta))
    }

    fn get(&self, id: Uuid) -> Result<Option<Contribution>> {
        Ok(self.read(&self.ledger)?.get(id))
    }

    fn update_with_stats(
        &self,
        contribution: &Contribution,
        delta: StatsDelta,
    ) -> Result<LanguagePairStats> {
        self.mutate_ledger(|l| l.update_with_stats(contribution, delta))
    }

    fn query(&self, filter: &ContributionFilter) -> Result<Vec<Contribution>> {
        Ok(self.read(&self.ledger)?.query(filter))
    }

    fn stats(&self, pair: &LanguagePair) -> Result<Option<LanguagePairStats>> {
        Ok(self.read(&self.ledger)?.stats(pair))
    }

    fn all_stats(&self) -> Result<BTreeMap<LanguagePair, LanguagePairStats>> {
        Ok(self.read(&self.ledger)?.all_stats())
    }
}

fn load<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let data = fs::read_to_string(path)
        .map_err(|e| CoreError::storage(format!("failed to read {}: {e}", path.display())))?;

    serde_json::from_str(&data)
        .map_err(|e| CoreError::storage(format!("failed to parse {}: {e}", path.display())))
}

fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes()).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "store write failed");
        e
    })
}

/// Writes next to `path` and persists over it in one rename, which also
/// replaces an existing file on Windows.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
