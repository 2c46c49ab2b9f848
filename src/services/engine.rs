use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use crate::config::Settings;
use crate::error::{CoreError, Result};
use crate::model::contribution::LanguagePairStats;
use crate::model::language::LanguagePair;
use crate::model::term::MatchResult;
use crate::services::lifecycle::ContributionManager;
use crate::services::normalize::normalize;
use crate::services::store::{ContributionStore, JsonFileStore, MemoryStore, TermStore};
use crate::services::{dictionary, resolver};

#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    #[serde(flatten)]
    pub result: MatchResult,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Languages {
    pub source_languages: Vec<String>,
    pub target_languages: Vec<String>,
    pub pairs: Vec<LanguagePair>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub dictionaries: BTreeMap<LanguagePair, usize>,
    pub contributions: BTreeMap<LanguagePair, LanguagePairStats>,
}

/// Request-facing entry point: normalizes input, checks pairs against the
/// configuration, and routes to the resolver or the contribution manager.
pub struct Engine {
    settings: Settings,
    terms: Arc<dyn TermStore>,
    contributions: ContributionManager,
}

impl Engine {
    pub fn new(
        settings: Settings,
        terms: Arc<dyn TermStore>,
        contributions: Arc<dyn ContributionStore>,
    ) -> Self {
        let manager = ContributionManager::new(
            terms.clone(),
            contributions,
            settings.supported_pairs.iter().cloned(),
        );
        Self {
            settings,
            terms,
            contributions: manager,
        }
    }

    pub fn in_memory(settings: Settings) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(settings, store.clone(), store)
    }

    /// Opens the configured store and seeds the dictionaries.
    pub fn bootstrap(settings: Settings) -> Result<Self> {
        let engine = match settings.data_dir.clone() {
            Some(dir) => {
                let store = Arc::new(JsonFileStore::open(dir, settings.storage_timeout())?);
                Self::new(settings, store.clone(), store)
            }
            None => {
                tracing::info!("no data_dir configured, contributions are kept in memory");
                Self::in_memory(settings)
            }
        };

        let added = engine.seed_dictionaries()?;
        tracing::info!(added, "dictionaries seeded");

        Ok(engine)
    }

    /// Loads seed dictionaries into the term store without overwriting
    /// existing terms. Returns how many terms were added.
    pub fn seed_dictionaries(&self) -> Result<usize> {
        let seeds = match &self.settings.dictionaries_dir {
            Some(dir) if dir.is_dir() => {
                let loaded = dictionary::load_dir(dir)?;
                if loaded.is_empty() {
                    tracing::warn!(dir = %dir.display(), "no dictionary files found, using samples");
                    dictionary::builtin()
                } else {
                    loaded
                }
            }
            Some(dir) => {
                tracing::warn!(dir = %dir.display(), "dictionary directory missing, using samples");
                dictionary::builtin()
            }
            None => dictionary::builtin(),
        };

        let mut added = 0;
        for (pair, terms) in seeds {
            if !self.contributions.is_supported(&pair) {
                tracing::warn!(pair = %pair, "skipping dictionary for unsupported pair");
                continue;
            }
            added += self.terms.seed(&pair, terms)?;
        }
        Ok(added)
    }

    pub fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<Translation> {
        let query = normalize(text);
        if query.is_empty() {
            return Err(CoreError::validation("no text provided for translation"));
        }

        let pair = self.supported_pair(source_lang, target_lang)?;
        let terms = self.terms.get(&pair)?;
        let result = resolver::resolve(&query, &terms, self.settings.fuzzy_threshold);

        tracing::debug!(
            pair = %pair,
            query = %query,
            match_type = ?result.match_type,
            score = ?result.score,
            "resolved"
        );

        Ok(Translation {
            result,
            source_lang: pair.source().to_string(),
            target_lang: pair.target().to_string(),
        })
    }

    pub fn languages(&self) -> Languages {
        let pairs = &self.settings.supported_pairs;
        let sources: BTreeSet<&str> = pairs.iter().map(LanguagePair::source).collect();
        let targets: BTreeSet<&str> = pairs.iter().map(LanguagePair::target).collect();

        Languages {
            source_languages: sources.into_iter().map(String::from).collect(),
            target_languages: targets.into_iter().map(String::from).collect(),
            pairs: pairs.clone(),
        }
    }

    pub fn stats(&self) -> Result<Stats> {
        let mut dictionaries = self.terms.sizes()?;
        for pair in &self.settings.supported_pairs {
            dictionaries.entry(pair.clone()).or_insert(0);
        }

        Ok(Stats {
            dictionaries,
            contributions: self.contributions.all_stats()?,
        })
    }

    pub fn contributions(&self) -> &ContributionManager {
        &self.contributions
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn supported_pair(&self, source_lang: &str, target_lang: &str) -> Result<LanguagePair> {
        let pair = LanguagePair::new(source_lang, target_lang)
            .map_err(|_| CoreError::validation("source or target language not specified"))?;
        if !self.contributions.is_supported(&pair) {
            return Err(CoreError::UnsupportedPair(pair.key()));
        }
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::contribution::NewContribution;
    use crate::model::term::MatchType;

    fn engine() -> Engine {
        let engine = Engine::in_memory(Settings::default());
        engine.seed_dictionaries().unwrap();
        engine
    }

    #[test]
    fn translate_normalizes_input() {
        let t = engine().translate("  HELLO ", "English", "Ghomála").unwrap();
        assert_eq!(t.result.match_type, MatchType::Exact);
        assert_eq!(t.result.translation, "mbʉ́ nà");
        assert_eq!(t.source_lang, "english");
        assert_eq!(t.target_lang, "ghomala");
    }

    #[test]
    fn decomposed_accents_match_exactly() {
        let err = engine()
            .translate("Me\u{301}rci", "Franc\u{327}ais", "Ghomala")
            .unwrap_err();
        // "francais" is not configured, but the name itself folded
        assert_eq!(err, CoreError::UnsupportedPair("francais-ghomala".into()));

        let t = engine().translate("Me\u{301}rci", "french", "ghomala").unwrap();
        assert_eq!(t.result.match_type, MatchType::Exact);
        assert_eq!(t.result.query_text, "merci");
    }

    #[test]
    fn translate_fuzzy_uses_configured_threshold() {
        let t = engine().translate("helo", "english", "ghomala").unwrap();
        assert_eq!(t.result.match_type, MatchType::Fuzzy);
        assert_eq!(t.result.matched_term.as_deref(), Some("hello"));

        let strict = Engine::in_memory(Settings {
            fuzzy_threshold: 95,
            ..Settings::default()
        });
        strict.seed_dictionaries().unwrap();
        let t = strict.translate("helo", "english", "ghomala").unwrap();
        assert_eq!(t.result.match_type, MatchType::None);
    }

    #[test]
    fn translate_errors() {
        let e = engine();
        assert!(matches!(
            e.translate(" ", "english", "ghomala"),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            e.translate("hello", "", "ghomala"),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            e.translate("hello", "klingon", "ghomala"),
            Err(CoreError::UnsupportedPair(_))
        ));
    }

    #[test]
    fn supported_pair_without_dictionary_resolves_to_none() {
        let t = engine().translate("mbʉ́", "ghomala", "french").unwrap();
        assert_eq!(t.result.match_type, MatchType::None);
    }

    #[test]
    fn validated_contribution_becomes_translatable() {
        let e = engine();
        let c = e
            .contributions()
            .submit(NewContribution {
                source_text: "Bonsoir".into(),
                target_text: "mbʉ́ zʉ̀".into(),
                source_language: "french".into(),
                target_language: "ghomala".into(),
                ..Default::default()
            })
            .unwrap();

        let before = e.translate("bonsoir", "french", "ghomala").unwrap();
        assert_ne!(before.result.match_type, MatchType::Exact);

        e.contributions()
            .transition(&c.id.to_string(), "validated")
            .unwrap();

        let after = e.translate("bonsoir", "french", "ghomala").unwrap();
        assert_eq!(after.result.match_type, MatchType::Exact);
        assert_eq!(after.result.translation, "mbʉ́ zʉ̀");
    }

    #[test]
    fn languages_and_stats() {
        let e = engine();
        let langs = e.languages();
        assert_eq!(langs.source_languages, vec!["english", "french", "ghomala"]);
        assert_eq!(
            langs.target_languages,
            vec!["english", "french", "fulfulde", "ghomala"]
        );

        let stats = e.stats().unwrap();
        assert_eq!(stats.dictionaries.len(), 6);
        assert_eq!(
            stats.dictionaries[&"french-ghomala".parse::<LanguagePair>().unwrap()],
            2
        );
        assert_eq!(
            stats.dictionaries[&"ghomala-english".parse::<LanguagePair>().unwrap()],
            0
        );
        assert!(stats.contributions.is_empty());
    }

    #[test]
    fn bootstrap_persists_validated_terms() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            data_dir: Some(dir.path().join("data")),
            ..Settings::default()
        };

        let id = {
            let e = Engine::bootstrap(settings.clone()).unwrap();
            let c = e
                .contributions()
                .submit(NewContribution {
                    source_text: "hello".into(),
                    target_text: "a new greeting".into(),
                    source_language: "english".into(),
                    target_language: "ghomala".into(),
                    ..Default::default()
                })
                .unwrap();
            e.contributions()
                .transition(&c.id.to_string(), "validated")
                .unwrap();
            c.id
        };

        // Seeding on restart must not clobber the validated term.
        let e = Engine::bootstrap(settings).unwrap();
        let t = e.translate("hello", "english", "ghomala").unwrap();
        assert_eq!(t.result.translation, "a new greeting");
        assert_eq!(
            e.contributions().get(id).unwrap().unwrap().status.as_str(),
            "validated"
        );
    }

    #[test]
    fn seeds_from_dictionary_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("english_fulfulde.json"),
            r#"{"water": "ndiyam", "Good Morning": "jam waali"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("klingon_english.json"), r#"{"qapla": "success"}"#).unwrap();

        let e = Engine::in_memory(Settings {
            dictionaries_dir: Some(dir.path().to_path_buf()),
            ..Settings::default()
        });
        assert_eq!(e.seed_dictionaries().unwrap(), 2);

        let t = e.translate("good morning", "english", "fulfulde").unwrap();
        assert_eq!(t.result.translation, "jam waali");
        let english_ghomala: LanguagePair = "english-ghomala".parse().unwrap();
        assert!(e.terms.get(&english_ghomala).unwrap().is_empty());
    }
}
