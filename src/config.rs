use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::model::language::LanguagePair;

pub const CONFIG_ENV: &str = "DICO_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "dico.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

const DEFAULT_PAIRS: [&str; 6] = [
    "english-ghomala",
    "english-fulfulde",
    "french-ghomala",
    "french-fulfulde",
    "ghomala-english",
    "ghomala-french",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub log_level: String,

    /// Minimum similarity (0-100) for a fuzzy match to be returned.
    pub fuzzy_threshold: u8,

    /// Where `terms.json` and `contributions.json` live. In-memory when unset.
    pub data_dir: Option<PathBuf>,

    /// Seed dictionaries. The built-in samples are used when unset or empty.
    pub dictionaries_dir: Option<PathBuf>,

    pub storage_timeout_ms: u64,

    pub supported_pairs: Vec<LanguagePair>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            fuzzy_threshold: 70,
            data_dir: None,
            dictionaries_dir: None,
            storage_timeout_ms: 2000,
            supported_pairs: DEFAULT_PAIRS
                .iter()
                .filter_map(|k| k.parse().ok())
                .collect(),
        }
    }
}

impl Settings {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .map_err(|e| CoreError::config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        let cfg: Self =
            toml::from_str(data).map_err(|e| CoreError::config(format!("toml parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults, then the config file (`$DICO_CONFIG` or `./dico.toml`),
    /// then `DICO_*` environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from_file(PathBuf::from(path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load_from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };
        cfg.apply_env(|name| std::env::var(name).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = var("DICO_LOG_LEVEL") {
            self.log_level = v.trim().to_lowercase();
        }
        if let Some(v) = var("DICO_FUZZY_THRESHOLD") {
            self.fuzzy_threshold = v
                .trim()
                .parse()
                .map_err(|_| CoreError::config(format!("invalid DICO_FUZZY_THRESHOLD: {v}")))?;
        }
        if let Some(v) = var("DICO_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("DICO_DICTIONARIES_DIR") {
            self.dictionaries_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(CoreError::config(format!("invalid log_level: {}", self.log_level)));
        }
        if self.fuzzy_threshold > 100 {
            return Err(CoreError::config(format!(
                "fuzzy_threshold must be between 0 and 100, got {}",
                self.fuzzy_threshold
            )));
        }
        if self.storage_timeout_ms == 0 {
            return Err(CoreError::config("storage_timeout_ms must be positive"));
        }
        if self.supported_pairs.is_empty() {
            return Err(CoreError::config("supported_pairs must not be empty"));
        }
        Ok(())
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }
}
