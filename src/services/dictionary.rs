//! Seed dictionaries loaded at startup.
//!
//! A dictionary directory holds one flat JSON object per pair, named
//! `<source>_<target>.json` or `<source>-<target>.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::model::language::LanguagePair;
use crate::model::term::TermMapping;
use crate::services::encoding;
use crate::services::normalize::normalize;

static FILE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<source>[^_\-.]+)[_-](?P<target>[^_\-.]+)\.json$")
        .expect("dictionary file name pattern is valid")
});

pub fn pair_from_file_name(name: &str) -> Option<LanguagePair> {
    let caps = FILE_NAME_RE.captures(name)?;
    LanguagePair::new(&caps["source"], &caps["target"]).ok()
}

/// Parses a `{"term": "translation"}` object. Keys are normalized; blank
/// keys or translations and non-string values are skipped, and the first
/// spelling wins when two keys normalize to the same term.
pub fn parse(text: &str) -> Result<TermMapping> {
    let raw: indexmap::IndexMap<String, Value> = serde_json::from_str(text)
        .map_err(|e| CoreError::validation(format!("dictionary is not a JSON object of strings: {e}")))?;

    let mut terms = TermMapping::new();
    let mut skipped = 0usize;

    for (term, value) in raw {
        let key = normalize(&term);
        let translation = value.as_str().map(str::trim).unwrap_or("");

        if key.is_empty() || translation.is_empty() || terms.contains(&key) {
            skipped += 1;
            continue;
        }
        terms.insert(key, translation.to_string());
    }

    if skipped > 0 {
        tracing::debug!(skipped, "skipped dictionary entries");
    }

    Ok(terms)
}

/// Every dictionary file in `dir`, keyed by pair. Files that do not look
/// like dictionaries or fail to parse are logged and skipped.
pub fn load_dir(dir: &Path) -> Result<BTreeMap<LanguagePair, TermMapping>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| CoreError::storage(format!("failed to read {}: {e}", dir.display())))?;

    let mut out = BTreeMap::new();

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(pair) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(pair_from_file_name)
        else {
            continue;
        };

        let decoded = match encoding::read_text(&path) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping dictionary");
                continue;
            }
        };

        match parse(&decoded.text) {
            Ok(terms) => {
                tracing::info!(
                    pair = %pair,
                    terms = terms.len(),
                    encoding = decoded.encoding,
                    "loaded dictionary"
                );
                out.insert(pair, terms);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping dictionary");
            }
        }
    }

    Ok(out)
}

/// Sample dictionaries used when no dictionary files are configured.
pub fn builtin() -> BTreeMap<LanguagePair, TermMapping> {
    let samples: [(&str, [(&str, &str); 2]); 4] = [
        ("english-ghomala", [("hello", "mbʉ́ nà"), ("thank you", "pua' sʉn")]),
        ("english-fulfulde", [("hello", "salaam aleykum"), ("thank you", "useko")]),
        ("french-ghomala", [("bonjour", "mbʉ́ nà"), ("merci", "pua' sʉn")]),
        ("french-fulfulde", [("bonjour", "salaam aleykum"), ("merci", "useko")]),
    ];

    samples
        .into_iter()
        .filter_map(|(key, terms)| {
            let pair: LanguagePair = key.parse().ok()?;
            Some((pair, terms.into_iter().collect()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_map_to_pairs() {
        assert_eq!(
            pair_from_file_name("english_ghomala.json"),
            Some("english-ghomala".parse().unwrap())
        );
        assert_eq!(
            pair_from_file_name("French-Fulfulde.json"),
            Some("french-fulfulde".parse().unwrap())
        );
        assert_eq!(pair_from_file_name("notes.txt"), None);
        assert_eq!(pair_from_file_name("english.json"), None);
    }

    #[test]
    fn parse_normalizes_and_skips_junk() {
        let terms = parse(
            r#"{"  Thank You ": "pua' sʉn", "thank you": "dup", "": "x", "empty": " ", "n": 3, "Café": "kafe"}"#,
        )
        .unwrap();

        assert_eq!(terms.len(), 2);
        assert_eq!(terms.get("thank you"), Some("pua' sʉn"));
        assert_eq!(terms.get("cafe"), Some("kafe"));
    }

    #[test]
    fn parse_rejects_non_objects() {
        assert!(parse("[1, 2]").is_err());
    }

    #[test]
    fn load_dir_reads_pairs_and_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("french_ghomala.json"),
            r#"{"bonjour": "mbʉ́ nà", "merci": "pua' sʉn"}"#,
        )
        .unwrap();
        let (latin1, _, _) = encoding_rs::WINDOWS_1252.encode(
            r#"{"le café": "kafe", "un garçon": "mu", "ça va": "o", "hello": "x"}"#,
        );
        fs::write(dir.path().join("french_fulfulde.json"), &latin1).unwrap();
        fs::write(dir.path().join("english_ghomala.json"), "not json").unwrap();
        fs::write(dir.path().join("README.md"), "# dictionaries").unwrap();

        let loaded = load_dir(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);

        let fg = &loaded[&"french-ghomala".parse::<LanguagePair>().unwrap()];
        assert_eq!(fg.get("bonjour"), Some("mbʉ́ nà"));

        let ff = &loaded[&"french-fulfulde".parse::<LanguagePair>().unwrap()];
        assert_eq!(ff.get("le cafe"), Some("kafe"));
        assert_eq!(ff.get("un garcon"), Some("mu"));
    }

    #[test]
    fn builtin_covers_forward_pairs() {
        let b = builtin();
        assert_eq!(b.len(), 4);
        let eg = &b[&"english-ghomala".parse::<LanguagePair>().unwrap()];
        assert_eq!(eg.get("hello"), Some("mbʉ́ nà"));
    }
}
