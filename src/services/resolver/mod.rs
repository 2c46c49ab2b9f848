//! Dictionary resolution: exact lookup first, fuzzy fallback second.
//!
//! The resolver expects `query` to already be normalized with
//! [`crate::services::normalize::normalize`], the same folding applied to
//! dictionary keys. It never normalizes on its own.

pub mod similarity;

use crate::model::term::{MatchResult, TermMapping};

/// Resolves `query` against `terms`.
///
/// Exact keys win regardless of `fuzzy_threshold`. Otherwise the key with
/// the highest [`similarity::weighted_ratio`] is used when it scores at least
/// `fuzzy_threshold`; ties go to the key inserted first. Anything else is a
/// `none` result, which is not an error.
pub fn resolve(query: &str, terms: &TermMapping, fuzzy_threshold: u8) -> MatchResult {
    if let Some(translation) = terms.get(query) {
        return MatchResult::exact(query, translation);
    }

    if let Some((term, translation, score)) = best_candidate(query, terms) {
        if score >= fuzzy_threshold {
            return MatchResult::fuzzy(query, translation, score, term);
        }
    }

    MatchResult::none(query)
}

/// Highest scoring key of `terms`, first one on ties. `None` when empty.
fn best_candidate<'a>(query: &str, terms: &'a TermMapping) -> Option<(&'a str, &'a str, u8)> {
    let mut best: Option<(&str, &str, u8)> = None;

    for (term, translation) in terms.iter() {
        let score = similarity::weighted_ratio(query, term);

        match best {
            Some((_, _, top)) if top >= score => {}
            _ => best = Some((term, translation, score)),
        }

        if score == 100 {
            break;
        }
    }

    best
}
