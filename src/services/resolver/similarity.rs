//! 0-100 string similarity, token aware.
//!
//! The base measure is [`strsim::normalized_levenshtein`] over characters:
//! `1 - edits(a, b) / max(len(a), len(b))`. The token and partial variants
//! reuse it on rearranged or windowed inputs, and [`weighted_ratio`] picks
//! the best of them with penalties for the looser variants.

use std::collections::BTreeSet;

const TOKEN_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.9;
const LONG_PARTIAL_SCALE: f64 = 0.6;

/// Length ratio from which partial (substring) alignment is considered.
const PARTIAL_FROM: f64 = 1.5;
/// Length ratios above this use the long partial scale.
const LONG_PARTIAL_ABOVE: f64 = 8.0;

pub fn ratio(a: &str, b: &str) -> u8 {
    to_score(ratio_f(a, b))
}

pub fn partial_ratio(a: &str, b: &str) -> u8 {
    to_score(partial_ratio_f(a, b))
}

pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    to_score(ratio_f(&sorted_tokens(a), &sorted_tokens(b)))
}

pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    to_score(token_set_f(a, b, ratio_f))
}

/// Best of the plain, token and partial ratios. This is the score the
/// resolver ranks dictionary keys by.
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0;
    }

    let base = ratio_f(a, b);
    let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;

    let best = if len_ratio < PARTIAL_FROM {
        let sort = ratio_f(&sorted_tokens(a), &sorted_tokens(b)) * TOKEN_SCALE;
        let set = token_set_f(a, b, ratio_f) * TOKEN_SCALE;
        base.max(sort).max(set)
    } else {
        let scale = if len_ratio <= LONG_PARTIAL_ABOVE {
            PARTIAL_SCALE
        } else {
            LONG_PARTIAL_SCALE
        };
        let partial = partial_ratio_f(a, b) * scale;
        let sort = partial_ratio_f(&sorted_tokens(a), &sorted_tokens(b)) * TOKEN_SCALE * scale;
        let set = token_set_f(a, b, partial_ratio_f) * TOKEN_SCALE * scale;
        base.max(partial).max(sort).max(set)
    };

    to_score(best)
}

fn to_score(v: f64) -> u8 {
    v.round().clamp(0.0, 100.0) as u8
}

fn ratio_f(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    100.0 * strsim::normalized_levenshtein(a, b)
}

fn partial_ratio_f(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let width = short.chars().count();
    let long: Vec<char> = long.chars().collect();
    if width == 0 {
        return 0.0;
    }
    if width == long.len() {
        return ratio_f(a, b);
    }

    let mut best = 0.0f64;
    for window in long.windows(width) {
        let window: String = window.iter().collect();
        best = best.max(ratio_f(short, &window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_set_f(a: &str, b: &str, scorer: fn(&str, &str) -> f64) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let common = join(set_a.intersection(&set_b));
    let only_a = join(set_a.difference(&set_b));
    let only_b = join(set_b.difference(&set_a));

    let with_a = format!("{common} {only_a}").trim().to_string();
    let with_b = format!("{common} {only_b}").trim().to_string();

    scorer(&common, &with_a)
        .max(scorer(&common, &with_b))
        .max(scorer(&with_a, &with_b))
}

fn join<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(ratio("hello", "hello"), 100);
        assert_eq!(weighted_ratio("thank you", "thank you"), 100);
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(ratio("", "hello"), 0);
        assert_eq!(weighted_ratio("hello", ""), 0);
        assert_eq!(partial_ratio("", ""), 0);
    }

    #[test]
    fn single_deletion() {
        // one edit over five characters
        assert_eq!(ratio("helo", "hello"), 80);
        assert_eq!(weighted_ratio("helo", "hello"), 80);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(ratio("abc", "xyz"), 0);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // "mbʉ́" carries a combining accent: four scalar values against three
        assert_eq!(ratio("mbʉ́", "mbʉ"), 75);
    }

    #[test]
    fn token_order_is_penalized_lightly() {
        assert_eq!(token_sort_ratio("thank you", "you thank"), 100);
        assert_eq!(weighted_ratio("thank you", "you thank"), 95);
    }

    #[test]
    fn token_set_ignores_duplicates() {
        assert_eq!(token_set_ratio("good good morning", "good morning"), 100);
    }

    #[test]
    fn partial_finds_substring() {
        assert_eq!(partial_ratio("merci", "merci beaucoup"), 100);
        assert_eq!(weighted_ratio("merci", "merci beaucoup"), 90);
    }

    #[test]
    fn very_different_lengths_use_long_scale() {
        // length ratio 10 => partial 100 scaled by 0.6
        assert_eq!(weighted_ratio("a", "abcdefghij"), 60);
    }

    #[test]
    fn length_ratio_of_exactly_eight_keeps_partial_scale() {
        assert_eq!(weighted_ratio("a", "abcdefgh"), 90);
        assert_eq!(weighted_ratio("a", "abcdefghi"), 60);
    }

    #[test]
    fn symmetric() {
        for (a, b) in [("bonjour", "bonsoir"), ("merci", "mercy"), ("a b", "b c d")] {
            assert_eq!(weighted_ratio(a, b), weighted_ratio(b, a));
        }
    }
}
