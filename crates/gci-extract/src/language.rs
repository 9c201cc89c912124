//! Hedging/uncertainty language metrics.
//!
//! Whole-word, case-insensitive lexicon counts normalized per 1000
//! words. The vague lexicon intentionally carries the two-word phrases
//! "kind of"/"sort of" as single entries even though whole-word counting
//! can never match them; changing that would silently shift scores.

use gci_core::{LanguageMetrics, SourceSection};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const HEDGES: &[&str] = &[
    "may",
    "might",
    "could",
    "approximately",
    "around",
    "about",
    "likely",
    "possible",
    "potential",
    "expect",
    "estimate",
    "anticipate",
    "forecast",
    "project",
];

const NEGATIONS: &[&str] = &["not", "no", "never", "none", "without"];

const UNCERTAINTY: &[&str] = &[
    "uncertain",
    "visibility",
    "headwinds",
    "challenging",
    "volatility",
    "risk",
    "cautious",
];

const VAGUE: &[&str] = &["somewhat", "kind of", "relatively", "roughly", "sort of"];

static WORD_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").unwrap());

fn per_thousand(words: &[String], lexicon: &[&str]) -> f64 {
    let set: HashSet<String> = lexicon.iter().map(|w| w.to_lowercase()).collect();
    let total = words.len().max(1);
    let hits = words.iter().filter(|w| set.contains(w.as_str())).count();
    (hits as f64 * 1000.0) / total as f64
}

/// Computes hedging/uncertainty rates for a text section.
#[must_use]
pub fn analyze_language(text: &str, source_section: SourceSection) -> LanguageMetrics {
    let words: Vec<String> = WORD_SPLIT
        .split(text)
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    if words.is_empty() {
        return LanguageMetrics::empty(source_section);
    }

    LanguageMetrics {
        words_total: words.len() as u64,
        hedges_per_k: per_thousand(&words, HEDGES),
        negations_per_k: per_thousand(&words, NEGATIONS),
        uncertainty_per_k: per_thousand(&words, UNCERTAINTY),
        vague_per_k: per_thousand(&words, VAGUE),
        source_section,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_thousand() {
        let m = analyze_language("We may grow and we may not", SourceSection::Prepared);
        assert_eq!(m.words_total, 7);
        // "may" twice out of 7 words.
        assert!((m.hedges_per_k - 2000.0 / 7.0).abs() < 1e-9);
        // "not" once.
        assert!((m.negations_per_k - 1000.0 / 7.0).abs() < 1e-9);
        assert_eq!(m.vague_per_k, 0.0);
    }

    #[test]
    fn test_case_insensitive_whole_words() {
        let m = analyze_language("Risk RISK risky", SourceSection::QA);
        // "risky" is not a whole-word hit.
        assert!((m.uncertainty_per_k - 2000.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.source_section, SourceSection::QA);
    }

    #[test]
    fn test_empty_text() {
        let m = analyze_language("", SourceSection::Prepared);
        assert_eq!(m, LanguageMetrics::empty(SourceSection::Prepared));
    }

    #[test]
    fn test_two_word_vague_entries_are_inert() {
        let m = analyze_language("kind of sort of somewhat", SourceSection::Prepared);
        // Only "somewhat" can ever hit under whole-word counting.
        assert!((m.vague_per_k - 1000.0 / 5.0).abs() < 1e-9);
    }
}
