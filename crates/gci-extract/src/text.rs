//! Text normalization, sentence splitting, and suppression checks.

use regex::Regex;
use std::sync::LazyLock;

/// Dash variants that appear in filing ranges ("$5.2–$5.4B").
static DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\u{2013}\u{2014}\u{2212}]").unwrap());

/// Sentence-ish boundaries: terminal punctuation followed by whitespace
/// or end of text, or a line break. Decimal points inside "$5.2" never
/// precede whitespace, so numbers survive the split.
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?;](?:\s+|$)|\n+").unwrap());

/// Words that mark a sentence as a guidance candidate.
static GUIDANCE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(guidance|outlook|expect|sees|range|between|forecast|project|estimate)")
        .unwrap()
});

/// Statements that guidance will be given live on the earnings call
/// instead of in the document at hand.
static DEFERS_TO_CALL: LazyLock<Regex> = LazyLock::new(|| {
    // The `[\s\w,-]{0,80}?` spans expand their Unicode `\s`/`\w` classes 80×
    // twice, pushing the compiled program past the crate's default 10 MiB
    // size limit. Raise the limit so the exact same pattern compiles; the
    // matching semantics are unchanged.
    regex::RegexBuilder::new(
        r"(?i)will\s+(?:provide|give|discuss|offer)[\s\w,-]{0,80}?guidance[\s\w,-]{0,80}?(?:earnings|conference)\s+call|guidance\s+will\s+be\s+(?:provided|given|discussed)[\s\w,-]{0,80}?call",
    )
    .size_limit(64 * 1024 * 1024)
    .build()
    .unwrap()
});

/// Unifies dash variants to '-' and collapses all whitespace runs to
/// single spaces.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let dashed = DASHES.replace_all(text, "-");
    dashed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits normalized text into sentence-like chunks on terminal
/// punctuation, dropping empties.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_BOUNDARY
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// True when the sentence contains a guidance-indicating keyword.
#[must_use]
pub fn has_guidance_keywords(sentence: &str) -> bool {
    GUIDANCE_KEYWORDS.is_match(sentence)
}

/// True when the document states that guidance will be given live on the
/// earnings call. Extraction skips such a document and moves on to the
/// next exhibit.
#[must_use]
pub fn defers_to_call(text: &str) -> bool {
    DEFERS_TO_CALL.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unifies_dashes_and_whitespace() {
        assert_eq!(
            normalize_text("revenue of $5.2\u{2013}$5.4B,\n  up  nicely"),
            "revenue of $5.2-$5.4B, up nicely"
        );
    }

    #[test]
    fn test_split_preserves_decimals() {
        let sentences = split_sentences("We expect $5.2 billion. Margins hold; EPS grows.");
        assert_eq!(
            sentences,
            vec!["We expect $5.2 billion", "Margins hold", "EPS grows"]
        );
    }

    #[test]
    fn test_keyword_gate() {
        assert!(has_guidance_keywords("Full-year outlook remains unchanged"));
        assert!(has_guidance_keywords("revenue to be between $500 million and $520 million"));
        assert!(!has_guidance_keywords("The board declared a dividend"));
    }

    #[test]
    fn test_defers_to_call() {
        assert!(defers_to_call(
            "The company will provide forward-looking guidance on the earnings call"
        ));
        assert!(defers_to_call(
            "Guidance will be provided during the conference call at 2pm"
        ));
        assert!(!defers_to_call(
            "The company provided guidance of $5.2 billion for the full year"
        ));
    }
}
