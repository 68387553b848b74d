//! Free-text answer normalization, extraction, and matching.
//!
//! Short-answer benchmarks score a model's free text against a reference
//! string. The pipeline is: extract the intended final answer from the raw
//! response, canonicalize both sides with [`normalize_answer`], then apply
//! the exact/containment/coverage policy in [`match_answers`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Fraction of expected-answer tokens that must appear in the prediction
/// for a word-coverage partial match. Empirical, inherited as-is.
pub const COVERAGE_THRESHOLD: f64 = 0.7;

static TRAILING_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{P}+$").expect("valid regex"));

static THOUSANDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d),(\d{3})").expect("valid regex"));

static ANSWER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)FINAL\s+ANSWER:\s*(.+?)(?:\n|$)",
        r"(?i)答案[：:]\s*(.+?)(?:\n|$)",
        r"(?i)Answer[：:]\s*(.+?)(?:\n|$)",
        r"(?i)The\s+answer\s+is[：:]\s*(.+?)(?:\n|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Canonicalize an answer for comparison.
///
/// Lowercases, strips one leading article, strips trailing punctuation,
/// drops currency/percent symbols, removes thousands separators, and
/// collapses whitespace.
pub fn normalize_answer(answer: &str) -> String {
    let mut answer = answer.trim().to_lowercase();

    // Only the first leading article, not recursively.
    for article in ["the ", "a ", "an "] {
        if let Some(rest) = answer.strip_prefix(article) {
            answer = rest.to_string();
            break;
        }
    }

    answer = TRAILING_PUNCT_RE.replace(&answer, "").to_string();

    for sym in ['$', '%', '¥', '€', '£'] {
        answer = answer.replace(sym, "");
    }

    // d,ddd -> dddd, repeated until fixpoint. Leaves non-thousands commas
    // like "1,23" alone.
    while THOUSANDS_RE.is_match(&answer) {
        answer = THOUSANDS_RE.replace_all(&answer, "$1$2").to_string();
    }

    answer.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compare a predicted answer against the expected one.
///
/// Returns `(exact, partial)`. Exact match implies partial match. Both
/// sides are normalized before comparison.
pub fn match_answers(predicted: &str, expected: &str) -> (bool, bool) {
    match_answers_with_threshold(predicted, expected, COVERAGE_THRESHOLD)
}

/// [`match_answers`] with an explicit word-coverage threshold.
pub fn match_answers_with_threshold(
    predicted: &str,
    expected: &str,
    coverage_threshold: f64,
) -> (bool, bool) {
    let pred = normalize_answer(predicted);
    let exp = normalize_answer(expected);

    if pred == exp {
        return (true, true);
    }

    // Containment in either direction counts as a partial match, but only
    // for non-empty strings (an empty side always "contains").
    if !pred.is_empty() && !exp.is_empty() && (pred.contains(&exp) || exp.contains(&pred)) {
        return (false, true);
    }

    let expected_words: Vec<&str> = exp.split_whitespace().collect();
    if !expected_words.is_empty() {
        let matched = expected_words.iter().filter(|w| pred.contains(*w)).count();
        let coverage = matched as f64 / expected_words.len() as f64;
        if coverage >= coverage_threshold {
            return (false, true);
        }
    }

    (false, false)
}

/// Map match flags to the score used by short-answer benchmarks.
pub fn match_score(exact: bool, partial: bool) -> f64 {
    if exact {
        1.0
    } else if partial {
        0.5
    } else {
        0.0
    }
}

/// Extract the intended final answer from a raw model response.
///
/// Tries the `FINAL ANSWER:` / `Answer:` marker patterns in order, then
/// falls back to the last non-empty line. Empty input yields empty output.
pub fn extract_answer(response: &str) -> String {
    let response = response.trim();
    if response.is_empty() {
        return String::new();
    }

    for pattern in ANSWER_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(response) {
            if let Some(m) = caps.get(1) {
                return m.as_str().trim().to_string();
            }
        }
    }

    response
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or(response)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_article_and_punct() {
        assert_eq!(normalize_answer("The answer."), "answer");
        assert_eq!(normalize_answer("An apple"), "apple");
    }

    #[test]
    fn normalize_is_stable_for_common_shapes() {
        for s in ["The Answer!", "$1,000,000", "  a  b  c  ", "1,23", ""] {
            let once = normalize_answer(s);
            assert_eq!(normalize_answer(&once), once, "unstable for {s:?}");
        }
    }

    #[test]
    fn normalize_strips_only_one_leading_article() {
        // Stacked articles lose one per pass, so normalization is not
        // idempotent in general.
        assert_eq!(normalize_answer("the a cat"), "a cat");
        assert_eq!(normalize_answer("a cat"), "cat");
    }

    #[test]
    fn extract_prefers_final_answer_marker() {
        let resp = "Some reasoning here.\nFINAL ANSWER: 42\ntrailing";
        assert_eq!(extract_answer(resp), "42");
    }

    #[test]
    fn extract_falls_back_to_last_line() {
        assert_eq!(extract_answer("line one\n\nParis\n"), "Paris");
        assert_eq!(extract_answer(""), "");
    }
}
