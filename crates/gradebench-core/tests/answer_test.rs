//! Tests for answer normalization, extraction, and matching.

use gradebench_core::answer::{
    extract_answer, match_answers, match_answers_with_threshold, match_score, normalize_answer,
};

#[test]
fn normalization_canonicalizes_numbers_and_symbols() {
    assert_eq!(normalize_answer("$1,234,567"), "1234567");
    assert_eq!(normalize_answer("42%"), "42");
    assert_eq!(normalize_answer("  The   Eiffel  Tower!  "), "eiffel tower");
    assert_eq!(normalize_answer("€3,000.50"), "3000.50");
}

#[test]
fn normalization_leaves_non_thousands_commas() {
    assert_eq!(normalize_answer("1,23"), "1,23");
    assert_eq!(normalize_answer("a, b"), "a, b");
}

#[test]
fn exact_match_ignores_case_articles_and_punctuation() {
    let (exact, partial) = match_answers("The Paris.", "paris");
    assert!(exact);
    assert!(partial);
}

#[test]
fn containment_is_partial_not_exact() {
    let (exact, partial) = match_answers("paris, france", "paris");
    assert!(!exact);
    assert!(partial);
}

#[test]
fn word_coverage_respects_threshold() {
    // 2 of 3 expected words present: coverage 0.67.
    let predicted = "the answer involves apollo and eleven";
    let expected = "apollo eleven mission";
    let (_, partial_default) = match_answers_with_threshold(predicted, expected, 0.7);
    assert!(!partial_default);
    let (_, partial_loose) = match_answers_with_threshold(predicted, expected, 0.6);
    assert!(partial_loose);
}

#[test]
fn empty_sides_never_match_partially() {
    let (exact, partial) = match_answers("", "paris");
    assert!(!exact);
    assert!(!partial);
    let (exact, partial) = match_answers("something", "");
    assert!(!exact);
    assert!(!partial);
}

#[test]
fn empty_equals_empty() {
    let (exact, partial) = match_answers("", "");
    assert!(exact);
    assert!(partial);
}

#[test]
fn scores_map_to_three_tiers() {
    assert_eq!(match_score(true, true), 1.0);
    assert_eq!(match_score(false, true), 0.5);
    assert_eq!(match_score(false, false), 0.0);
}

#[test]
fn extraction_tries_markers_in_order() {
    let resp = "Reasoning...\nFINAL ANSWER: 1,234\nAnswer: wrong";
    assert_eq!(extract_answer(resp), "1,234");
    assert_eq!(extract_answer("答案：巴黎"), "巴黎");
    assert_eq!(extract_answer("The answer is: Paris"), "Paris");
}

#[test]
fn extraction_marker_is_case_insensitive() {
    assert_eq!(extract_answer("final answer: 42"), "42");
}

#[test]
fn extraction_falls_back_to_last_non_empty_line() {
    let resp = "step one\nstep two\n\nParis\n\n";
    assert_eq!(extract_answer(resp), "Paris");
}
