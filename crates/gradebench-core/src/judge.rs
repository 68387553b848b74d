//! Judge-response parsing and rubric scoring.
//!
//! A judge model returns free text that should contain a JSON object with
//! four 1-5 rubric dimensions and a comment. Judge models drift in their
//! formatting, so parsing fails open: any dimension that cannot be
//! recovered keeps a neutral default instead of zeroing the sample or
//! raising an error.

use crate::types::{JsonMap, JudgeScore};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Neutral fallback for a rubric dimension the parser cannot recover.
pub const DEFAULT_DIMENSION_SCORE: f64 = 3.0;

/// Mean rubric score at or above which a sample passes. Boundary
/// inclusive.
pub const PASS_THRESHOLD: f64 = 3.0;

/// Mean rubric score at or above which a sample counts as excellent.
pub const EXCELLENT_THRESHOLD: f64 = 4.0;

static JUDGE_CODE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("valid regex"));

impl Default for JudgeScore {
    fn default() -> Self {
        Self {
            correctness: DEFAULT_DIMENSION_SCORE,
            clarity: DEFAULT_DIMENSION_SCORE,
            difficulty_match: DEFAULT_DIMENSION_SCORE,
            completeness: DEFAULT_DIMENSION_SCORE,
            total_score: DEFAULT_DIMENSION_SCORE,
            comments: String::new(),
        }
    }
}

impl JudgeScore {
    /// Arithmetic mean of the four dimensions.
    pub fn mean(&self) -> f64 {
        (self.correctness + self.clarity + self.difficulty_match + self.completeness) / 4.0
    }

    pub fn passed(&self) -> bool {
        self.total_score >= PASS_THRESHOLD
    }

    pub fn excellent(&self) -> bool {
        self.total_score >= EXCELLENT_THRESHOLD
    }
}

/// Recover a [`JudgeScore`] from a judge model's free-text response.
///
/// Prefers the content of a fenced code block, falling back to the raw
/// response. Each dimension is taken from the parsed object when present
/// and numeric; otherwise the neutral default stands. The total is always
/// recomputed from the dimensions.
pub fn parse_judge_response(response: &str) -> JudgeScore {
    let mut score = JudgeScore::default();

    let json_source = JUDGE_CODE_BLOCK_RE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response);

    if let Ok(Value::Object(parsed)) = serde_json::from_str::<Value>(json_source) {
        let parsed: JsonMap = parsed.into_iter().collect();
        if let Some(v) = numeric_field(&parsed, "correctness") {
            score.correctness = v;
        }
        if let Some(v) = numeric_field(&parsed, "clarity") {
            score.clarity = v;
        }
        if let Some(v) = numeric_field(&parsed, "difficulty_match") {
            score.difficulty_match = v;
        }
        if let Some(v) = numeric_field(&parsed, "completeness") {
            score.completeness = v;
        }
        if let Some(Value::String(comments)) = parsed.get("comments") {
            score.comments = comments.clone();
        }
    }

    score.total_score = score.mean();
    score
}

fn numeric_field(map: &JsonMap, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

/// System prompt instructing the judge to emit the rubric JSON.
pub fn judge_system_prompt() -> String {
    "You are an expert reviewer of generated question sets. Rate the given item on each \
dimension from 1 to 5:\n\n\
1. correctness: the question and its answer are correct\n\
2. clarity: the question is clearly stated and unambiguous\n\
3. difficulty_match: the difficulty matches its label\n\
4. completeness: the item contains all information needed to answer\n\n\
Reply with a JSON object:\n\
{\n  \"correctness\": <1-5>,\n  \"clarity\": <1-5>,\n  \"difficulty_match\": <1-5>,\n  \
\"completeness\": <1-5>,\n  \"comments\": \"<short justification>\"\n}"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json() {
        let resp = "Here you go:\n```json\n{\"correctness\": 5, \"clarity\": 4, \
                    \"difficulty_match\": 3, \"completeness\": 2, \"comments\": \"ok\"}\n```";
        let score = parse_judge_response(resp);
        assert_eq!(score.correctness, 5.0);
        assert_eq!(score.completeness, 2.0);
        assert_eq!(score.comments, "ok");
        assert_eq!(score.total_score, 3.5);
    }

    #[test]
    fn missing_fields_keep_defaults() {
        let score = parse_judge_response("{\"clarity\": 1}");
        assert_eq!(score.clarity, 1.0);
        assert_eq!(score.correctness, DEFAULT_DIMENSION_SCORE);
        assert_eq!(score.total_score, (1.0 + 3.0 * 3.0) / 4.0);
    }

    #[test]
    fn unparseable_response_fails_open() {
        let score = parse_judge_response("I refuse to answer in JSON.");
        assert_eq!(score, JudgeScore::default());
        assert!(score.passed());
    }

    #[test]
    fn total_is_recomputed_not_trusted() {
        let resp = "{\"correctness\": 5, \"clarity\": 5, \"difficulty_match\": 5, \
                    \"completeness\": 5, \"total_score\": 1}";
        let score = parse_judge_response(resp);
        assert_eq!(score.total_score, 5.0);
    }
}
