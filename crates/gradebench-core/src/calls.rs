//! Function-call extraction, ground-truth parsing, and call matching.
//!
//! Function-calling benchmarks ask the model to emit structured
//! invocations instead of prose. The model side rarely cooperates (prose
//! around the JSON, code fences, a bare object instead of a list), and the
//! ground-truth side comes in several historical encodings, so both
//! parsers are fallback chains: an ordered list of attempts where the
//! first success wins.

use crate::types::{CallStats, FunctionCall, JsonMap};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static CALL_ARRAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[[\s\S]*?\{[\s\S]*?"name"[\s\S]*?\}[\s\S]*?\]"#).expect("valid regex")
});

static CODE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("valid regex"));

static CALL_LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\((.*)\)$").expect("valid regex"));

/// Failure to recover any function call from a model response.
///
/// Never fatal to a run: the sample is scored as a miss and the loop
/// continues.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("empty response")]
    EmptyResponse,
    #[error("no function calls found in response")]
    NoCallsFound,
}

/// Failure to interpret a ground-truth value as function calls.
#[derive(Debug, Error)]
pub enum GroundTruthError {
    #[error("unsupported ground truth shape: {0}")]
    UnsupportedShape(String),
    #[error("unparseable ground truth string: {0:?}")]
    UnparseableString(String),
}

// ---------------------------------------------------------------------------
// Predicted side
// ---------------------------------------------------------------------------

/// Extract function calls from a raw model response.
///
/// Attempts, in order: the whole response as a call list, an embedded
/// JSON-array region, the whole response as a single call object, and
/// finally the content of a fenced code block. First success wins.
pub fn parse_predicted_calls(response: &str) -> Result<Vec<FunctionCall>, ExtractionError> {
    let response = response.trim();
    if response.is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }

    let attempts: [fn(&str) -> Option<Vec<FunctionCall>>; 4] = [
        try_call_list,
        try_embedded_array,
        try_single_call,
        try_code_block,
    ];

    attempts
        .iter()
        .find_map(|attempt| attempt(response))
        .ok_or(ExtractionError::NoCallsFound)
}

fn try_call_list(text: &str) -> Option<Vec<FunctionCall>> {
    serde_json::from_str::<Vec<FunctionCall>>(text).ok()
}

fn try_embedded_array(text: &str) -> Option<Vec<FunctionCall>> {
    CALL_ARRAY_RE
        .find_iter(text)
        .find_map(|m| match serde_json::from_str::<Vec<FunctionCall>>(m.as_str()) {
            Ok(calls) if !calls.is_empty() => Some(calls),
            _ => None,
        })
}

fn try_single_call(text: &str) -> Option<Vec<FunctionCall>> {
    match serde_json::from_str::<FunctionCall>(text) {
        Ok(call) if !call.name.is_empty() => Some(vec![call]),
        _ => None,
    }
}

fn try_code_block(text: &str) -> Option<Vec<FunctionCall>> {
    for caps in CODE_BLOCK_RE.captures_iter(text) {
        let content = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if let Some(calls) = try_call_list(content) {
            return Some(calls);
        }
        if let Some(calls) = try_single_call(content) {
            return Some(calls);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Ground-truth side
// ---------------------------------------------------------------------------

/// Parse a ground-truth value into expected function calls.
///
/// Accepts, recursively: a list of call representations (one level of
/// nesting flattened), a `{"name": ..., "arguments": {...}}` object, a
/// `{"func_name": {"param": [...]}}` object where list-valued parameters
/// enumerate acceptable values (the first is canonical), a textual
/// `func(arg=val)` string, and a JSON-encoded string holding any of the
/// above. Entries that fail to parse are skipped rather than aborting the
/// sample.
pub fn parse_ground_truth(gt: &Value) -> Result<Vec<FunctionCall>, GroundTruthError> {
    match gt {
        Value::Array(items) => {
            let mut calls = Vec::new();
            for item in items {
                if let Ok(mut parsed) = parse_ground_truth_item(item) {
                    calls.append(&mut parsed);
                }
            }
            Ok(calls)
        }
        Value::Object(_) | Value::String(_) => parse_ground_truth_item(gt),
        other => Err(GroundTruthError::UnsupportedShape(json_kind(other).into())),
    }
}

fn parse_ground_truth_item(item: &Value) -> Result<Vec<FunctionCall>, GroundTruthError> {
    match item {
        Value::Array(sub_items) => {
            let mut calls = Vec::new();
            for sub in sub_items {
                if let Ok(mut parsed) = parse_ground_truth_item(sub) {
                    calls.append(&mut parsed);
                }
            }
            Ok(calls)
        }
        Value::Object(map) => {
            // Standard form: {"name": "...", "arguments": {...}}
            if let Some(Value::String(name)) = map.get("name") {
                let mut arguments = JsonMap::new();
                if let Some(Value::Object(args)) = map.get("arguments") {
                    arguments.extend(args.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                return Ok(vec![FunctionCall {
                    name: name.clone(),
                    arguments,
                }]);
            }

            // Keyed form: {"func_name": {"param": [v1, v2], ...}}. A
            // list-valued parameter enumerates acceptable values; the first
            // is the canonical expected value.
            let mut calls = Vec::new();
            for (func_name, params) in map {
                let mut arguments = JsonMap::new();
                if let Value::Object(params) = params {
                    for (param_name, param_val) in params {
                        let canonical = match param_val {
                            Value::Array(vals) if !vals.is_empty() => vals[0].clone(),
                            other => other.clone(),
                        };
                        arguments.insert(param_name.clone(), canonical);
                    }
                }
                calls.push(FunctionCall {
                    name: func_name.clone(),
                    arguments,
                });
            }
            Ok(calls)
        }
        Value::String(s) => {
            // A JSON-encoded string wrapping any supported shape.
            if let Ok(inner) = serde_json::from_str::<Value>(s) {
                return parse_ground_truth(&inner);
            }
            parse_call_literal(s).map(|call| vec![call])
        }
        other => Err(GroundTruthError::UnsupportedShape(json_kind(other).into())),
    }
}

/// Parse a textual `func_name(arg=val, arg2=val2)` call.
///
/// Arguments are split on top-level commas only; values are interpreted as
/// JSON literals when possible, otherwise as quoted strings. Nested calls
/// are not handled.
fn parse_call_literal(s: &str) -> Result<FunctionCall, GroundTruthError> {
    let s = s.trim();
    let caps = CALL_LITERAL_RE
        .captures(s)
        .ok_or_else(|| GroundTruthError::UnparseableString(s.to_string()))?;

    let name = caps[1].to_string();
    let args_str = caps[2].trim();

    let mut arguments = JsonMap::new();
    if args_str.is_empty() {
        return Ok(FunctionCall { name, arguments });
    }

    for piece in split_top_level(args_str) {
        let Some((key, raw_val)) = piece.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let raw_val = raw_val.trim();
        let value = serde_json::from_str::<Value>(raw_val)
            .unwrap_or_else(|_| Value::String(raw_val.trim_matches(&['"', '\''][..]).to_string()));
        arguments.insert(key.to_string(), value);
    }

    Ok(FunctionCall { name, arguments })
}

/// Split on commas that are not inside brackets or quotes.
fn split_top_level(s: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in s.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                current.push(c);
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    current.push(c);
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                ',' if depth == 0 => {
                    pieces.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        pieces.push(current);
    }
    pieces
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Outcome of matching predicted calls against expected calls.
#[derive(Debug, Clone, PartialEq)]
pub struct CallScore {
    /// True only when every expected call found a perfect-scoring match.
    pub success: bool,
    /// Mean best-match score across expected calls, in [0, 1].
    pub score: f64,
    pub stats: CallStats,
    /// Best-match score per expected call, in ground-truth order.
    pub per_call_scores: Vec<f64>,
}

/// Score predicted calls against expected calls.
///
/// Each expected call takes the best score over all predicted calls. The
/// sample succeeds only if every expected call scores exactly 1.0.
pub fn score_calls(predicted: &[FunctionCall], expected: &[FunctionCall]) -> CallScore {
    let stats = CallStats {
        matched_calls: 0,
        expected_calls: expected.len(),
        predicted_calls: predicted.len(),
    };

    if predicted.is_empty() || expected.is_empty() {
        return CallScore {
            success: false,
            score: 0.0,
            stats,
            per_call_scores: vec![0.0; expected.len()],
        };
    }

    let mut matched = 0;
    let mut total = 0.0;
    let mut per_call_scores = Vec::with_capacity(expected.len());

    for exp in expected {
        let best = predicted
            .iter()
            .map(|pred| compare_calls(pred, exp))
            .fold(0.0, f64::max);
        if best >= 1.0 {
            matched += 1;
        }
        total += best;
        per_call_scores.push(best);
    }

    CallScore {
        success: matched == expected.len(),
        score: total / expected.len() as f64,
        stats: CallStats {
            matched_calls: matched,
            ..stats
        },
        per_call_scores,
    }
}

/// Compare one predicted call against one expected call.
///
/// A name mismatch scores zero regardless of arguments. Otherwise the
/// score is the fraction of expected parameters whose predicted value
/// compares equal; a parameterless expected call scores 1.0 on a name
/// match alone.
pub fn compare_calls(predicted: &FunctionCall, expected: &FunctionCall) -> f64 {
    if predicted.name != expected.name {
        return 0.0;
    }

    if expected.arguments.is_empty() {
        return 1.0;
    }

    let matched = expected
        .arguments
        .iter()
        .filter(|(name, expected_val)| {
            predicted
                .arguments
                .get(*name)
                .is_some_and(|predicted_val| values_equal(predicted_val, expected_val))
        })
        .count();

    matched as f64 / expected.arguments.len() as f64
}

/// Loose value equality: stringified, case-insensitive, or numeric after
/// best-effort coercion. First satisfied check wins.
fn values_equal(a: &Value, b: &Value) -> bool {
    let a_str = value_display(a);
    let b_str = value_display(b);

    if a_str == b_str {
        return true;
    }
    if a_str.to_lowercase() == b_str.to_lowercase() {
        return true;
    }
    matches!((to_f64(a), to_f64(b)), (Some(x), Some(y)) if x == y)
}

fn value_display(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_literal_with_mixed_values() {
        let call = parse_call_literal("geocode(city='San Francisco', limit=5, strict=true)")
            .expect("parses");
        assert_eq!(call.name, "geocode");
        assert_eq!(call.arguments["city"], json!("San Francisco"));
        assert_eq!(call.arguments["limit"], json!(5));
        assert_eq!(call.arguments["strict"], json!(true));
    }

    #[test]
    fn call_literal_ignores_commas_inside_brackets() {
        let call = parse_call_literal("plot(points=[1, 2, 3], label=\"a,b\")").expect("parses");
        assert_eq!(call.arguments["points"], json!([1, 2, 3]));
        assert_eq!(call.arguments["label"], json!("a,b"));
    }

    #[test]
    fn call_literal_rejects_non_call_text() {
        assert!(parse_call_literal("not a call").is_err());
    }
}
