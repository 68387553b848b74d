//! Shared data types for gradebench.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub type JsonMap = HashMap<String, Value>;

/// A unit of evaluation: one question/task drawn from a benchmark dataset.
///
/// All benchmarks share this shape; each uses only the fields it needs
/// (tools for function-calling suites, files and level for assistant
/// suites). Samples are immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub id: String,
    pub input: String,
    /// Ground truth, resolved to a typed variant at load time.
    #[serde(default)]
    pub expected: Expected,
    #[serde(default)]
    pub category: String,
    /// Difficulty level (0 means unleveled; treated as 1 for reporting).
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub metadata: JsonMap,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    /// Attachment references (file names the agent may need).
    #[serde(default)]
    pub files: Vec<String>,
}

/// The reference answer a prediction is scored against.
///
/// Benchmarks store ground truth in wildly different encodings; dataset
/// loaders resolve each sample's ground truth into one of these variants
/// once, so scoring code never re-inspects dynamic JSON shapes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Expected {
    /// A free-text short answer.
    Text(String),
    /// A set of expected function calls.
    Calls(Vec<FunctionCall>),
    /// Anything else, kept raw (e.g. ground truth that failed to resolve).
    Value(Value),
}

impl Default for Expected {
    fn default() -> Self {
        Expected::Value(Value::Null)
    }
}

impl Expected {
    pub fn is_null(&self) -> bool {
        matches!(self, Expected::Value(Value::Null))
    }
}

/// A tool/function made available to the agent for a sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: JsonMap,
}

/// A structured `(name, parameters)` invocation.
///
/// Represents both predicted calls (parsed from model output) and expected
/// calls (parsed from ground truth).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: JsonMap,
}

/// Call-level counters produced by the function-call matcher.
///
/// These feed precision/recall/F1 aggregation, so they are typed fields
/// rather than entries in the diagnostics map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CallStats {
    pub matched_calls: usize,
    pub expected_calls: usize,
    pub predicted_calls: usize,
}

/// A 4-dimension quality rubric scored by a judge model, each in [1, 5].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JudgeScore {
    pub correctness: f64,
    pub clarity: f64,
    pub difficulty_match: f64,
    pub completeness: f64,
    /// Arithmetic mean of the four dimensions. Always recomputed, never
    /// trusted from judge output.
    pub total_score: f64,
    #[serde(default)]
    pub comments: String,
}

/// The outcome of evaluating a single sample. Created once by the
/// benchmark that produced it; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleResult {
    pub sample_id: String,
    #[serde(default)]
    pub predicted: Value,
    #[serde(default)]
    pub expected: Expected,
    /// Exact-match success.
    pub success: bool,
    /// Looser containment/coverage success; implied by `success` for text
    /// scoring.
    #[serde(default)]
    pub partial_success: bool,
    /// Score in [0, 1], or [0, 5] for the judge rubric.
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Call-level counters, present for function-call benchmarks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_stats: Option<CallStats>,
    /// Judge rubric, present for judge benchmarks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge: Option<JudgeScore>,
    /// Raw agent response, kept for export fallback and debugging.
    #[serde(default)]
    pub agent_response: String,
    /// Free-form diagnostics. Never consumed by aggregation logic.
    #[serde(default)]
    pub details: JsonMap,
}

impl SampleResult {
    /// A skeleton result carrying identity fields from the sample; the
    /// benchmark fills in the rest.
    pub fn for_sample(sample: &Sample) -> Self {
        Self {
            sample_id: sample.id.clone(),
            predicted: Value::Null,
            expected: sample.expected.clone(),
            success: false,
            partial_success: false,
            score: 0.0,
            category: sample.category.clone(),
            level: sample.level,
            duration_ms: 0.0,
            error: None,
            call_stats: None,
            judge: None,
            agent_response: String::new(),
            details: JsonMap::new(),
        }
    }

    /// A result recording only a failure (agent error, timeout, bad ground
    /// truth). Success flags stay false.
    pub fn failed(sample: &Sample, error: impl Into<String>) -> Self {
        let mut r = Self::for_sample(sample);
        r.error = Some(error.into());
        r
    }
}

/// Per-category accuracy breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CategoryMetrics {
    pub category: String,
    pub total: usize,
    pub success: usize,
    pub accuracy: f64,
    #[serde(default)]
    pub average_score: f64,
}

/// Per-difficulty-level match-rate breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LevelMetrics {
    pub level: u32,
    pub total: usize,
    pub exact_matches: usize,
    #[serde(default)]
    pub partial_matches: usize,
    pub exact_match_rate: f64,
    #[serde(default)]
    pub partial_match_rate: f64,
}

/// Summary metrics over a whole run. Only the subset relevant to the
/// active benchmark is populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MetricsSummary {
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub precision: f64,
    #[serde(default)]
    pub recall: f64,
    #[serde(default)]
    pub f1_score: f64,
    #[serde(default)]
    pub average_score: f64,
    #[serde(default)]
    pub pass_rate: f64,
    #[serde(default)]
    pub excellent_rate: f64,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub loss_rate: f64,
    #[serde(default)]
    pub tie_rate: f64,
    #[serde(default)]
    pub dimension_scores: HashMap<String, f64>,
    /// Benchmark-specific counters (e.g. `exact_matches`). Diagnostic only.
    #[serde(default)]
    pub extra: JsonMap,
}

/// Aggregate result of a whole evaluation run. Built incrementally during
/// a single pass; immutable after the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalResult {
    pub benchmark_name: String,
    pub agent_name: String,
    pub total_samples: usize,
    pub success_count: usize,
    pub overall_accuracy: f64,
    #[serde(default)]
    pub category_metrics: HashMap<String, CategoryMetrics>,
    #[serde(default)]
    pub level_metrics: HashMap<u32, LevelMetrics>,
    pub detailed_results: Vec<SampleResult>,
    pub total_duration_ms: f64,
    pub evaluation_time: DateTime<Utc>,
    #[serde(default)]
    pub metrics: MetricsSummary,
}

impl EvalResult {
    pub fn new(benchmark_name: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            benchmark_name: benchmark_name.into(),
            agent_name: agent_name.into(),
            total_samples: 0,
            success_count: 0,
            overall_accuracy: 0.0,
            category_metrics: HashMap::new(),
            level_metrics: HashMap::new(),
            detailed_results: Vec::new(),
            total_duration_ms: 0.0,
            evaluation_time: Utc::now(),
            metrics: MetricsSummary::default(),
        }
    }
}
