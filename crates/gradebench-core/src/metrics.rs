//! Metrics aggregation: per-benchmark summaries, per-category and
//! per-level breakdowns, and difficulty-progression analysis.
//!
//! All aggregation reads typed fields on [`SampleResult`] (`call_stats`,
//! `judge`, flags, score). The `extra` map on the summary only carries
//! counters for humans; nothing reads it back.

use crate::judge::EXCELLENT_THRESHOLD;
use crate::types::{CategoryMetrics, JsonMap, LevelMetrics, MetricsSummary, SampleResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

/// Summary for short-answer benchmarks: accuracy over exact matches plus
/// exact/partial match counters.
pub fn assistant_summary(results: &[SampleResult]) -> MetricsSummary {
    let mut summary = MetricsSummary::default();
    if results.is_empty() {
        return summary;
    }

    let total = results.len();
    let exact = results.iter().filter(|r| r.success).count();
    let partial = results.iter().filter(|r| r.partial_success).count();
    let errors = results.iter().filter(|r| r.error.is_some()).count();
    let total_score: f64 = results.iter().map(|r| r.score).sum();

    summary.accuracy = exact as f64 / total as f64;
    summary.average_score = total_score / total as f64;

    summary.extra = JsonMap::from_iter([
        ("total_samples".into(), json!(total)),
        ("exact_matches".into(), json!(exact)),
        ("partial_matches".into(), json!(partial)),
        ("exact_match_rate".into(), json!(exact as f64 / total as f64)),
        (
            "partial_match_rate".into(),
            json!(partial as f64 / total as f64),
        ),
        ("error_count".into(), json!(errors)),
    ]);
    summary
}

/// Summary for function-calling benchmarks: accuracy plus call-level
/// precision, recall, and F1.
pub fn toolcall_summary(results: &[SampleResult]) -> MetricsSummary {
    let mut summary = MetricsSummary::default();
    if results.is_empty() {
        return summary;
    }

    let total = results.len();
    let success = results.iter().filter(|r| r.success).count();
    let errors = results.iter().filter(|r| r.error.is_some()).count();
    let total_score: f64 = results.iter().map(|r| r.score).sum();

    let mut expected_calls = 0usize;
    let mut predicted_calls = 0usize;
    let mut correct_calls = 0usize;
    for r in results {
        if let Some(stats) = r.call_stats {
            expected_calls += stats.expected_calls;
            predicted_calls += stats.predicted_calls;
            correct_calls += stats.matched_calls;
        }
    }

    summary.accuracy = success as f64 / total as f64;
    summary.average_score = total_score / total as f64;

    if predicted_calls > 0 {
        summary.precision = correct_calls as f64 / predicted_calls as f64;
    }
    if expected_calls > 0 {
        summary.recall = correct_calls as f64 / expected_calls as f64;
    }
    if summary.precision + summary.recall > 0.0 {
        summary.f1_score =
            2.0 * summary.precision * summary.recall / (summary.precision + summary.recall);
    }

    summary.extra = JsonMap::from_iter([
        ("total_samples".into(), json!(total)),
        ("success_count".into(), json!(success)),
        ("error_count".into(), json!(errors)),
        ("total_expected_calls".into(), json!(expected_calls)),
        ("total_predicted_calls".into(), json!(predicted_calls)),
        ("correct_calls".into(), json!(correct_calls)),
    ]);
    summary
}

/// Summary for judge benchmarks: pass/excellent rates and per-dimension
/// averages.
pub fn judge_summary(results: &[SampleResult]) -> MetricsSummary {
    let mut summary = MetricsSummary::default();
    if results.is_empty() {
        return summary;
    }

    let n = results.len() as f64;
    let mut correctness = 0.0;
    let mut clarity = 0.0;
    let mut difficulty_match = 0.0;
    let mut completeness = 0.0;
    let mut total_score = 0.0;
    let mut passed = 0usize;
    let mut excellent = 0usize;

    for r in results {
        if let Some(judge) = &r.judge {
            correctness += judge.correctness;
            clarity += judge.clarity;
            difficulty_match += judge.difficulty_match;
            completeness += judge.completeness;
        }
        total_score += r.score;
        if r.success {
            passed += 1;
        }
        if r.score >= EXCELLENT_THRESHOLD {
            excellent += 1;
        }
    }

    summary.average_score = total_score / n;
    summary.pass_rate = passed as f64 / n;
    summary.excellent_rate = excellent as f64 / n;
    summary.accuracy = summary.pass_rate;
    summary.dimension_scores = HashMap::from_iter([
        ("correctness".to_string(), correctness / n),
        ("clarity".to_string(), clarity / n),
        ("difficulty_match".to_string(), difficulty_match / n),
        ("completeness".to_string(), completeness / n),
    ]);
    summary.extra = JsonMap::from_iter([
        ("total_samples".into(), json!(results.len())),
        ("success_count".into(), json!(passed)),
        ("excellent_count".into(), json!(excellent)),
    ]);
    summary
}

/// Per-category totals, accuracy, and average score.
pub fn category_metrics(results: &[SampleResult]) -> HashMap<String, CategoryMetrics> {
    let mut by_category: HashMap<String, CategoryMetrics> = HashMap::new();

    for r in results {
        let category = if r.category.is_empty() {
            "default".to_string()
        } else {
            r.category.clone()
        };
        let entry = by_category
            .entry(category.clone())
            .or_insert_with(|| CategoryMetrics {
                category,
                ..CategoryMetrics::default()
            });
        entry.total += 1;
        if r.success {
            entry.success += 1;
        }
        entry.average_score += r.score;
    }

    for cm in by_category.values_mut() {
        if cm.total > 0 {
            cm.accuracy = cm.success as f64 / cm.total as f64;
            cm.average_score /= cm.total as f64;
        }
    }
    by_category
}

/// Per-level totals and exact/partial match rates. Unleveled samples
/// (level 0) are folded into level 1.
pub fn level_metrics(results: &[SampleResult]) -> HashMap<u32, LevelMetrics> {
    let mut by_level: HashMap<u32, LevelMetrics> = HashMap::new();

    for r in results {
        let level = if r.level == 0 { 1 } else { r.level };
        let entry = by_level.entry(level).or_insert_with(|| LevelMetrics {
            level,
            ..LevelMetrics::default()
        });
        entry.total += 1;
        if r.success {
            entry.exact_matches += 1;
        }
        if r.partial_success {
            entry.partial_matches += 1;
        }
    }

    for lm in by_level.values_mut() {
        if lm.total > 0 {
            lm.exact_match_rate = lm.exact_matches as f64 / lm.total as f64;
            lm.partial_match_rate = lm.partial_matches as f64 / lm.total as f64;
        }
    }
    by_level
}

/// Shape of accuracy across difficulty levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformancePattern {
    /// Accuracy drops as difficulty rises, as expected.
    ExpectedDegradation,
    /// Level 2 outperforms level 1.
    AnomalyLevel2Better,
    /// No monotone relationship between level and accuracy.
    Inconsistent,
}

/// Level-to-level accuracy analysis for leveled benchmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionAnalysis {
    pub level_rates: BTreeMap<u32, f64>,
    /// Accuracy drop between level pairs, keyed `level1_to_level2` etc.
    pub drops: BTreeMap<String, f64>,
    /// None when fewer than two levels are present.
    pub pattern: Option<PerformancePattern>,
}

/// Analyze how exact-match accuracy moves across difficulty levels 1-3.
pub fn analyze_difficulty_progression(
    level_metrics: &HashMap<u32, LevelMetrics>,
) -> ProgressionAnalysis {
    let level_rates: BTreeMap<u32, f64> = level_metrics
        .iter()
        .map(|(level, lm)| (*level, lm.exact_match_rate))
        .collect();

    let mut drops = BTreeMap::new();
    if let Some(rate1) = level_rates.get(&1) {
        if let Some(rate2) = level_rates.get(&2) {
            drops.insert("level1_to_level2".to_string(), rate1 - rate2);
        }
        if let Some(rate3) = level_rates.get(&3) {
            drops.insert("level1_to_level3".to_string(), rate1 - rate3);
        }
    }
    if let (Some(rate2), Some(rate3)) = (level_rates.get(&2), level_rates.get(&3)) {
        drops.insert("level2_to_level3".to_string(), rate2 - rate3);
    }

    let pattern = if level_rates.len() >= 2 {
        let rate = |l: u32| level_rates.get(&l).copied().unwrap_or(0.0);
        if rate(1) > rate(2) && (level_rates.len() < 3 || rate(2) > rate(3)) {
            Some(PerformancePattern::ExpectedDegradation)
        } else if rate(1) < rate(2) {
            Some(PerformancePattern::AnomalyLevel2Better)
        } else {
            Some(PerformancePattern::Inconsistent)
        }
    } else {
        None
    };

    ProgressionAnalysis {
        level_rates,
        drops,
        pattern,
    }
}
