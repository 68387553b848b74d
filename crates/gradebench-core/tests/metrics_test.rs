//! Tests for metrics aggregation.

use gradebench_core::metrics::{
    analyze_difficulty_progression, assistant_summary, category_metrics, judge_summary,
    level_metrics, toolcall_summary, PerformancePattern,
};
use gradebench_core::types::{CallStats, Expected, JudgeScore, Sample, SampleResult};

fn sample(id: &str, category: &str, level: u32) -> Sample {
    Sample {
        id: id.into(),
        input: "q".into(),
        expected: Expected::Text("a".into()),
        category: category.into(),
        level,
        metadata: Default::default(),
        tools: Vec::new(),
        files: Vec::new(),
    }
}

fn result(id: &str, category: &str, level: u32, success: bool, partial: bool) -> SampleResult {
    let mut r = SampleResult::for_sample(&sample(id, category, level));
    r.success = success;
    r.partial_success = partial || success;
    r.score = if success {
        1.0
    } else if partial {
        0.5
    } else {
        0.0
    };
    r
}

#[test]
fn assistant_summary_counts_exact_and_partial() {
    let results = vec![
        result("1", "", 1, true, true),
        result("2", "", 1, false, true),
        result("3", "", 1, false, false),
        SampleResult::failed(&sample("4", "", 1), "boom"),
    ];
    let summary = assistant_summary(&results);
    assert_eq!(summary.accuracy, 0.25);
    assert_eq!(summary.average_score, (1.0 + 0.5) / 4.0);
    assert_eq!(summary.extra["exact_matches"], 1);
    assert_eq!(summary.extra["partial_matches"], 2);
    assert_eq!(summary.extra["error_count"], 1);
}

#[test]
fn empty_results_yield_default_summary() {
    let summary = assistant_summary(&[]);
    assert_eq!(summary.accuracy, 0.0);
    assert!(summary.extra.is_empty());
}

#[test]
fn toolcall_summary_computes_precision_recall_f1() {
    let mut a = result("1", "simple", 1, true, true);
    a.call_stats = Some(CallStats {
        matched_calls: 2,
        expected_calls: 2,
        predicted_calls: 2,
    });
    let mut b = result("2", "simple", 1, false, false);
    b.call_stats = Some(CallStats {
        matched_calls: 1,
        expected_calls: 2,
        predicted_calls: 3,
    });

    let summary = toolcall_summary(&[a, b]);
    // 3 correct of 5 predicted, 3 correct of 4 expected.
    assert_eq!(summary.precision, 3.0 / 5.0);
    assert_eq!(summary.recall, 3.0 / 4.0);
    let expected_f1 = 2.0 * summary.precision * summary.recall / (summary.precision + summary.recall);
    assert!((summary.f1_score - expected_f1).abs() < 1e-12);
    assert_eq!(summary.accuracy, 0.5);
}

#[test]
fn toolcall_summary_with_no_calls_has_zero_f1() {
    let mut r = result("1", "", 1, false, false);
    r.call_stats = Some(CallStats::default());
    let summary = toolcall_summary(&[r]);
    assert_eq!(summary.precision, 0.0);
    assert_eq!(summary.recall, 0.0);
    assert_eq!(summary.f1_score, 0.0);
}

#[test]
fn judge_summary_averages_dimensions_and_rates() {
    let mk = |total: f64, correctness: f64| {
        let mut r = result("x", "", 1, total >= 3.0, total >= 3.0);
        r.score = total;
        r.judge = Some(JudgeScore {
            correctness,
            clarity: 3.0,
            difficulty_match: 3.0,
            completeness: 3.0,
            total_score: total,
            comments: String::new(),
        });
        r
    };
    let results = vec![mk(4.5, 5.0), mk(2.0, 1.0)];
    let summary = judge_summary(&results);
    assert_eq!(summary.pass_rate, 0.5);
    assert_eq!(summary.excellent_rate, 0.5);
    assert_eq!(summary.accuracy, 0.5);
    assert_eq!(summary.dimension_scores["correctness"], 3.0);
    assert_eq!(summary.average_score, 3.25);
}

#[test]
fn category_metrics_group_and_default_empty_category() {
    let results = vec![
        result("1", "math", 1, true, true),
        result("2", "math", 1, false, false),
        result("3", "", 1, true, true),
    ];
    let by_cat = category_metrics(&results);
    assert_eq!(by_cat["math"].total, 2);
    assert_eq!(by_cat["math"].accuracy, 0.5);
    assert_eq!(by_cat["default"].total, 1);
}

#[test]
fn level_metrics_fold_level_zero_into_one() {
    let results = vec![
        result("1", "", 0, true, true),
        result("2", "", 1, false, true),
        result("3", "", 2, false, false),
    ];
    let by_level = level_metrics(&results);
    assert_eq!(by_level[&1].total, 2);
    assert_eq!(by_level[&1].exact_matches, 1);
    assert_eq!(by_level[&1].partial_match_rate, 1.0);
    assert_eq!(by_level[&2].total, 1);
    assert!(!by_level.contains_key(&0));
}

#[test]
fn progression_detects_expected_degradation() {
    let results: Vec<_> = [
        (1, true),
        (1, true),
        (2, true),
        (2, false),
        (3, false),
        (3, false),
    ]
    .iter()
    .enumerate()
    .map(|(i, (level, ok))| result(&i.to_string(), "", *level, *ok, *ok))
    .collect();

    let analysis = analyze_difficulty_progression(&level_metrics(&results));
    assert_eq!(analysis.pattern, Some(PerformancePattern::ExpectedDegradation));
    assert_eq!(analysis.drops["level1_to_level2"], 0.5);
    assert_eq!(analysis.drops["level1_to_level3"], 1.0);
    assert_eq!(analysis.drops["level2_to_level3"], 0.5);
}

#[test]
fn progression_flags_level2_anomaly() {
    let results: Vec<_> = [(1, false), (1, false), (2, true), (2, true)]
        .iter()
        .enumerate()
        .map(|(i, (level, ok))| result(&i.to_string(), "", *level, *ok, *ok))
        .collect();
    let analysis = analyze_difficulty_progression(&level_metrics(&results));
    assert_eq!(analysis.pattern, Some(PerformancePattern::AnomalyLevel2Better));
}

#[test]
fn progression_needs_two_levels() {
    let results = vec![result("1", "", 1, true, true)];
    let analysis = analyze_difficulty_progression(&level_metrics(&results));
    assert!(analysis.pattern.is_none());
    assert!(analysis.drops.is_empty());
}
