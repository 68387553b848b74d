//! Tests for result exporters.

use gradebench_core::export::{render_report, write_json, write_submission};
use gradebench_core::types::{EvalResult, Expected, Sample, SampleResult};
use serde_json::Value;
use tempfile::tempdir;

fn result_with_samples() -> EvalResult {
    let sample = Sample {
        id: "task-1".into(),
        input: "q".into(),
        expected: Expected::Text("Paris".into()),
        category: String::new(),
        level: 1,
        metadata: Default::default(),
        tools: Vec::new(),
        files: Vec::new(),
    };

    let mut ok = SampleResult::for_sample(&sample);
    ok.predicted = Value::String("Paris".into());
    ok.success = true;
    ok.score = 1.0;

    let mut failed = SampleResult::failed(&sample, "agent error: crashed");
    failed.sample_id = "task-2".into();
    failed.agent_response = "raw text from the agent".into();

    let mut eval = EvalResult::new("qa", "agent-x");
    eval.total_samples = 2;
    eval.success_count = 1;
    eval.overall_accuracy = 0.5;
    eval.detailed_results = vec![ok, failed];
    eval
}

#[test]
fn submission_has_one_line_per_sample() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out/submission.jsonl");
    write_submission(&result_with_samples(), &path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<Value> = contents
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["task_id"], "task-1");
    assert_eq!(lines[0]["model_answer"], "Paris");
    // Null prediction falls back to the raw response.
    assert_eq!(lines[1]["model_answer"], "raw text from the agent");
}

#[test]
fn json_dump_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("result.json");
    let result = result_with_samples();
    write_json(&result, &path).unwrap();

    let loaded: EvalResult =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, result);
}

#[test]
fn report_lists_failed_samples() {
    let report = render_report(&result_with_samples());
    assert!(report.contains("## Failures"));
    assert!(report.contains("task-2"));
    assert!(report.contains("agent error: crashed"));
    // Passing samples are not listed.
    assert!(!report.contains("- `task-1`"));
}
