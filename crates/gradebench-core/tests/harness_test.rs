//! End-to-end harness tests with a scripted in-process agent.

use async_trait::async_trait;
use gradebench_core::benchmarks::AssistantBenchmark;
use gradebench_core::config::EngineConfig;
use gradebench_core::harness::{Agent, AgentInput, Command, Harness};
use gradebench_core::types::{Expected, Sample};
use gradebench_core::GradebenchError;
use std::collections::HashMap;
use std::time::Duration;

/// Replies with a canned response per sample id.
struct ScriptedAgent {
    responses: HashMap<String, String>,
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run(&self, input: AgentInput) -> anyhow::Result<String> {
        match self.responses.get(&input.sample_id) {
            Some(response) => Ok(response.clone()),
            None => Err(anyhow::anyhow!("no script for {}", input.sample_id)),
        }
    }
}

struct SlowAgent;

#[async_trait]
impl Agent for SlowAgent {
    fn name(&self) -> &str {
        "slow"
    }

    async fn run(&self, _input: AgentInput) -> anyhow::Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".into())
    }
}

fn qa_sample(id: &str, expected: &str, level: u32) -> Sample {
    Sample {
        id: id.into(),
        input: "q".into(),
        expected: Expected::Text(expected.into()),
        category: String::new(),
        level,
        metadata: Default::default(),
        tools: Vec::new(),
        files: Vec::new(),
    }
}

fn engine(timeout_seconds: f64) -> EngineConfig {
    EngineConfig {
        timeout_seconds,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn run_scores_and_aggregates() {
    let samples = vec![
        qa_sample("s1", "Paris", 1),
        qa_sample("s2", "42", 1),
        qa_sample("s3", "blue", 2),
    ];
    let agent = ScriptedAgent {
        responses: HashMap::from([
            ("s1".to_string(), "FINAL ANSWER: paris".to_string()),
            ("s2".to_string(), "I think it is 41".to_string()),
            ("s3".to_string(), "FINAL ANSWER: blue".to_string()),
        ]),
    };
    let benchmark = AssistantBenchmark::new("qa".into(), 0.7);

    let mut harness = Harness::new(engine(5.0));
    let result = harness.run(&benchmark, &agent, &samples).await.unwrap();

    assert_eq!(result.total_samples, 3);
    assert_eq!(result.success_count, 2);
    assert!((result.overall_accuracy - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(result.level_metrics[&1].exact_matches, 1);
    assert_eq!(result.level_metrics[&2].exact_matches, 1);
    // Two levels present: progression analysis rides in the summary.
    assert!(result.metrics.extra.contains_key("difficulty_progression"));
    assert_eq!(result.detailed_results.len(), 3);
}

#[tokio::test]
async fn agent_errors_are_recorded_not_fatal() {
    let samples = vec![qa_sample("known", "yes", 1), qa_sample("unknown", "no", 1)];
    let agent = ScriptedAgent {
        responses: HashMap::from([("known".to_string(), "FINAL ANSWER: yes".to_string())]),
    };
    let benchmark = AssistantBenchmark::new("qa".into(), 0.7);

    let mut harness = Harness::new(engine(5.0));
    let result = harness.run(&benchmark, &agent, &samples).await.unwrap();

    assert_eq!(result.total_samples, 2);
    assert_eq!(result.success_count, 1);
    let failed = &result.detailed_results[1];
    assert!(failed.error.as_deref().unwrap().contains("agent error"));
    assert!(!failed.success);
}

#[tokio::test]
async fn slow_samples_time_out_and_the_run_continues() {
    let samples = vec![qa_sample("s1", "x", 1)];
    let benchmark = AssistantBenchmark::new("qa".into(), 0.7);

    let mut harness = Harness::new(engine(0.05));
    let result = harness.run(&benchmark, &SlowAgent, &samples).await.unwrap();

    assert_eq!(result.total_samples, 1);
    assert_eq!(result.success_count, 0);
    assert!(result.detailed_results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn stop_returns_partial_results_with_cancellation() {
    let samples = vec![qa_sample("s1", "a", 1), qa_sample("s2", "b", 1)];
    let agent = ScriptedAgent {
        responses: HashMap::from([
            ("s1".to_string(), "FINAL ANSWER: a".to_string()),
            ("s2".to_string(), "FINAL ANSWER: b".to_string()),
        ]),
    };
    let benchmark = AssistantBenchmark::new("qa".into(), 0.7);

    let mut harness = Harness::new(engine(5.0));
    harness
        .command_sender()
        .send(Command::Stop {
            reason: "test stop".into(),
        })
        .unwrap();

    let err = harness
        .run(&benchmark, &agent, &samples)
        .await
        .expect_err("run should cancel");
    match err {
        GradebenchError::Cancelled { reason, partial } => {
            assert_eq!(reason, "test stop");
            assert_eq!(partial.total_samples, 0);
            assert_eq!(partial.benchmark_name, "qa");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_positive_or_nan_timeout_is_an_error() {
    let samples = vec![qa_sample("s1", "a", 1)];
    let benchmark = AssistantBenchmark::new("qa".into(), 0.7);

    for bad in [-1.0, 0.0, f64::NAN] {
        let agent = ScriptedAgent {
            responses: HashMap::new(),
        };
        let mut harness = Harness::new(engine(bad));
        let err = harness
            .run(&benchmark, &agent, &samples)
            .await
            .expect_err("bad timeout should be rejected");
        assert!(matches!(err, GradebenchError::Config(_)), "got {err}");
    }
}

#[tokio::test]
async fn max_samples_caps_the_run() {
    let samples = vec![
        qa_sample("s1", "a", 1),
        qa_sample("s2", "b", 1),
        qa_sample("s3", "c", 1),
    ];
    let agent = ScriptedAgent {
        responses: HashMap::from([
            ("s1".to_string(), "FINAL ANSWER: a".to_string()),
            ("s2".to_string(), "FINAL ANSWER: b".to_string()),
        ]),
    };
    let benchmark = AssistantBenchmark::new("qa".into(), 0.7);

    let mut config = engine(5.0);
    config.max_samples = Some(2);
    let mut harness = Harness::new(config);
    let result = harness.run(&benchmark, &agent, &samples).await.unwrap();

    assert_eq!(result.total_samples, 2);
    assert_eq!(result.success_count, 2);
}
