//! Harness - drives an agent through a benchmark's samples.
//!
//! The harness owns the run loop: it feeds each sample to the agent under
//! a wall-clock timeout, hands the response to the benchmark for scoring,
//! and aggregates the finished results. A command channel allows an
//! external caller (signal handler, UI) to stop the run between samples;
//! a stopped run returns the results gathered so far alongside the
//! cancellation error.

use crate::benchmarks::Benchmark;
use crate::config::{ConfigError, EngineConfig};
use crate::error::{GradebenchError, Result};
use crate::metrics::{analyze_difficulty_progression, category_metrics, level_metrics};
use crate::reporter::{NullReporter, ProgressEvent, ProgressReporter};
use crate::types::{EvalResult, JsonMap, Sample, SampleResult, ToolDefinition};
use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// What the agent sees for one sample. Ground truth is deliberately
/// absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInput {
    pub sample_id: String,
    pub input: String,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub metadata: JsonMap,
}

impl AgentInput {
    pub fn from_sample(sample: &Sample) -> Self {
        Self {
            sample_id: sample.id.clone(),
            input: sample.input.clone(),
            tools: sample.tools.clone(),
            files: sample.files.clone(),
            metadata: sample.metadata.clone(),
        }
    }
}

/// The system under evaluation. Implementations wrap a subprocess, an
/// HTTP endpoint, or an in-process model.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    /// Produce a raw text response for one sample.
    async fn run(&self, input: AgentInput) -> anyhow::Result<String>;
}

/// Commands accepted by a running harness.
#[derive(Debug, Clone)]
pub enum Command {
    /// Stop after the in-flight sample; partial results are returned.
    Stop { reason: String },
}

pub struct Harness {
    engine: EngineConfig,
    reporter: Arc<dyn ProgressReporter>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    cmd_rx: Option<mpsc::UnboundedReceiver<Command>>,
}

impl Harness {
    pub fn new(engine: EngineConfig) -> Self {
        Self::with_reporter(engine, Arc::new(NullReporter))
    }

    pub fn with_reporter(engine: EngineConfig, reporter: Arc<dyn ProgressReporter>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            reporter,
            cmd_tx,
            cmd_rx: Some(cmd_rx),
        }
    }

    /// Handle for requesting cancellation from another task.
    pub fn command_sender(&self) -> mpsc::UnboundedSender<Command> {
        self.cmd_tx.clone()
    }

    /// Run the agent over all samples and aggregate the results.
    ///
    /// Per-sample failures (agent errors, timeouts) are recorded on the
    /// sample's result and the run continues; only cancellation ends the
    /// run early.
    pub async fn run(
        &mut self,
        benchmark: &dyn Benchmark,
        agent: &dyn Agent,
        samples: &[Sample],
    ) -> Result<EvalResult> {
        // A harness can be built with an arbitrary EngineConfig, so the
        // timeout is checked here, not just at config load.
        let timeout_seconds = self.engine.timeout_seconds;
        if !timeout_seconds.is_finite() || timeout_seconds <= 0.0 {
            return Err(GradebenchError::Config(ConfigError::Invalid(format!(
                "timeout_seconds must be positive, got {timeout_seconds}"
            ))));
        }

        let mut cmd_rx = self
            .cmd_rx
            .take()
            .ok_or_else(|| GradebenchError::Internal(anyhow!("run() can only be called once")))?;

        let samples = match self.engine.max_samples {
            Some(n) => &samples[..samples.len().min(n)],
            None => samples,
        };

        self.reporter.report(ProgressEvent::RunStarted {
            benchmark_name: benchmark.name().to_string(),
            agent_name: agent.name().to_string(),
            total_samples: samples.len(),
        });
        info!(
            benchmark = benchmark.name(),
            agent = agent.name(),
            samples = samples.len(),
            "starting run"
        );

        let timeout = Duration::from_secs_f64(timeout_seconds);
        let run_start = Instant::now();
        let mut results: Vec<SampleResult> = Vec::with_capacity(samples.len());

        for (index, sample) in samples.iter().enumerate() {
            if let Ok(Command::Stop { reason }) = cmd_rx.try_recv() {
                info!(%reason, "stop requested");
                self.reporter.report(ProgressEvent::RunCancelled {
                    benchmark_name: benchmark.name().to_string(),
                    completed: results.len(),
                    total: samples.len(),
                });
                let partial =
                    finalize(benchmark, agent.name(), results, run_start.elapsed());
                return Err(GradebenchError::Cancelled {
                    reason,
                    partial: Box::new(partial),
                });
            }

            let sample_start = Instant::now();
            let response = tokio::time::timeout(timeout, agent.run(AgentInput::from_sample(sample)))
                .await;

            let mut result = match response {
                Ok(Ok(text)) => benchmark.score(sample, &text),
                Ok(Err(e)) => {
                    warn!(sample_id = %sample.id, error = %e, "agent error");
                    SampleResult::failed(sample, format!("agent error: {e}"))
                }
                Err(_) => {
                    warn!(sample_id = %sample.id, "sample timed out");
                    SampleResult::failed(
                        sample,
                        format!("timed out after {:.0}s", self.engine.timeout_seconds),
                    )
                }
            };
            result.duration_ms = sample_start.elapsed().as_secs_f64() * 1000.0;

            self.reporter.report(ProgressEvent::SampleCompleted {
                sample_id: result.sample_id.clone(),
                index,
                total: samples.len(),
                success: result.success,
                partial_success: result.partial_success,
                score: result.score,
                duration_ms: result.duration_ms,
                error: result.error.clone(),
            });
            results.push(result);
        }

        let eval = finalize(benchmark, agent.name(), results, run_start.elapsed());
        self.reporter.report(ProgressEvent::RunCompleted {
            benchmark_name: eval.benchmark_name.clone(),
            total_samples: eval.total_samples,
            success_count: eval.success_count,
            accuracy: eval.overall_accuracy,
            total_duration_ms: eval.total_duration_ms,
        });
        Ok(eval)
    }
}

/// Aggregate finished sample results into the run-level result.
fn finalize(
    benchmark: &dyn Benchmark,
    agent_name: &str,
    results: Vec<SampleResult>,
    elapsed: Duration,
) -> EvalResult {
    let mut eval = EvalResult::new(benchmark.name(), agent_name);
    eval.total_samples = results.len();
    eval.success_count = results.iter().filter(|r| r.success).count();
    if eval.total_samples > 0 {
        eval.overall_accuracy = eval.success_count as f64 / eval.total_samples as f64;
    }
    eval.category_metrics = category_metrics(&results);
    eval.level_metrics = level_metrics(&results);
    eval.metrics = benchmark.summarize(&results);
    eval.total_duration_ms = elapsed.as_secs_f64() * 1000.0;

    if eval.level_metrics.len() >= 2 {
        let progression = analyze_difficulty_progression(&eval.level_metrics);
        if let Ok(value) = serde_json::to_value(&progression) {
            eval.metrics
                .extra
                .insert("difficulty_progression".to_string(), value);
        }
    }

    eval.detailed_results = results;
    eval
}
