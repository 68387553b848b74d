//! Benchmark scoring implementations.
//!
//! A [`Benchmark`] turns one agent response into a [`SampleResult`] and
//! aggregates finished results into a [`MetricsSummary`]. Scoring is pure:
//! no IO, no model calls, so the same response always scores the same.

use crate::config::{BenchmarkConfig, BenchmarkKind, EngineConfig};
use crate::types::{MetricsSummary, Sample, SampleResult};

mod assistant;
pub use assistant::AssistantBenchmark;

mod toolcall;
pub use toolcall::ToolcallBenchmark;

mod judge;
pub use judge::JudgeBenchmark;

pub trait Benchmark: Send + Sync {
    fn name(&self) -> &str;

    /// Score one agent response against its sample.
    fn score(&self, sample: &Sample, response: &str) -> SampleResult;

    /// Aggregate per-sample results into the benchmark's summary metrics.
    fn summarize(&self, results: &[SampleResult]) -> MetricsSummary;
}

pub fn get_benchmark(config: &BenchmarkConfig, engine: &EngineConfig) -> Box<dyn Benchmark> {
    match &config.kind {
        BenchmarkKind::Assistant { .. } => Box::new(AssistantBenchmark::new(
            config.name.clone(),
            engine.coverage_threshold,
        )),
        BenchmarkKind::Toolcall { .. } => Box::new(ToolcallBenchmark::new(config.name.clone())),
        BenchmarkKind::Judge { .. } => Box::new(JudgeBenchmark::new(
            config.name.clone(),
            engine.pass_threshold,
        )),
    }
}
