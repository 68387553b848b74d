//! Progress reporting trait and types for evaluation runs.

use serde::{Deserialize, Serialize};

/// Events emitted during an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// Run started with total sample count.
    RunStarted {
        benchmark_name: String,
        agent_name: String,
        total_samples: usize,
    },
    /// A sample was scored (pass, partial, or fail).
    SampleCompleted {
        sample_id: String,
        index: usize,
        total: usize,
        success: bool,
        partial_success: bool,
        score: f64,
        duration_ms: f64,
        error: Option<String>,
    },
    /// Run finished normally.
    RunCompleted {
        benchmark_name: String,
        total_samples: usize,
        success_count: usize,
        accuracy: f64,
        total_duration_ms: f64,
    },
    /// Run stopped early by a cancellation request.
    RunCancelled {
        benchmark_name: String,
        completed: usize,
        total: usize,
    },
}

/// Trait for progress reporters.
///
/// Implementors receive events during a run and can display progress,
/// log to file, etc.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// A no-op reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&self, _event: ProgressEvent) {}
}

/// A simple reporter that prints to stdout.
#[derive(Debug, Default)]
pub struct PrintReporter;

impl ProgressReporter for PrintReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RunStarted {
                benchmark_name,
                agent_name,
                total_samples,
            } => {
                println!("Running {benchmark_name} with {agent_name}: {total_samples} samples");
            }
            ProgressEvent::SampleCompleted {
                sample_id,
                index,
                total,
                success,
                partial_success,
                error,
                ..
            } => {
                let status = if error.is_some() {
                    "ERROR"
                } else if success {
                    "PASS"
                } else if partial_success {
                    "PARTIAL"
                } else {
                    "FAIL"
                };
                println!("[{status}] ({}/{total}) {sample_id}", index + 1);
            }
            ProgressEvent::RunCompleted {
                benchmark_name,
                total_samples,
                success_count,
                accuracy,
                ..
            } => {
                println!(
                    "{benchmark_name} completed: {success_count}/{total_samples} passed \
                     ({:.1}% accuracy)",
                    accuracy * 100.0
                );
            }
            ProgressEvent::RunCancelled {
                benchmark_name,
                completed,
                total,
            } => {
                println!("{benchmark_name} cancelled after {completed}/{total} samples");
            }
        }
    }
}
