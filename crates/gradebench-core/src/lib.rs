//! Core library for gradebench.
//!
//! This crate provides the building blocks for scoring AI agents against
//! answer-matching and rubric benchmarks:
//!
//! - [`config`]: Configuration loading and validation
//! - [`datasets`]: Dataset loaders (short-answer QA, function-calling,
//!   generated items)
//! - [`answer`]: Free-text answer normalization and matching
//! - [`calls`]: Function-call extraction, ground-truth parsing, matching
//! - [`judge`]: Judge-response parsing and rubric scoring
//! - [`benchmarks`]: Per-kind scoring built on the above
//! - [`harness`]: The run loop driving an agent through a benchmark
//! - [`metrics`]: Aggregation into summaries and breakdowns
//! - [`export`]: Submission files, Markdown reports, JSON dumps
//! - [`error`]: Unified error types
//!
//! # Architecture
//!
//! Datasets are canonicalized into [`types::Sample`] records at load
//! time. The harness feeds each sample to an [`harness::Agent`] under a
//! timeout and hands the raw response to a [`benchmarks::Benchmark`] for
//! pure, deterministic scoring. Per-sample failures are recorded and the
//! run continues; cancellation returns partial results.

// Foundation modules (no internal dependencies)
pub mod types;

// Scoring primitives
pub mod answer;
pub mod calls;
pub mod judge;

// Core modules
pub mod config;
pub mod error;
pub mod metrics;
pub mod reporter;

// Data loading
pub mod datasets;

// Execution
pub mod benchmarks;
pub mod export;
pub mod harness;

pub use error::{GradebenchError, Result};
pub use types::{EvalResult, Expected, FunctionCall, Sample, SampleResult};
