//! Unified error types for gradebench.

use crate::types::EvalResult;
use thiserror::Error;

/// Errors surfaced by the core library.
///
/// Per-sample failures (agent errors, extraction failures, timeouts) never
/// appear here: they are recorded on `SampleResult::error` and the run
/// continues. Only load-time failures and explicit cancellation reach the
/// caller as `GradebenchError`.
#[derive(Debug, Error)]
pub enum GradebenchError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("dataset {name} failed to load: {source}")]
    Dataset {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("run cancelled: {reason}")]
    Cancelled {
        reason: String,
        /// Results accumulated before the cancellation took effect.
        partial: Box<EvalResult>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GradebenchError {
    pub fn dataset(name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Dataset {
            name: name.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GradebenchError>;
