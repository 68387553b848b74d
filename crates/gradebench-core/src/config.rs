//! Configuration loading and models for gradebench.
//!
//! Configuration is loaded via figment from multiple layers:
//! 1. YAML file (base configuration)
//! 2. Environment variables (GRADEBENCH_ prefix, __ as nested separator)
//! 3. CLI overrides (passed programmatically)

use crate::answer::COVERAGE_THRESHOLD;
use crate::judge::PASS_THRESHOLD;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Figment(#[from] figment::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// DEFAULTS (all in one place)
// ============================================================================

fn default_timeout_seconds() -> f64 {
    300.0
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_output_directory() -> String {
    "./results".to_string()
}

fn default_coverage_threshold() -> f64 {
    COVERAGE_THRESHOLD
}

fn default_pass_threshold() -> f64 {
    PASS_THRESHOLD
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Wall-clock budget per sample.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    /// Cap on samples per benchmark; None runs the full dataset.
    #[serde(default)]
    pub max_samples: Option<usize>,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_coverage_threshold")]
    pub coverage_threshold: f64,
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_samples: None,
            verbose: false,
            coverage_threshold: default_coverage_threshold(),
            pass_threshold: default_pass_threshold(),
        }
    }
}

// ============================================================================
// AGENT CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

// ============================================================================
// BENCHMARK CONFIG (typed per kind, not HashMap)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: BenchmarkKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BenchmarkKind {
    /// Short-answer QA scored by normalized answer matching.
    Assistant {
        data_file: String,
        /// Restrict the run to one difficulty level.
        #[serde(default)]
        level: Option<u32>,
    },
    /// Function-calling tasks scored call-by-call against ground truth.
    Toolcall {
        data_file: String,
        /// Separate ground-truth file joined to the data by sample id.
        /// When absent, ground truth is read from the data file itself.
        #[serde(default)]
        answer_file: Option<String>,
    },
    /// Rubric scoring of generated items by a judge model's responses.
    Judge { data_file: String },
}

impl BenchmarkKind {
    pub fn data_file(&self) -> &str {
        match self {
            Self::Assistant { data_file, .. }
            | Self::Toolcall { data_file, .. }
            | Self::Judge { data_file } => data_file,
        }
    }
}

// ============================================================================
// OUTPUT CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

// ============================================================================
// TOP-LEVEL CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl EvalConfig {
    pub fn agent(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn benchmark(&self, name: &str) -> Option<&BenchmarkConfig> {
        self.benchmarks.iter().find(|b| b.name == name)
    }
}

// ============================================================================
// CLI OVERRIDES
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
}

// ============================================================================
// LOADING
// ============================================================================

pub fn load_config(path: impl AsRef<Path>) -> Result<EvalConfig, ConfigError> {
    load_config_with_overrides(path, CliOverrides::default())
}

pub fn load_config_with_overrides(
    path: impl AsRef<Path>,
    overrides: CliOverrides,
) -> Result<EvalConfig, ConfigError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let interpolated = interpolate_env_vars(&contents);

    let mut figment = Figment::new()
        .merge(Yaml::string(&interpolated))
        .merge(Env::prefixed("GRADEBENCH_").split("__"));

    if overrides.timeout_seconds.is_some()
        || overrides.max_samples.is_some()
        || overrides.verbose.is_some()
    {
        let mut config_overrides = HashMap::new();
        if let Some(t) = overrides.timeout_seconds {
            config_overrides.insert("timeout_seconds".to_string(), serde_json::json!(t));
        }
        if let Some(n) = overrides.max_samples {
            config_overrides.insert("max_samples".to_string(), serde_json::json!(n));
        }
        if let Some(v) = overrides.verbose {
            config_overrides.insert("verbose".to_string(), serde_json::json!(v));
        }

        #[derive(Serialize)]
        struct ConfigOverride {
            config: HashMap<String, serde_json::Value>,
        }

        figment = figment.merge(Serialized::defaults(ConfigOverride {
            config: config_overrides,
        }));
    }

    if let Some(output_dir) = overrides.output_dir {
        #[derive(Serialize)]
        struct OutputOverride {
            output: OutputConfig,
        }

        figment = figment.merge(Serialized::defaults(OutputOverride {
            output: OutputConfig {
                directory: output_dir,
            },
        }));
    }

    let cfg: EvalConfig = figment.extract()?;
    validate_config(&cfg)?;
    Ok(cfg)
}

fn interpolate_env_vars(input: &str) -> String {
    use once_cell::sync::Lazy;
    use regex::Regex;
    use std::env;

    static ENV_VAR_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("valid regex")
    });

    ENV_VAR_RE
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_val = caps.get(2).map(|m| m.as_str());
            match env::var(var_name) {
                Ok(val) => val,
                Err(_) => default_val.unwrap_or("").to_string(),
            }
        })
        .to_string()
}

fn validate_config(cfg: &EvalConfig) -> Result<(), ConfigError> {
    if cfg.benchmarks.is_empty() {
        return Err(ConfigError::Invalid(
            "at least one benchmark is required".into(),
        ));
    }
    if cfg
        .benchmarks
        .iter()
        .any(|b| b.name.trim().is_empty() || b.kind.data_file().trim().is_empty())
    {
        return Err(ConfigError::Invalid(
            "benchmarks must have non-empty name and data_file".into(),
        ));
    }
    if cfg
        .agents
        .iter()
        .any(|a| a.name.trim().is_empty() || a.command.trim().is_empty())
    {
        return Err(ConfigError::Invalid(
            "agents must have non-empty name and command".into(),
        ));
    }
    if cfg.config.timeout_seconds <= 0.0 {
        return Err(ConfigError::Invalid(
            "timeout_seconds must be positive".into(),
        ));
    }
    if !(0.0..=1.0).contains(&cfg.config.coverage_threshold) {
        return Err(ConfigError::Invalid(
            "coverage_threshold must be between 0 and 1".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env_vars() {
        std::env::set_var("GB_TEST_VAR", "hello");
        let input = "value: ${GB_TEST_VAR}";
        assert_eq!(interpolate_env_vars(input), "value: hello");
        std::env::remove_var("GB_TEST_VAR");
    }

    #[test]
    fn test_interpolate_with_default() {
        std::env::remove_var("GB_NONEXISTENT_VAR");
        let input = "value: ${GB_NONEXISTENT_VAR:-fallback}";
        assert_eq!(interpolate_env_vars(input), "value: fallback");
    }

    #[test]
    fn test_benchmark_kind_from_yaml() {
        let yaml = r#"
name: demo
benchmarks:
  - name: qa
    kind: assistant
    data_file: data/qa.jsonl
  - name: calls
    kind: toolcall
    data_file: data/calls.json
    answer_file: data/answers.json
"#;
        let cfg: EvalConfig = Figment::new()
            .merge(Yaml::string(yaml))
            .extract()
            .expect("parse");
        assert_eq!(cfg.benchmarks.len(), 2);
        match &cfg.benchmarks[1].kind {
            BenchmarkKind::Toolcall { answer_file, .. } => {
                assert_eq!(answer_file.as_deref(), Some("data/answers.json"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}
