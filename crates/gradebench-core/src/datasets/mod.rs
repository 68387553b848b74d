//! Dataset loaders.
//!
//! Each benchmark kind reads a different upstream format; loaders
//! canonicalize all of them into [`Sample`] records at load time so the
//! scoring code never touches raw dataset fields. Field names in the wild
//! drift, so loaders accept a small set of aliases per field.

use crate::config::{BenchmarkConfig, BenchmarkKind};
use crate::error::{GradebenchError, Result};
use crate::types::{JsonMap, Sample};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

mod assistant;
pub use assistant::AssistantDataset;

mod toolcall;
pub use toolcall::ToolcallDataset;

mod generated;
pub use generated::GeneratedDataset;

/// Context passed to dataset loaders for path resolution.
#[derive(Debug, Clone)]
pub struct DatasetContext {
    pub root_dir: PathBuf,
}

pub trait DatasetLoader {
    fn load(&self, limit: Option<usize>) -> Result<Vec<Sample>>;
}

pub fn get_dataset_loader(
    config: BenchmarkConfig,
    ctx: DatasetContext,
) -> Box<dyn DatasetLoader> {
    match &config.kind {
        BenchmarkKind::Assistant { .. } => Box::new(AssistantDataset::new(config, ctx)),
        BenchmarkKind::Toolcall { .. } => Box::new(ToolcallDataset::new(config, ctx)),
        BenchmarkKind::Judge { .. } => Box::new(GeneratedDataset::new(config, ctx)),
    }
}

/// Resolve a path relative to the dataset context root if not absolute.
fn resolve_path(path_str: &str, root: &Path) -> PathBuf {
    let p = PathBuf::from(path_str);
    if p.is_absolute() {
        p
    } else {
        root.join(p)
    }
}

/// Read a dataset file into JSON object records.
///
/// Accepts JSON lines, a top-level JSON array of objects, or a single
/// top-level object. Blank lines are always skipped. In strict mode a
/// malformed line fails the whole load; otherwise it is logged and
/// dropped.
fn read_records(path: &Path, dataset_name: &str, strict: bool) -> Result<Vec<JsonMap>> {
    let file = File::open(path).map_err(|e| {
        GradebenchError::dataset(
            dataset_name,
            anyhow::anyhow!("cannot open {}: {e}", path.display()),
        )
    })?;
    let mut reader = BufReader::new(file);

    let mut first_line = String::new();
    reader.read_line(&mut first_line)?;
    let trimmed = first_line.trim_start();

    if trimmed.starts_with('[') {
        // Whole-file JSON array.
        let mut contents = first_line.clone();
        std::io::Read::read_to_string(&mut reader, &mut contents)?;
        let value: Value = serde_json::from_str(&contents)
            .map_err(|e| GradebenchError::dataset(dataset_name, e))?;
        let Value::Array(items) = value else {
            return Err(GradebenchError::dataset(
                dataset_name,
                anyhow::anyhow!("expected a JSON array in {}", path.display()),
            ));
        };
        return items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(map) => Ok(map.into_iter().collect()),
                other => Err(GradebenchError::dataset(
                    dataset_name,
                    anyhow::anyhow!("record {idx} is not an object: {other}"),
                )),
            })
            .collect();
    }

    // JSON lines (a single top-level object is one record).
    let mut records = Vec::new();
    let mut line_no = 1usize;
    let mut parse_line = |line: &str, line_no: usize| -> Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }
        let problem = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => {
                records.push(map.into_iter().collect());
                return Ok(());
            }
            Ok(other) => format!("line {line_no} is not an object: {other}"),
            Err(e) => format!("line {line_no}: {e}"),
        };
        if strict {
            Err(GradebenchError::dataset(
                dataset_name,
                anyhow::anyhow!(problem),
            ))
        } else {
            tracing::warn!(dataset = dataset_name, "skipping malformed record: {problem}");
            Ok(())
        }
    };
    parse_line(&first_line, line_no)?;
    for line in reader.lines() {
        line_no += 1;
        parse_line(&line?, line_no)?;
    }
    Ok(records)
}

/// First string value found under any of the given keys.
fn string_field<'a>(record: &'a JsonMap, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| record.get(*k))
        .and_then(Value::as_str)
}

/// First value found under any of the given keys.
fn any_field<'a>(record: &'a JsonMap, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| record.get(*k))
}

/// Parse a difficulty level that may arrive as a number, a numeric
/// string, or a "Level N" label. Unrecognized shapes default to 1.
fn parse_level(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(1) as u32,
        Some(Value::String(s)) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(1)
        }
        _ => 1,
    }
}

/// Metadata map from a record, minus the fields consumed elsewhere in the
/// sample and any answer-bearing fields that must not leak to the agent.
fn residual_metadata(record: &JsonMap, consumed: &[&str]) -> JsonMap {
    record
        .iter()
        .filter(|(k, _)| {
            !consumed.contains(&k.as_str()) && !ANSWER_KEYS.contains(&k.as_str())
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

// Fields excluded from metadata to prevent answer leakage.
static ANSWER_KEYS: &[&str] = &[
    "final_answer",
    "Final answer",
    "answer",
    "expected",
    "expected_answer",
    "ground_truth",
    "solution",
    "label",
    "target",
];

/// Count samples per difficulty level, for dataset inspection.
pub fn level_distribution(samples: &[Sample]) -> std::collections::BTreeMap<u32, usize> {
    let mut counts = std::collections::BTreeMap::new();
    for sample in samples {
        *counts.entry(sample.level).or_insert(0) += 1;
    }
    counts
}

/// Sample id from a record, falling back to `{category}_{index}`.
fn sample_id(record: &JsonMap, category: &str, index: usize) -> String {
    string_field(record, &["task_id", "id", "sample_id"])
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            let category = if category.is_empty() { "sample" } else { category };
            format!("{category}_{index}")
        })
}
