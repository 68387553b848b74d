use super::{
    any_field, parse_level, read_records, resolve_path, residual_metadata, sample_id,
    string_field, DatasetContext, DatasetLoader,
};
use crate::calls::parse_ground_truth;
use crate::config::{BenchmarkConfig, BenchmarkKind};
use crate::error::{GradebenchError, Result};
use crate::types::{Expected, JsonMap, Sample, ToolDefinition};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// Function-calling datasets: a question plus available tool definitions,
/// with ground-truth calls either inline or in a separate answer file
/// joined by sample id.
pub struct ToolcallDataset {
    config: BenchmarkConfig,
    root: PathBuf,
}

impl ToolcallDataset {
    pub fn new(config: BenchmarkConfig, ctx: DatasetContext) -> Self {
        Self {
            config,
            root: ctx.root_dir,
        }
    }

    fn answer_file(&self) -> Option<&str> {
        match &self.config.kind {
            BenchmarkKind::Toolcall { answer_file, .. } => answer_file.as_deref(),
            _ => None,
        }
    }

    /// Ground-truth values keyed by sample id. Records without an id fall
    /// back to their positional `{category}_{index}` id, matching how the
    /// data file derives ids.
    fn load_answers(&self) -> Result<HashMap<String, Value>> {
        let Some(answer_file) = self.answer_file() else {
            return Ok(HashMap::new());
        };
        let path = resolve_path(answer_file, &self.root);
        let records = read_records(&path, &self.config.name, false)?;

        let mut answers = HashMap::new();
        for (idx, record) in records.into_iter().enumerate() {
            let category = string_field(&record, &["category"]).unwrap_or_default();
            let id = sample_id(&record, category, idx);
            let Some(gt) = any_field(&record, &["ground_truth", "answer", "expected"]) else {
                warn!(id = %id, "answer record has no ground truth field");
                continue;
            };
            answers.insert(id, gt.clone());
        }
        Ok(answers)
    }
}

impl DatasetLoader for ToolcallDataset {
    fn load(&self, limit: Option<usize>) -> Result<Vec<Sample>> {
        let path = resolve_path(self.config.kind.data_file(), &self.root);
        let records = read_records(&path, &self.config.name, true)?;
        let answers = self.load_answers()?;

        let mut samples = Vec::new();
        for (idx, record) in records.into_iter().enumerate() {
            if let Some(limit) = limit {
                if samples.len() >= limit {
                    break;
                }
            }

            let input = question_text(&record).ok_or_else(|| {
                GradebenchError::dataset(
                    &self.config.name,
                    anyhow::anyhow!("record {idx} has no question field"),
                )
            })?;

            let category = string_field(&record, &["category", "task_type"])
                .unwrap_or_default()
                .to_string();
            let level = parse_level(any_field(&record, &["level", "Level", "difficulty"]));
            let id = sample_id(&record, &category, idx);

            let tools = any_field(&record, &["tools", "functions", "function"])
                .map(parse_tools)
                .unwrap_or_default();

            let raw_gt = answers
                .get(&id)
                .cloned()
                .or_else(|| {
                    any_field(&record, &["ground_truth", "answer", "expected"]).cloned()
                })
                .unwrap_or(Value::Null);

            // Resolve ground truth once at load time. An unresolvable value
            // is kept raw so the benchmark can record the failure per sample
            // instead of dropping the record here.
            let expected = if raw_gt.is_null() {
                Expected::Value(Value::Null)
            } else {
                match parse_ground_truth(&raw_gt) {
                    Ok(calls) if !calls.is_empty() => Expected::Calls(calls),
                    Ok(_) | Err(_) => {
                        warn!(id = %id, "ground truth did not resolve to function calls");
                        Expected::Value(raw_gt)
                    }
                }
            };

            let metadata = residual_metadata(
                &record,
                &[
                    "task_id", "id", "sample_id", "question", "Question", "input", "prompt",
                    "category", "task_type", "level", "Level", "difficulty", "tools",
                    "functions", "function",
                ],
            );

            samples.push(Sample {
                id,
                input,
                expected,
                category,
                level,
                metadata,
                tools,
                files: Vec::new(),
            });
        }

        Ok(samples)
    }
}

/// The question, which arrives either as a plain string or as nested
/// conversation turns (`[[{"role": ..., "content": ...}]]`); turn
/// contents are joined in order.
fn question_text(record: &JsonMap) -> Option<String> {
    if let Some(s) = string_field(record, &["question", "Question", "input", "prompt"]) {
        return Some(s.to_string());
    }
    let value = record.get("question")?;
    let mut parts = Vec::new();
    collect_turn_contents(value, &mut parts);
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

fn collect_turn_contents(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_turn_contents(item, parts);
            }
        }
        Value::Object(map) => {
            if let Some(content) = map.get("content").and_then(Value::as_str) {
                if !content.is_empty() {
                    parts.push(content.to_string());
                }
            }
        }
        Value::String(s) if !s.is_empty() => parts.push(s.clone()),
        _ => {}
    }
}

/// Tool definitions from a record field that may hold one object or a
/// list. Malformed entries are dropped.
fn parse_tools(value: &Value) -> Vec<ToolDefinition> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| {
            let map = item.as_object()?;
            Some(ToolDefinition {
                name: map.get("name")?.as_str()?.to_string(),
                description: map
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                parameters: map
                    .get("parameters")
                    .and_then(Value::as_object)
                    .map(|o| o.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_else(JsonMap::new),
            })
        })
        .collect()
}
