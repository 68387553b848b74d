use super::{
    any_field, parse_level, read_records, resolve_path, residual_metadata, sample_id,
    string_field, DatasetContext, DatasetLoader,
};
use crate::config::{BenchmarkConfig, BenchmarkKind};
use crate::error::{GradebenchError, Result};
use crate::types::{Expected, Sample};
use serde_json::Value;
use std::path::PathBuf;

/// Short-answer QA datasets: one question and one reference answer per
/// record, optionally leveled 1-3 and carrying attached files.
pub struct AssistantDataset {
    config: BenchmarkConfig,
    root: PathBuf,
}

impl AssistantDataset {
    pub fn new(config: BenchmarkConfig, ctx: DatasetContext) -> Self {
        Self {
            config,
            root: ctx.root_dir,
        }
    }

    fn level_filter(&self) -> Option<u32> {
        match &self.config.kind {
            BenchmarkKind::Assistant { level, .. } => *level,
            _ => None,
        }
    }
}

impl DatasetLoader for AssistantDataset {
    fn load(&self, limit: Option<usize>) -> Result<Vec<Sample>> {
        let path = resolve_path(self.config.kind.data_file(), &self.root);
        let records = read_records(&path, &self.config.name, false)?;
        let level_filter = self.level_filter();

        let mut samples = Vec::new();
        for (idx, record) in records.into_iter().enumerate() {
            if let Some(limit) = limit {
                if samples.len() >= limit {
                    break;
                }
            }

            let input = string_field(&record, &["question", "Question", "input", "prompt"])
                .ok_or_else(|| {
                    GradebenchError::dataset(
                        &self.config.name,
                        anyhow::anyhow!("record {idx} has no question field"),
                    )
                })?
                .to_string();

            let expected = string_field(
                &record,
                &[
                    "final_answer",
                    "Final answer",
                    "answer",
                    "expected_answer",
                    "expected",
                ],
            )
            .map(|s| Expected::Text(s.to_string()))
            .unwrap_or_default();

            let level = parse_level(any_field(&record, &["level", "Level", "difficulty"]));
            if level_filter.is_some_and(|wanted| level != wanted) {
                continue;
            }

            // Unlabeled records group by difficulty instead.
            let category = string_field(&record, &["category", "task_type"])
                .map(str::to_string)
                .unwrap_or_else(|| format!("level_{level}"));

            let files = record
                .get("file_name")
                .or_else(|| record.get("files"))
                .map(|v| match v {
                    Value::String(s) if !s.is_empty() => vec![s.clone()],
                    Value::Array(items) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    _ => Vec::new(),
                })
                .unwrap_or_default();

            let metadata = residual_metadata(
                &record,
                &[
                    "task_id", "id", "sample_id", "question", "Question", "input", "prompt",
                    "category", "task_type", "level", "Level", "difficulty", "file_name", "files",
                ],
            );

            samples.push(Sample {
                id: sample_id(&record, &category, idx),
                input,
                expected,
                category,
                level,
                metadata,
                tools: Vec::new(),
                files,
            });
        }

        Ok(samples)
    }
}
