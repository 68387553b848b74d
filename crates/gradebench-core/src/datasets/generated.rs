use super::{
    any_field, parse_level, read_records, resolve_path, sample_id, string_field,
    DatasetContext, DatasetLoader,
};
use crate::config::BenchmarkConfig;
use crate::error::{GradebenchError, Result};
use crate::judge::judge_system_prompt;
use crate::types::{Expected, JsonMap, Sample};
use serde_json::Value;
use std::path::PathBuf;

/// Generated question items destined for rubric scoring.
///
/// Unlike the other loaders, the "input" here is the rubric instructions
/// followed by the full item under review (question, answer, difficulty
/// label) serialized for the judge; there is no reference answer to match
/// against.
pub struct GeneratedDataset {
    config: BenchmarkConfig,
    root: PathBuf,
}

impl GeneratedDataset {
    pub fn new(config: BenchmarkConfig, ctx: DatasetContext) -> Self {
        Self {
            config,
            root: ctx.root_dir,
        }
    }
}

impl DatasetLoader for GeneratedDataset {
    fn load(&self, limit: Option<usize>) -> Result<Vec<Sample>> {
        let path = resolve_path(self.config.kind.data_file(), &self.root);
        let records = read_records(&path, &self.config.name, false)?;

        let mut samples = Vec::new();
        for (idx, record) in records.into_iter().enumerate() {
            if let Some(limit) = limit {
                if samples.len() >= limit {
                    break;
                }
            }

            let question = string_field(&record, &["question", "content", "problem", "prompt"])
                .ok_or_else(|| {
                    GradebenchError::dataset(
                        &self.config.name,
                        anyhow::anyhow!("record {idx} has no question field"),
                    )
                })?;
            let answer = string_field(&record, &["answer", "solution", "final_answer"])
                .unwrap_or_default();

            let category = string_field(&record, &["category", "topic"])
                .unwrap_or_default()
                .to_string();
            let level = parse_level(any_field(&record, &["level", "difficulty"]));

            // The judge sees the rubric and the whole item, answer included.
            let item = serde_json::json!({
                "question": question,
                "answer": answer,
                "difficulty": level,
            });
            let input = format!(
                "{}\n\n{}",
                judge_system_prompt(),
                serde_json::to_string_pretty(&item)?
            );

            // The full record rides along for export.
            let metadata: JsonMap = record
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            samples.push(Sample {
                id: sample_id(&record, &category, idx),
                input,
                expected: Expected::Value(Value::Null),
                category,
                level,
                metadata,
                tools: Vec::new(),
                files: Vec::new(),
            });
        }

        Ok(samples)
    }
}
