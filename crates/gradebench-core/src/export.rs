//! Result exporters: leaderboard submission files, Markdown reports, and
//! full JSON dumps.

use crate::error::Result;
use crate::types::{EvalResult, SampleResult};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Write a leaderboard submission file: one JSON object per line with
/// `task_id` and `model_answer`.
///
/// Falls back to the raw agent response for samples whose prediction is
/// null (errors, timeouts), so the submission always covers every sample.
pub fn write_submission(result: &EvalResult, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);

    for sample in &result.detailed_results {
        let line = json!({
            "task_id": sample.sample_id,
            "model_answer": model_answer(sample),
        });
        serde_json::to_writer(&mut writer, &line)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    info!(path = %path.display(), "wrote submission file");
    Ok(())
}

fn model_answer(sample: &SampleResult) -> String {
    match &sample.predicted {
        Value::Null => sample.agent_response.clone(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write the complete run result as pretty-printed JSON.
pub fn write_json(result: &EvalResult, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()?;
    info!(path = %path.display(), "wrote result json");
    Ok(())
}

/// Write a human-readable Markdown report of the run.
pub fn write_report(result: &EvalResult, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_report(result))?;
    info!(path = %path.display(), "wrote markdown report");
    Ok(())
}

/// Render the Markdown report body.
pub fn render_report(result: &EvalResult) -> String {
    let mut out = String::new();
    let m = &result.metrics;

    out.push_str(&format!("# Evaluation Report: {}\n\n", result.benchmark_name));
    out.push_str(&format!("- **Agent**: {}\n", result.agent_name));
    out.push_str(&format!(
        "- **Date**: {}\n",
        result.evaluation_time.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("- **Samples**: {}\n", result.total_samples));
    out.push_str(&format!(
        "- **Duration**: {:.1}s\n\n",
        result.total_duration_ms / 1000.0
    ));

    out.push_str("## Summary\n\n");
    out.push_str("| Metric | Value |\n|---|---|\n");
    out.push_str(&format!(
        "| Accuracy | {:.2}% |\n",
        result.overall_accuracy * 100.0
    ));
    out.push_str(&format!("| Average score | {:.3} |\n", m.average_score));
    if m.precision > 0.0 || m.recall > 0.0 {
        out.push_str(&format!("| Precision | {:.3} |\n", m.precision));
        out.push_str(&format!("| Recall | {:.3} |\n", m.recall));
        out.push_str(&format!("| F1 | {:.3} |\n", m.f1_score));
    }
    if m.pass_rate > 0.0 || m.excellent_rate > 0.0 {
        out.push_str(&format!("| Pass rate | {:.2}% |\n", m.pass_rate * 100.0));
        out.push_str(&format!(
            "| Excellent rate | {:.2}% |\n",
            m.excellent_rate * 100.0
        ));
    }
    out.push('\n');

    if !m.dimension_scores.is_empty() {
        out.push_str("## Rubric Dimensions\n\n");
        out.push_str("| Dimension | Average |\n|---|---|\n");
        let mut dims: Vec<_> = m.dimension_scores.iter().collect();
        dims.sort_by(|a, b| a.0.cmp(b.0));
        for (name, avg) in dims {
            out.push_str(&format!("| {name} | {avg:.2} |\n"));
        }
        out.push('\n');
    }

    if !result.level_metrics.is_empty() {
        out.push_str("## By Difficulty Level\n\n");
        out.push_str("| Level | Samples | Exact | Partial |\n|---|---|---|---|\n");
        let mut levels: Vec<_> = result.level_metrics.values().collect();
        levels.sort_by_key(|lm| lm.level);
        for lm in levels {
            out.push_str(&format!(
                "| {} | {} | {:.2}% | {:.2}% |\n",
                lm.level,
                lm.total,
                lm.exact_match_rate * 100.0,
                lm.partial_match_rate * 100.0
            ));
        }
        out.push('\n');
    }

    if !result.category_metrics.is_empty() {
        out.push_str("## By Category\n\n");
        out.push_str("| Category | Samples | Accuracy | Avg score |\n|---|---|---|---|\n");
        let mut categories: Vec<_> = result.category_metrics.values().collect();
        categories.sort_by(|a, b| a.category.cmp(&b.category));
        for cm in categories {
            out.push_str(&format!(
                "| {} | {} | {:.2}% | {:.3} |\n",
                cm.category,
                cm.total,
                cm.accuracy * 100.0,
                cm.average_score
            ));
        }
        out.push('\n');
    }

    let failures: Vec<&SampleResult> = result
        .detailed_results
        .iter()
        .filter(|r| !r.success)
        .collect();
    if !failures.is_empty() {
        out.push_str("## Failures\n\n");
        for r in failures.iter().take(10) {
            let reason = match &r.error {
                Some(error) => error.clone(),
                None => format!("predicted {}", r.predicted),
            };
            out.push_str(&format!("- `{}`: {reason}\n", r.sample_id));
        }
        if failures.len() > 10 {
            out.push_str(&format!("- ... and {} more\n", failures.len() - 10));
        }
        out.push('\n');
    }

    out
}
