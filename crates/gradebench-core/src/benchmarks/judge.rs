use super::Benchmark;
use crate::judge::parse_judge_response;
use crate::metrics::judge_summary;
use crate::types::{MetricsSummary, Sample, SampleResult};
use serde_json::json;

/// Rubric scoring: the agent response is a judge model's review of the
/// sample item; it is parsed into a 4-dimension score.
pub struct JudgeBenchmark {
    name: String,
    pass_threshold: f64,
}

impl JudgeBenchmark {
    pub fn new(name: String, pass_threshold: f64) -> Self {
        Self {
            name,
            pass_threshold,
        }
    }
}

impl Benchmark for JudgeBenchmark {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, sample: &Sample, response: &str) -> SampleResult {
        let judge = parse_judge_response(response);

        let mut result = SampleResult::for_sample(sample);
        result.predicted = json!(judge);
        result.success = judge.total_score >= self.pass_threshold;
        result.partial_success = result.success;
        result.score = judge.total_score;
        result.judge = Some(judge);
        result.agent_response = response.to_string();
        result
    }

    fn summarize(&self, results: &[SampleResult]) -> MetricsSummary {
        judge_summary(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::PASS_THRESHOLD;
    use crate::types::Expected;

    fn sample() -> Sample {
        Sample {
            id: "j1".into(),
            input: "{}".into(),
            expected: Expected::default(),
            category: String::new(),
            level: 2,
            metadata: Default::default(),
            tools: Vec::new(),
            files: Vec::new(),
        }
    }

    #[test]
    fn high_scores_pass() {
        let resp = r#"{"correctness": 5, "clarity": 4, "difficulty_match": 4, "completeness": 5}"#;
        let r = JudgeBenchmark::new("judge".into(), PASS_THRESHOLD).score(&sample(), resp);
        assert!(r.success);
        assert_eq!(r.score, 4.5);
        assert!(r.judge.is_some());
    }

    #[test]
    fn low_scores_fail() {
        let resp = r#"{"correctness": 1, "clarity": 1, "difficulty_match": 1, "completeness": 1}"#;
        let r = JudgeBenchmark::new("judge".into(), PASS_THRESHOLD).score(&sample(), resp);
        assert!(!r.success);
        assert_eq!(r.score, 1.0);
    }
}
