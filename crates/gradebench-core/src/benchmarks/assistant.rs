use super::Benchmark;
use crate::answer::{extract_answer, match_answers_with_threshold, match_score};
use crate::metrics::assistant_summary;
use crate::types::{Expected, MetricsSummary, Sample, SampleResult};
use serde_json::{json, Value};

/// Short-answer scoring: extract the final answer from the response and
/// match it against the reference with exact/containment/coverage rules.
pub struct AssistantBenchmark {
    name: String,
    coverage_threshold: f64,
}

impl AssistantBenchmark {
    pub fn new(name: String, coverage_threshold: f64) -> Self {
        Self {
            name,
            coverage_threshold,
        }
    }
}

impl Benchmark for AssistantBenchmark {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, sample: &Sample, response: &str) -> SampleResult {
        let expected = match &sample.expected {
            Expected::Text(text) => text.clone(),
            Expected::Value(Value::String(s)) => s.clone(),
            other => {
                let mut r = SampleResult::failed(sample, "sample has no text ground truth");
                r.agent_response = response.to_string();
                r.details
                    .insert("expected_shape".into(), json!(format!("{other:?}")));
                return r;
            }
        };

        let predicted = extract_answer(response);
        let (exact, partial) =
            match_answers_with_threshold(&predicted, &expected, self.coverage_threshold);

        let mut result = SampleResult::for_sample(sample);
        result.predicted = Value::String(predicted);
        result.success = exact;
        result.partial_success = partial;
        result.score = match_score(exact, partial);
        result.agent_response = response.to_string();
        result
    }

    fn summarize(&self, results: &[SampleResult]) -> MetricsSummary {
        assistant_summary(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::COVERAGE_THRESHOLD;

    fn sample(expected: &str) -> Sample {
        Sample {
            id: "s1".into(),
            input: "q".into(),
            expected: Expected::Text(expected.into()),
            category: String::new(),
            level: 1,
            metadata: Default::default(),
            tools: Vec::new(),
            files: Vec::new(),
        }
    }

    fn bench() -> AssistantBenchmark {
        AssistantBenchmark::new("qa".into(), COVERAGE_THRESHOLD)
    }

    #[test]
    fn exact_match_scores_full() {
        let r = bench().score(&sample("Paris"), "FINAL ANSWER: paris");
        assert!(r.success);
        assert!(r.partial_success);
        assert_eq!(r.score, 1.0);
    }

    #[test]
    fn containment_scores_half() {
        let r = bench().score(&sample("Paris"), "It is the city of Paris, France");
        assert!(!r.success);
        assert!(r.partial_success);
        assert_eq!(r.score, 0.5);
    }

    #[test]
    fn missing_ground_truth_records_error() {
        let mut s = sample("x");
        s.expected = Expected::Value(Value::Null);
        let r = bench().score(&s, "anything");
        assert!(r.error.is_some());
        assert!(!r.success);
    }
}
