use super::Benchmark;
use crate::calls::{parse_predicted_calls, score_calls};
use crate::metrics::toolcall_summary;
use crate::types::{Expected, MetricsSummary, Sample, SampleResult};
use serde_json::json;

/// Function-call scoring: extract structured calls from the response and
/// match them call-by-call against the resolved ground truth.
pub struct ToolcallBenchmark {
    name: String,
}

impl ToolcallBenchmark {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

impl Benchmark for ToolcallBenchmark {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, sample: &Sample, response: &str) -> SampleResult {
        let Expected::Calls(expected) = &sample.expected else {
            let mut r = SampleResult::failed(sample, "ground truth did not resolve to calls");
            r.agent_response = response.to_string();
            return r;
        };

        let predicted = match parse_predicted_calls(response) {
            Ok(calls) => calls,
            Err(e) => {
                // An unparseable response is a scored miss, not a run error:
                // the agent produced something, it just was not a call.
                let mut r = SampleResult::for_sample(sample);
                r.agent_response = response.to_string();
                r.details.insert("extraction_error".into(), json!(e.to_string()));
                r.call_stats = Some(crate::types::CallStats {
                    matched_calls: 0,
                    expected_calls: expected.len(),
                    predicted_calls: 0,
                });
                return r;
            }
        };

        let outcome = score_calls(&predicted, expected);

        let mut result = SampleResult::for_sample(sample);
        result.predicted = json!(predicted);
        result.success = outcome.success;
        result.partial_success = outcome.score > 0.0;
        result.score = outcome.score;
        result.call_stats = Some(outcome.stats);
        result.agent_response = response.to_string();
        result
            .details
            .insert("per_call_scores".into(), json!(outcome.per_call_scores));
        result
    }

    fn summarize(&self, results: &[SampleResult]) -> MetricsSummary {
        toolcall_summary(results)
    }
}
