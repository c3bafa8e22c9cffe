use chrono::{DateTime, Utc};
use config_rules_core::contract::Evaluation;

/// Destination for a batch of verdicts. Returns how many the service refused.
pub trait EvaluationSink {
    fn put_evaluations(
        &self,
        result_token: &str,
        evaluations: &[Evaluation],
        ordering_timestamp: DateTime<Utc>,
    ) -> Result<usize, String>;
}
