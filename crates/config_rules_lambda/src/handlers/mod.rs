pub mod alb_https_redirection;
pub mod event;
pub mod iam_role_not_used;
pub mod periodic;
pub mod report;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use chrono::{DateTime, Utc};
    use config_rules_core::contract::Evaluation;

    use crate::adapters::evaluation_sink::EvaluationSink;

    type PutCall = (String, Vec<Evaluation>, DateTime<Utc>);

    #[derive(Default)]
    pub(crate) struct CapturingSink {
        calls: Mutex<Vec<PutCall>>,
        fail_on_batch: Option<usize>,
    }

    impl CapturingSink {
        pub(crate) fn failing_on_batch(batch: usize) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on_batch: Some(batch),
            }
        }

        pub(crate) fn calls(&self) -> Vec<PutCall> {
            self.calls.lock().expect("poisoned mutex").clone()
        }

        pub(crate) fn batch_sizes(&self) -> Vec<usize> {
            self.calls()
                .iter()
                .map(|(_, batch, _)| batch.len())
                .collect()
        }

        pub(crate) fn submitted(&self) -> Vec<Evaluation> {
            self.calls()
                .into_iter()
                .flat_map(|(_, batch, _)| batch)
                .collect()
        }
    }

    impl EvaluationSink for CapturingSink {
        fn put_evaluations(
            &self,
            result_token: &str,
            evaluations: &[Evaluation],
            ordering_timestamp: DateTime<Utc>,
        ) -> Result<usize, String> {
            let mut calls = self.calls.lock().expect("poisoned mutex");
            if self.fail_on_batch == Some(calls.len()) {
                return Err("ThrottlingException".to_string());
            }
            calls.push((
                result_token.to_string(),
                evaluations.to_vec(),
                ordering_timestamp,
            ));
            Ok(0)
        }
    }
}
