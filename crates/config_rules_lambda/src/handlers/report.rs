use std::fmt;

use chrono::{DateTime, Utc};
use config_rules_core::contract::{ComplianceType, Evaluation};
use config_rules_core::logging::log_rule_info;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::adapters::evaluation_sink::EvaluationSink;

pub const PUT_EVALUATIONS_LIMIT: usize = 100;
pub const ANNOTATION_MAX_CHARS: usize = 256;
pub const ACCOUNT_RESOURCE_TYPE: &str = "AWS::::Account";
/// Result token Config uses for test invocations; nothing is submitted.
pub const TEST_MODE_RESULT_TOKEN: &str = "TESTMODE";

const TRUNCATION_SUFFIX: &str = " [truncated]";
const COMPONENT: &str = "evaluation_report";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSummary {
    pub submitted: usize,
    pub batches: usize,
    pub failed: usize,
    pub test_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportError {
    pub message: String,
    pub submitted_before_failure: usize,
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} evaluations submitted before the failure)",
            self.message, self.submitted_before_failure
        )
    }
}

impl std::error::Error for ReportError {}

/// Applies the submission rules to a finished run: an empty run reports the
/// account as NOT_APPLICABLE, and long annotations are cut to the service
/// limit.
pub fn prepare_evaluations(evaluations: Vec<Evaluation>, account_id: &str) -> Vec<Evaluation> {
    if evaluations.is_empty() {
        return vec![Evaluation::new(
            account_id,
            ACCOUNT_RESOURCE_TYPE,
            ComplianceType::NotApplicable,
            None,
        )];
    }

    evaluations
        .into_iter()
        .map(|mut evaluation| {
            evaluation.annotation = evaluation.annotation.map(truncate_annotation);
            evaluation
        })
        .collect()
}

pub fn truncate_annotation(annotation: String) -> String {
    if annotation.chars().count() <= ANNOTATION_MAX_CHARS {
        return annotation;
    }
    let keep = ANNOTATION_MAX_CHARS - TRUNCATION_SUFFIX.chars().count();
    let mut truncated: String = annotation.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}

pub fn submit_evaluations(
    sink: &impl EvaluationSink,
    result_token: &str,
    evaluations: &[Evaluation],
    ordering_timestamp: DateTime<Utc>,
) -> Result<ReportSummary, ReportError> {
    if result_token == TEST_MODE_RESULT_TOKEN {
        log_rule_info(
            COMPONENT,
            "evaluations_submitted",
            json!({ "test_mode": true, "evaluations": evaluations.len() }),
        );
        return Ok(ReportSummary {
            submitted: 0,
            batches: 0,
            failed: 0,
            test_mode: true,
        });
    }

    let mut summary = ReportSummary {
        submitted: 0,
        batches: 0,
        failed: 0,
        test_mode: false,
    };
    for batch in evaluations.chunks(PUT_EVALUATIONS_LIMIT) {
        let failed = sink
            .put_evaluations(result_token, batch, ordering_timestamp)
            .map_err(|message| ReportError {
                message,
                submitted_before_failure: summary.submitted,
            })?;
        summary.submitted += batch.len();
        summary.failed += failed;
        summary.batches += 1;
    }

    log_rule_info(
        COMPONENT,
        "evaluations_submitted",
        json!({
            "test_mode": false,
            "evaluations": summary.submitted,
            "batches": summary.batches,
            "failed": summary.failed,
        }),
    );
    Ok(summary)
}
