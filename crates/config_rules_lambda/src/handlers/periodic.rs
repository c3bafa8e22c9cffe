use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use config_rules_core::contract::{ComplianceType, Evaluation, EvaluationError, ValidationError};
use config_rules_core::evaluation::ResourceFailurePolicy;
use config_rules_core::logging::{log_rule_error, log_rule_info};
use config_rules_core::pagination::Throttle;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::adapters::evaluation_sink::EvaluationSink;
use crate::handlers::event::{parse_periodic_event, EventError, PeriodicInvocation};
use crate::handlers::report::{
    prepare_evaluations, submit_evaluations, ReportError, ReportSummary,
};

const COMPONENT: &str = "periodic_rule";

/// Everything a run needs besides its clients.
pub struct RuleRuntime<'t> {
    pub throttle: &'t dyn Throttle,
    pub policy: ResourceFailurePolicy,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleRunResponse {
    pub rule_name: String,
    pub status: String,
    pub evaluations: usize,
    pub compliance: BTreeMap<ComplianceType, usize>,
    pub report: ReportSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHandlerError {
    pub message: String,
    pub resource_id: Option<String>,
}

impl fmt::Display for RuleHandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource_id {
            Some(resource_id) => write!(f, "{} (resource {resource_id})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RuleHandlerError {}

impl From<EventError> for RuleHandlerError {
    fn from(error: EventError) -> Self {
        Self {
            message: error.message,
            resource_id: None,
        }
    }
}

impl From<ValidationError> for RuleHandlerError {
    fn from(error: ValidationError) -> Self {
        Self {
            message: error.message().to_string(),
            resource_id: None,
        }
    }
}

impl From<EvaluationError> for RuleHandlerError {
    fn from(error: EvaluationError) -> Self {
        Self {
            message: error.message,
            resource_id: error.resource_id,
        }
    }
}

impl From<ReportError> for RuleHandlerError {
    fn from(error: ReportError) -> Self {
        Self {
            message: error.to_string(),
            resource_id: None,
        }
    }
}

/// Parses the periodic trigger, runs `evaluate` and reports its verdicts.
///
/// Nothing is submitted when evaluation fails, so a run either reports every
/// verdict it produced or none of them.
pub fn run_periodic_rule<F>(
    rule_name: &str,
    event: Value,
    sink: &impl EvaluationSink,
    runtime: &RuleRuntime<'_>,
    evaluate: F,
) -> Result<RuleRunResponse, RuleHandlerError>
where
    F: FnOnce(&PeriodicInvocation) -> Result<Vec<Evaluation>, RuleHandlerError>,
{
    let started_at = Instant::now();
    let result = run(rule_name, event, sink, runtime, evaluate);

    match &result {
        Ok(response) => log_rule_info(
            COMPONENT,
            "run_completed",
            json!({
                "rule_name": rule_name,
                "evaluations": response.evaluations,
                "compliance": response.compliance,
                "duration_ms": started_at.elapsed().as_millis(),
            }),
        ),
        Err(error) => log_rule_error(
            COMPONENT,
            "run_failed",
            json!({
                "rule_name": rule_name,
                "error": error.message.clone(),
                "resource_id": error.resource_id.clone(),
                "duration_ms": started_at.elapsed().as_millis(),
            }),
        ),
    }
    result
}

fn run<F>(
    rule_name: &str,
    event: Value,
    sink: &impl EvaluationSink,
    runtime: &RuleRuntime<'_>,
    evaluate: F,
) -> Result<RuleRunResponse, RuleHandlerError>
where
    F: FnOnce(&PeriodicInvocation) -> Result<Vec<Evaluation>, RuleHandlerError>,
{
    let invocation = parse_periodic_event(event)?;
    log_rule_info(
        COMPONENT,
        "run_started",
        json!({
            "rule_name": rule_name,
            "config_rule_name": invocation.config_rule_name.clone(),
            "account_id": invocation.account_id.clone(),
            "policy": format!("{:?}", runtime.policy),
        }),
    );

    let evaluations = evaluate(&invocation)?;
    let compliance = count_by_compliance(&evaluations);
    let evaluated = evaluations.len();

    let prepared = prepare_evaluations(evaluations, &invocation.account_id);
    let ordering_timestamp = invocation.notification_time.unwrap_or(runtime.now);
    let report = submit_evaluations(
        sink,
        &invocation.result_token,
        &prepared,
        ordering_timestamp,
    )?;

    Ok(RuleRunResponse {
        rule_name: rule_name.to_string(),
        status: "completed".to_string(),
        evaluations: evaluated,
        compliance,
        report,
    })
}

fn count_by_compliance(evaluations: &[Evaluation]) -> BTreeMap<ComplianceType, usize> {
    let mut counts = BTreeMap::new();
    for evaluation in evaluations {
        *counts.entry(evaluation.compliance_type).or_insert(0) += 1;
    }
    counts
}
