use std::str::FromStr;

use serde_json::json;

use crate::contract::{ComplianceType, Evaluation, EvaluationError, ValidationError};
use crate::logging::{log_rule_error, log_rule_info};

/// What to do when one resource cannot be evaluated because a remote call failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResourceFailurePolicy {
    /// Abort the whole run. No verdicts are returned.
    #[default]
    Abort,
    /// Emit an `ERROR` verdict for that resource and move on.
    ReportError,
}

impl FromStr for ResourceFailurePolicy {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "abort" => Ok(Self::Abort),
            "report_error" => Ok(Self::ReportError),
            other => Err(ValidationError::new(format!(
                "unknown resource failure policy '{other}', expected 'abort' or 'report_error'"
            ))),
        }
    }
}

/// Maps per-resource outcomes to verdicts, one per resource, in the order the
/// outcomes are recorded.
#[derive(Debug)]
pub struct EvaluationEmitter<'a> {
    component: &'a str,
    resource_type: &'a str,
    non_compliant_annotation: &'a str,
    policy: ResourceFailurePolicy,
    evaluations: Vec<Evaluation>,
}

impl<'a> EvaluationEmitter<'a> {
    pub fn new(
        component: &'a str,
        resource_type: &'a str,
        non_compliant_annotation: &'a str,
        policy: ResourceFailurePolicy,
    ) -> Self {
        Self {
            component,
            resource_type,
            non_compliant_annotation,
            policy,
            evaluations: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        resource_id: &str,
        outcome: Result<bool, String>,
    ) -> Result<(), EvaluationError> {
        let evaluation = match outcome {
            Ok(true) => Evaluation::new(
                resource_id,
                self.resource_type,
                ComplianceType::Compliant,
                None,
            ),
            Ok(false) => Evaluation::new(
                resource_id,
                self.resource_type,
                ComplianceType::NonCompliant,
                Some(self.non_compliant_annotation.to_string()),
            ),
            Err(message) => {
                log_rule_error(
                    self.component,
                    "resource_failed",
                    json!({
                        "resource_id": resource_id,
                        "resource_type": self.resource_type,
                        "error": message.clone(),
                        "policy": format!("{:?}", self.policy),
                    }),
                );
                match self.policy {
                    ResourceFailurePolicy::Abort => {
                        return Err(EvaluationError::resource(resource_id, message));
                    }
                    ResourceFailurePolicy::ReportError => Evaluation::new(
                        resource_id,
                        self.resource_type,
                        ComplianceType::Error,
                        Some(message),
                    ),
                }
            }
        };

        log_rule_info(
            self.component,
            "resource_evaluated",
            json!({
                "resource_id": resource_id,
                "compliance_type": evaluation.compliance_type.as_str(),
            }),
        );
        self.evaluations.push(evaluation);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }

    pub fn finish(self) -> Vec<Evaluation> {
        self.evaluations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLE_TYPE: &str = "AWS::IAM::Role";

    #[test]
    fn maps_outcomes_to_verdicts_in_order() {
        let mut emitter = EvaluationEmitter::new("test", ROLE_TYPE, "unused", Default::default());
        emitter.record("a", Ok(true)).expect("record");
        emitter.record("b", Ok(false)).expect("record");

        let evaluations = emitter.finish();
        assert_eq!(
            evaluations,
            vec![
                Evaluation::new("a", ROLE_TYPE, ComplianceType::Compliant, None),
                Evaluation::new(
                    "b",
                    ROLE_TYPE,
                    ComplianceType::NonCompliant,
                    Some("unused".to_string())
                ),
            ]
        );
    }

    #[test]
    fn no_outcomes_means_no_verdicts() {
        let emitter = EvaluationEmitter::new("test", ROLE_TYPE, "unused", Default::default());
        assert!(emitter.is_empty());
        assert!(emitter.finish().is_empty());
    }

    #[test]
    fn abort_policy_stops_with_resource_id() {
        let mut emitter =
            EvaluationEmitter::new("test", ROLE_TYPE, "unused", ResourceFailurePolicy::Abort);
        emitter.record("a", Ok(true)).expect("record");

        let error = emitter
            .record("b", Err("AccessDenied".to_string()))
            .expect_err("abort policy should fail");
        assert_eq!(error, EvaluationError::resource("b", "AccessDenied"));
        assert_eq!(emitter.len(), 1);
    }

    #[test]
    fn report_error_policy_emits_error_verdict() {
        let mut emitter = EvaluationEmitter::new(
            "test",
            ROLE_TYPE,
            "unused",
            ResourceFailurePolicy::ReportError,
        );
        emitter
            .record("b", Err("AccessDenied".to_string()))
            .expect("report_error policy should continue");
        emitter.record("c", Ok(true)).expect("record");

        let evaluations = emitter.finish();
        assert_eq!(evaluations.len(), 2);
        assert_eq!(evaluations[0].compliance_type, ComplianceType::Error);
        assert_eq!(evaluations[0].annotation.as_deref(), Some("AccessDenied"));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(
            "abort".parse::<ResourceFailurePolicy>(),
            Ok(ResourceFailurePolicy::Abort)
        );
        assert_eq!(
            " REPORT_ERROR ".parse::<ResourceFailurePolicy>(),
            Ok(ResourceFailurePolicy::ReportError)
        );
        assert_eq!(
            "".parse::<ResourceFailurePolicy>(),
            Ok(ResourceFailurePolicy::Abort)
        );
        assert!("retry".parse::<ResourceFailurePolicy>().is_err());
    }
}
