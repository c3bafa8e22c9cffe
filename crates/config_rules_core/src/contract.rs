use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const THROTTLE_PERIOD_MS: u64 = 100;
pub const BATCH_DESCRIBE_LIMIT: usize = 100;

/// Identity of a resource tracked by the inventory service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub resource_type: String,
    pub resource_id: String,
}

impl ResourceKey {
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }
}

/// Descriptor returned by a batch describe call. `configuration` is the
/// resource's configuration serialized as a JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigurationItem {
    pub resource_type: String,
    pub resource_id: String,
    pub resource_name: Option<String>,
    pub configuration: Option<String>,
}

/// One page of a listing call. `next_token` is present while more pages remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    pub fn with_next(items: Vec<T>, next_token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: Some(next_token.into()),
        }
    }
}

/// Result of a batch describe call. Keys the service did not get to are handed
/// back in `unprocessed_keys` and must be requested again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPage<K, T> {
    pub items: Vec<T>,
    pub unprocessed_keys: Vec<K>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listener {
    pub listener_arn: String,
    pub protocol: Option<String>,
    pub ssl_policy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListenerRule {
    pub rule_arn: String,
    pub actions: Vec<RuleAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleAction {
    pub action_type: String,
    pub redirect_protocol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleUsage {
    pub role_name: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceType {
    Compliant,
    NonCompliant,
    NotApplicable,
    Error,
}

impl ComplianceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compliant => "COMPLIANT",
            Self::NonCompliant => "NON_COMPLIANT",
            Self::NotApplicable => "NOT_APPLICABLE",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for ComplianceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for a single top-level resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evaluation {
    pub resource_id: String,
    pub resource_type: String,
    pub compliance_type: ComplianceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl Evaluation {
    pub fn new(
        resource_id: impl Into<String>,
        resource_type: impl Into<String>,
        compliance_type: ComplianceType,
        annotation: Option<String>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_type: resource_type.into(),
            compliance_type,
            annotation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// A failed remote call that aborted a rule run. `resource_id` is set when the
/// failure happened while evaluating one resource rather than while listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationError {
    pub message: String,
    pub resource_id: Option<String>,
}

impl EvaluationError {
    pub fn listing(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: None,
        }
    }

    pub fn resource(resource_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: Some(resource_id.into()),
        }
    }
}

impl std::fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.resource_id {
            Some(resource_id) => write!(f, "evaluation of {resource_id} failed: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for EvaluationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compliance_type_serializes_in_config_casing() {
        let value = serde_json::to_value(ComplianceType::NonCompliant).expect("serialize");
        assert_eq!(value, serde_json::json!("NON_COMPLIANT"));
        assert_eq!(ComplianceType::NotApplicable.to_string(), "NOT_APPLICABLE");
    }

    #[test]
    fn evaluation_error_names_the_failing_resource() {
        let error = EvaluationError::resource("arn:lb/1", "throttled");
        assert_eq!(error.to_string(), "evaluation of arn:lb/1 failed: throttled");
        assert_eq!(EvaluationError::listing("boom").to_string(), "boom");
    }

    #[test]
    fn role_usage_serializes_timestamps_as_rfc3339() {
        use chrono::TimeZone;

        let usage = RoleUsage {
            role_name: "config-rule".to_string(),
            created_at: Utc
                .with_ymd_and_hms(2026, 1, 5, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
            last_used_at: None,
        };

        let value = serde_json::to_value(&usage).expect("serialize");
        assert_eq!(value["created_at"], serde_json::json!("2026-01-05T09:30:00Z"));
        assert_eq!(value["last_used_at"], serde_json::Value::Null);
    }
}
