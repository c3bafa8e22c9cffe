//! IAM_ROLE_NOT_USED
//!
//! A role is compliant when it was last used, or failing that created, no
//! more than `DaysBeforeUnused` whole days ago.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::clients::{InventoryClient, RoleClient};
use crate::contract::{Evaluation, EvaluationError, RoleUsage};
use crate::evaluation::{EvaluationEmitter, ResourceFailurePolicy};
use crate::logging::log_rule_info;
use crate::pagination::{Pages, Throttle};
use crate::parameters::RoleUsageParameters;

pub const RULE_NAME: &str = "IAM_ROLE_NOT_USED";
pub const RESOURCE_TYPE: &str = "AWS::IAM::Role";
pub const NON_COMPLIANT_ANNOTATION: &str =
    "Ensure that no AWS IAM Role is unused and make an action if unused (e.g. delete the user).";
pub const ROLE_QUERY: &str = "select * where resourceType = 'AWS::IAM::Role'";
pub const ROLE_QUERY_PAGE_SIZE: i32 = 20;

const COMPONENT: &str = "iam_role_not_used";

/// Roles are looked up as each query page arrives; a later page is only
/// requested once every role on the current page has a verdict. Every row of
/// a page is read before any of its roles is looked up.
pub fn evaluate(
    inventory: &impl InventoryClient,
    roles: &impl RoleClient,
    throttle: &dyn Throttle,
    parameters: &RoleUsageParameters,
    now: DateTime<Utc>,
    policy: ResourceFailurePolicy,
) -> Result<Vec<Evaluation>, EvaluationError> {
    let pages = Pages::new(throttle, |next_token| {
        inventory.select_resources(ROLE_QUERY, ROLE_QUERY_PAGE_SIZE, next_token)
    });

    let mut emitter =
        EvaluationEmitter::new(COMPONENT, RESOURCE_TYPE, NON_COMPLIANT_ANNOTATION, policy);
    let mut discovered = 0;
    for page in pages {
        let rows = page.map_err(EvaluationError::listing)?;
        let role_names = rows
            .iter()
            .map(|row| role_name_from_row(row))
            .collect::<Result<Vec<_>, _>>()
            .map_err(EvaluationError::listing)?;
        discovered += role_names.len();
        log_rule_info(
            COMPONENT,
            "resources_discovered",
            json!({
                "resource_type": RESOURCE_TYPE,
                "count": role_names.len(),
                "total": discovered,
            }),
        );

        for role_name in role_names {
            let outcome = roles
                .get_role(&role_name)
                .map(|usage| is_role_in_use(&usage, now, parameters.days_before_unused));
            emitter.record(&role_name, outcome)?;
        }
    }

    Ok(emitter.finish())
}

/// Extracts `resourceName` from one advanced-query result row.
pub fn role_name_from_row(row: &str) -> Result<String, String> {
    let document: Value = serde_json::from_str(row)
        .map_err(|error| format!("advanced query row is not valid JSON: {error}"))?;
    document
        .get("resourceName")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| "advanced query row has no resourceName".to_string())
}

/// Whole days since the role was last used, or since it was created when it
/// has never been used.
pub fn days_since_last_activity(usage: &RoleUsage, now: DateTime<Utc>) -> i64 {
    let reference = usage.last_used_at.unwrap_or(usage.created_at);
    (now - reference).num_days()
}

pub fn is_role_in_use(usage: &RoleUsage, now: DateTime<Utc>, days_before_unused: i64) -> bool {
    days_since_last_activity(usage, now) <= days_before_unused
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid timestamp")
    }

    fn usage(created_days_ago: i64, last_used_days_ago: Option<i64>) -> RoleUsage {
        RoleUsage {
            role_name: "role".to_string(),
            created_at: now() - Duration::days(created_days_ago),
            last_used_at: last_used_days_ago.map(|days| now() - Duration::days(days)),
        }
    }

    #[test]
    fn last_use_takes_precedence_over_creation() {
        assert_eq!(days_since_last_activity(&usage(400, Some(3)), now()), 3);
    }

    #[test]
    fn never_used_role_falls_back_to_creation_date() {
        assert_eq!(days_since_last_activity(&usage(120, None), now()), 120);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(is_role_in_use(&usage(400, Some(90)), now(), 90));
        assert!(!is_role_in_use(&usage(400, Some(91)), now(), 90));
    }

    #[test]
    fn zero_days_allows_use_within_the_last_day() {
        let mut recent = usage(10, None);
        recent.last_used_at = Some(now() - Duration::hours(23));
        assert!(is_role_in_use(&recent, now(), 0));
        assert!(!is_role_in_use(&usage(10, Some(1)), now(), 0));
    }

    #[test]
    fn reads_resource_name_from_query_row() {
        let row = r#"{"resourceName":"config-rule","resourceType":"AWS::IAM::Role"}"#;
        let name = role_name_from_row(row).expect("row should parse");
        assert_eq!(name, "config-rule");

        assert!(role_name_from_row("{}").is_err());
        assert!(role_name_from_row("not json").is_err());
    }
}
