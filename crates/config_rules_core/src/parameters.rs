use std::collections::BTreeMap;

use serde_json::Value;

use crate::contract::ValidationError;

pub const DAYS_BEFORE_UNUSED: &str = "DaysBeforeUnused";
pub const DEFAULT_DAYS_BEFORE_UNUSED: i64 = 90;

/// Rule parameters as configured on the Config rule.
pub type RuleParameters = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleUsageParameters {
    pub days_before_unused: i64,
}

impl Default for RoleUsageParameters {
    fn default() -> Self {
        Self {
            days_before_unused: DEFAULT_DAYS_BEFORE_UNUSED,
        }
    }
}

/// Validates `DaysBeforeUnused`. The key must be present; an empty value
/// selects the default. Zero is allowed and means "used within the last day".
pub fn parse_role_usage_parameters(
    parameters: &RuleParameters,
) -> Result<RoleUsageParameters, ValidationError> {
    let Some(raw) = parameters.get(DAYS_BEFORE_UNUSED) else {
        return Err(ValidationError::new(format!(
            "The Config Rule must have the parameter \"{DAYS_BEFORE_UNUSED}\""
        )));
    };

    let days_before_unused = match raw {
        Value::Null => DEFAULT_DAYS_BEFORE_UNUSED,
        Value::String(text) if text.trim().is_empty() => DEFAULT_DAYS_BEFORE_UNUSED,
        Value::String(text) => text.trim().parse::<i64>().map_err(|_| not_an_integer())?,
        Value::Number(number) => number.as_i64().ok_or_else(not_an_integer)?,
        _ => return Err(not_an_integer()),
    };

    if days_before_unused < 0 {
        return Err(ValidationError::new(format!(
            "The parameter \"{DAYS_BEFORE_UNUSED}\" must be greater than or equal to 0"
        )));
    }

    Ok(RoleUsageParameters { days_before_unused })
}

fn not_an_integer() -> ValidationError {
    ValidationError::new(format!(
        "The parameter \"{DAYS_BEFORE_UNUSED}\" must be a integer"
    ))
}
