use std::fmt;

use chrono::{DateTime, Utc};
use config_rules_core::parameters::RuleParameters;
use serde::Deserialize;
use serde_json::Value;

pub const SCHEDULED_NOTIFICATION: &str = "ScheduledNotification";

/// Event AWS Config sends to a custom rule function.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRuleEvent {
    pub invoking_event: String,
    #[serde(default)]
    pub rule_parameters: Option<String>,
    #[serde(default)]
    pub result_token: Option<String>,
    #[serde(default)]
    pub config_rule_name: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct InvokingEvent {
    message_type: String,
    #[serde(default)]
    notification_creation_time: Option<String>,
    #[serde(default)]
    aws_account_id: Option<String>,
}

/// A validated periodic trigger, ready to be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicInvocation {
    pub config_rule_name: String,
    pub account_id: String,
    pub result_token: String,
    pub parameters: RuleParameters,
    pub notification_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventError {
    pub message: String,
}

impl EventError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EventError {}

pub fn parse_periodic_event(event: Value) -> Result<PeriodicInvocation, EventError> {
    let event: ConfigRuleEvent = serde_json::from_value(event)
        .map_err(|error| EventError::new(format!("Malformed Config rule event: {error}")))?;

    let invoking: InvokingEvent = serde_json::from_str(&event.invoking_event)
        .map_err(|error| EventError::new(format!("Malformed invokingEvent: {error}")))?;
    if invoking.message_type != SCHEDULED_NOTIFICATION {
        return Err(EventError::new(format!(
            "Unexpected message type '{}', only {SCHEDULED_NOTIFICATION} is supported",
            invoking.message_type
        )));
    }

    let result_token = match event.result_token {
        Some(token) if !token.trim().is_empty() => token,
        _ => return Err(EventError::new("Config rule event must include resultToken")),
    };

    let account_id = non_blank(invoking.aws_account_id)
        .or_else(|| non_blank(event.account_id))
        .ok_or_else(|| EventError::new("Config rule event must include an account id"))?;

    let notification_time = invoking
        .notification_creation_time
        .as_deref()
        .map(parse_notification_time)
        .transpose()?;

    Ok(PeriodicInvocation {
        config_rule_name: event.config_rule_name.unwrap_or_default(),
        account_id,
        result_token,
        parameters: parse_rule_parameters(event.rule_parameters.as_deref())?,
        notification_time,
    })
}

fn parse_rule_parameters(raw: Option<&str>) -> Result<RuleParameters, EventError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(RuleParameters::new()),
        Some(text) => serde_json::from_str(text)
            .map_err(|error| EventError::new(format!("Malformed ruleParameters: {error}"))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_notification_time(raw: &str) -> Result<DateTime<Utc>, EventError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| {
            EventError::new(format!("Malformed notificationCreationTime '{raw}': {error}"))
        })
}
