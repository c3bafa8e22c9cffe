use config_rules_core::clients::{InventoryClient, RoleClient};
use config_rules_core::parameters::parse_role_usage_parameters;
use config_rules_core::rules::iam_role_not_used::{evaluate, RULE_NAME};
use serde_json::Value;

use crate::adapters::evaluation_sink::EvaluationSink;
use crate::handlers::periodic::{run_periodic_rule, RuleHandlerError, RuleRunResponse, RuleRuntime};

/// Parameters are validated before any role is listed.
pub fn handle_iam_role_not_used_event(
    event: Value,
    inventory: &impl InventoryClient,
    roles: &impl RoleClient,
    sink: &impl EvaluationSink,
    runtime: &RuleRuntime<'_>,
) -> Result<RuleRunResponse, RuleHandlerError> {
    run_periodic_rule(RULE_NAME, event, sink, runtime, |invocation| {
        let parameters = parse_role_usage_parameters(&invocation.parameters)?;
        Ok(evaluate(
            inventory,
            roles,
            runtime.throttle,
            &parameters,
            runtime.now,
            runtime.policy,
        )?)
    })
}
