use config_rules_core::clients::{InventoryClient, LoadBalancerClient};
use config_rules_core::rules::alb_https_redirection::{evaluate, RULE_NAME};
use serde_json::Value;

use crate::adapters::evaluation_sink::EvaluationSink;
use crate::handlers::periodic::{run_periodic_rule, RuleHandlerError, RuleRunResponse, RuleRuntime};

/// The rule takes no parameters; any configured ones are ignored.
pub fn handle_alb_https_redirection_event(
    event: Value,
    inventory: &impl InventoryClient,
    load_balancers: &impl LoadBalancerClient,
    sink: &impl EvaluationSink,
    runtime: &RuleRuntime<'_>,
) -> Result<RuleRunResponse, RuleHandlerError> {
    run_periodic_rule(RULE_NAME, event, sink, runtime, |_| {
        Ok(evaluate(
            inventory,
            load_balancers,
            runtime.throttle,
            runtime.policy,
        )?)
    })
}
