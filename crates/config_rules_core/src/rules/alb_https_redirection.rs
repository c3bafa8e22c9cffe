//! ALB_HTTP_TO_HTTPS_REDIRECTION_CHECK
//!
//! An Application Load Balancer is compliant when every listener is either an
//! HTTPS listener or only carries rules that redirect to HTTPS. Network and
//! gateway load balancers are not evaluated.

use serde_json::{json, Value};

use crate::clients::{InventoryClient, LoadBalancerClient};
use crate::contract::{Evaluation, EvaluationError, Listener, ListenerRule, RuleAction};
use crate::evaluation::{EvaluationEmitter, ResourceFailurePolicy};
use crate::filter::filter_by_configuration;
use crate::logging::log_rule_info;
use crate::pagination::{fetch_all, Pages, Throttle};
use crate::reduction::{all_satisfy, satisfied_directly_or_by_children};

pub const RULE_NAME: &str = "ALB_HTTP_TO_HTTPS_REDIRECTION_CHECK";
pub const RESOURCE_TYPE: &str = "AWS::ElasticLoadBalancingV2::LoadBalancer";
pub const NON_COMPLIANT_ANNOTATION: &str =
    "HTTP listener rule must have HTTP to HTTPS redirection action configured";
pub const CONFIG_PAGE_SIZE: i32 = 100;
pub const ELB_PAGE_SIZE: i32 = 400;

const COMPONENT: &str = "alb_https_redirection";

pub fn evaluate(
    inventory: &impl InventoryClient,
    load_balancers: &impl LoadBalancerClient,
    throttle: &dyn Throttle,
    policy: ResourceFailurePolicy,
) -> Result<Vec<Evaluation>, EvaluationError> {
    let load_balancer_arns =
        list_application_load_balancers(inventory, throttle).map_err(EvaluationError::listing)?;
    log_rule_info(
        COMPONENT,
        "resources_discovered",
        json!({ "resource_type": RESOURCE_TYPE, "count": load_balancer_arns.len() }),
    );

    let mut emitter =
        EvaluationEmitter::new(COMPONENT, RESOURCE_TYPE, NON_COMPLIANT_ANNOTATION, policy);
    for arn in &load_balancer_arns {
        let outcome = is_load_balancer_compliant(load_balancers, arn, throttle);
        emitter.record(arn, outcome)?;
    }
    Ok(emitter.finish())
}

/// Lists every discovered ELBv2 load balancer and keeps the application ones,
/// in discovery order.
pub fn list_application_load_balancers(
    inventory: &impl InventoryClient,
    throttle: &dyn Throttle,
) -> Result<Vec<String>, String> {
    let pages = Pages::new(throttle, |next_token| {
        inventory.list_resources(RESOURCE_TYPE, CONFIG_PAGE_SIZE, next_token)
    });

    let mut arns = Vec::new();
    for page in pages {
        let keys = page?;
        let matched = filter_by_configuration(
            &keys,
            throttle,
            |batch| inventory.batch_describe(batch),
            is_application_load_balancer,
        )?;
        arns.extend(matched.into_iter().map(|item| item.resource_id));
    }
    Ok(arns)
}

pub fn is_application_load_balancer(configuration: &Value) -> bool {
    configuration.get("type").and_then(Value::as_str) == Some("application")
}

pub fn fetch_listeners(
    client: &impl LoadBalancerClient,
    load_balancer_arn: &str,
    throttle: &dyn Throttle,
) -> Result<Vec<Listener>, String> {
    fetch_all(throttle, |marker| {
        client.describe_listeners(load_balancer_arn, ELB_PAGE_SIZE, marker)
    })
}

pub fn fetch_listener_rules(
    client: &impl LoadBalancerClient,
    listener_arn: &str,
    throttle: &dyn Throttle,
) -> Result<Vec<ListenerRule>, String> {
    fetch_all(throttle, |marker| {
        client.describe_rules(listener_arn, ELB_PAGE_SIZE, marker)
    })
}

pub fn is_load_balancer_compliant(
    client: &impl LoadBalancerClient,
    load_balancer_arn: &str,
    throttle: &dyn Throttle,
) -> Result<bool, String> {
    let listeners = fetch_listeners(client, load_balancer_arn, throttle)?;
    all_satisfy(listeners, |listener| {
        is_listener_compliant(client, listener, throttle)
    })
}

/// HTTPS listeners pass without looking at their rules.
pub fn is_listener_compliant(
    client: &impl LoadBalancerClient,
    listener: &Listener,
    throttle: &dyn Throttle,
) -> Result<bool, String> {
    satisfied_directly_or_by_children(
        listener,
        is_https_listener,
        |listener| fetch_listener_rules(client, &listener.listener_arn, throttle),
        is_listener_rule_compliant,
    )
}

pub fn is_https_listener(listener: &Listener) -> bool {
    listener.ssl_policy.is_some()
}

pub fn is_listener_rule_compliant(rule: &ListenerRule) -> bool {
    rule.actions.iter().all(is_https_redirect_action)
}

pub fn is_https_redirect_action(action: &RuleAction) -> bool {
    action.action_type == "redirect" && action.redirect_protocol.as_deref() == Some("HTTPS")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(action_type: &str, protocol: Option<&str>) -> RuleAction {
        RuleAction {
            action_type: action_type.to_string(),
            redirect_protocol: protocol.map(str::to_string),
        }
    }

    #[test]
    fn only_application_type_is_selected() {
        assert!(is_application_load_balancer(&json!({"type": "application"})));
        assert!(!is_application_load_balancer(&json!({"type": "network"})));
        assert!(!is_application_load_balancer(&json!({})));
    }

    #[test]
    fn redirect_must_target_https() {
        assert!(is_https_redirect_action(&action("redirect", Some("HTTPS"))));
        assert!(!is_https_redirect_action(&action("redirect", Some("HTTP"))));
        assert!(!is_https_redirect_action(&action("redirect", None)));
        assert!(!is_https_redirect_action(&action("forward", Some("HTTPS"))));
    }

    #[test]
    fn rule_needs_every_action_to_redirect() {
        let compliant = ListenerRule {
            rule_arn: "rule1".to_string(),
            actions: vec![action("redirect", Some("HTTPS"))],
        };
        let mixed = ListenerRule {
            rule_arn: "rule2".to_string(),
            actions: vec![action("redirect", Some("HTTPS")), action("forward", None)],
        };

        assert!(is_listener_rule_compliant(&compliant));
        assert!(!is_listener_rule_compliant(&mixed));
    }

    #[test]
    fn ssl_policy_marks_https_listener() {
        let listener = Listener {
            listener_arn: "l1".to_string(),
            protocol: Some("HTTPS".to_string()),
            ssl_policy: Some("ELBSecurityPolicy-2016-08".to_string()),
        };
        assert!(is_https_listener(&listener));
        assert!(!is_https_listener(&Listener {
            ssl_policy: None,
            ..listener
        }));
    }
}
