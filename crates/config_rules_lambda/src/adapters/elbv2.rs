use aws_sdk_elasticloadbalancingv2::error::DisplayErrorContext;
use aws_sdk_elasticloadbalancingv2::types::{
    Action as SdkAction, Listener as SdkListener, Rule as SdkRule,
};
use config_rules_core::clients::LoadBalancerClient;
use config_rules_core::contract::{Listener, ListenerRule, Page, RuleAction};

use crate::adapters::block_on_sdk;

#[derive(Debug, Clone)]
pub struct AwsLoadBalancerClient {
    client: aws_sdk_elasticloadbalancingv2::Client,
}

impl AwsLoadBalancerClient {
    pub fn new(client: aws_sdk_elasticloadbalancingv2::Client) -> Self {
        Self { client }
    }
}

impl LoadBalancerClient for AwsLoadBalancerClient {
    fn describe_listeners(
        &self,
        load_balancer_arn: &str,
        page_size: i32,
        marker: Option<&str>,
    ) -> Result<Page<Listener>, String> {
        let request = self
            .client
            .describe_listeners()
            .load_balancer_arn(load_balancer_arn)
            .page_size(page_size)
            .set_marker(marker.map(str::to_string));
        let output = block_on_sdk(request.send()).map_err(|error| {
            format!(
                "failed to describe listeners of {load_balancer_arn}: {}",
                DisplayErrorContext(&error)
            )
        })?;

        Ok(Page {
            items: output.listeners().iter().filter_map(listener_from_sdk).collect(),
            next_token: output.next_marker().map(str::to_string),
        })
    }

    fn describe_rules(
        &self,
        listener_arn: &str,
        page_size: i32,
        marker: Option<&str>,
    ) -> Result<Page<ListenerRule>, String> {
        let request = self
            .client
            .describe_rules()
            .listener_arn(listener_arn)
            .page_size(page_size)
            .set_marker(marker.map(str::to_string));
        let output = block_on_sdk(request.send()).map_err(|error| {
            format!(
                "failed to describe rules of {listener_arn}: {}",
                DisplayErrorContext(&error)
            )
        })?;

        Ok(Page {
            items: output.rules().iter().map(rule_from_sdk).collect(),
            next_token: output.next_marker().map(str::to_string),
        })
    }
}

fn listener_from_sdk(listener: &SdkListener) -> Option<Listener> {
    Some(Listener {
        listener_arn: listener.listener_arn()?.to_string(),
        protocol: listener.protocol().map(|protocol| protocol.as_str().to_string()),
        ssl_policy: listener.ssl_policy().map(str::to_string),
    })
}

fn rule_from_sdk(rule: &SdkRule) -> ListenerRule {
    ListenerRule {
        rule_arn: rule.rule_arn().unwrap_or_default().to_string(),
        actions: rule.actions().iter().map(action_from_sdk).collect(),
    }
}

fn action_from_sdk(action: &SdkAction) -> RuleAction {
    RuleAction {
        action_type: action
            .r#type()
            .map(|action_type| action_type.as_str().to_string())
            .unwrap_or_default(),
        redirect_protocol: action
            .redirect_config()
            .and_then(|redirect| redirect.protocol())
            .map(str::to_string),
    }
}
