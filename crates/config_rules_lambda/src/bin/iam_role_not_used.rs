use chrono::Utc;
use config_rules_core::pagination::FixedDelay;
use config_rules_lambda::adapters::config_service::AwsConfigService;
use config_rules_lambda::adapters::iam::AwsRoleClient;
use config_rules_lambda::handlers::iam_role_not_used::handle_iam_role_not_used_event;
use config_rules_lambda::handlers::periodic::{RuleRunResponse, RuleRuntime};
use config_rules_lambda::settings::{init_logging, resource_failure_policy_from_env};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<RuleRunResponse, Error> {
    let policy = resource_failure_policy_from_env()?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let config_service = AwsConfigService::new(aws_sdk_config::Client::new(&aws_config));
    let roles = AwsRoleClient::new(aws_sdk_iam::Client::new(&aws_config));

    let throttle = FixedDelay::default();
    let runtime = RuleRuntime {
        throttle: &throttle,
        policy,
        now: Utc::now(),
    };

    handle_iam_role_not_used_event(
        event.payload,
        &config_service,
        &roles,
        &config_service,
        &runtime,
    )
    .map_err(|error| Error::from(error.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();
    lambda_runtime::run(service_fn(handle_request)).await
}
