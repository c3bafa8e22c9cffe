use config_rules_core::contract::ValidationError;
use config_rules_core::evaluation::ResourceFailurePolicy;

pub const RESOURCE_FAILURE_POLICY_VAR: &str = "RESOURCE_FAILURE_POLICY";

/// Reads the failure policy from the environment. Unset means abort.
pub fn resource_failure_policy_from_env() -> Result<ResourceFailurePolicy, ValidationError> {
    resource_failure_policy_from(std::env::var(RESOURCE_FAILURE_POLICY_VAR).ok().as_deref())
}

pub fn resource_failure_policy_from(
    value: Option<&str>,
) -> Result<ResourceFailurePolicy, ValidationError> {
    value.unwrap_or_default().parse()
}

/// Log lines are already JSON, so the formatter prints the message as is.
pub fn init_logging() {
    use std::io::Write;

    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::Builder::from_env(env)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}
