use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::primitives::DateTime as SdkDateTime;
use aws_sdk_iam::types::Role;
use chrono::{DateTime, Utc};
use config_rules_core::clients::RoleClient;
use config_rules_core::contract::RoleUsage;

use crate::adapters::{block_on_sdk, chrono_from_sdk};

#[derive(Debug, Clone)]
pub struct AwsRoleClient {
    client: aws_sdk_iam::Client,
}

impl AwsRoleClient {
    pub fn new(client: aws_sdk_iam::Client) -> Self {
        Self { client }
    }
}

impl RoleClient for AwsRoleClient {
    fn get_role(&self, role_name: &str) -> Result<RoleUsage, String> {
        let request = self.client.get_role().role_name(role_name);
        let output = block_on_sdk(request.send()).map_err(|error| {
            format!(
                "failed to get role {role_name}: {}",
                DisplayErrorContext(&error)
            )
        })?;

        let role = output
            .role()
            .ok_or_else(|| format!("get role {role_name} returned no role"))?;
        role_usage_from_sdk(role)
    }
}

fn role_usage_from_sdk(role: &Role) -> Result<RoleUsage, String> {
    let last_used_at = role
        .role_last_used()
        .and_then(|last_used| last_used.last_used_date())
        .map(to_chrono)
        .transpose()?;

    Ok(RoleUsage {
        role_name: role.role_name().to_string(),
        created_at: to_chrono(role.create_date())?,
        last_used_at,
    })
}

fn to_chrono(timestamp: &SdkDateTime) -> Result<DateTime<Utc>, String> {
    chrono_from_sdk(timestamp.secs(), timestamp.subsec_nanos())
}
