//! Capability traits over the remote services a rule talks to.
//!
//! Implementations live in `config_rules_lambda::adapters`; tests use the fakes
//! in `test_helpers`.

use crate::contract::{
    BatchPage, ConfigurationItem, Listener, ListenerRule, Page, ResourceKey, RoleUsage,
};

/// The configuration inventory (AWS Config).
pub trait InventoryClient {
    fn list_resources(
        &self,
        resource_type: &str,
        page_size: i32,
        next_token: Option<&str>,
    ) -> Result<Page<ResourceKey>, String>;

    fn batch_describe(
        &self,
        keys: &[ResourceKey],
    ) -> Result<BatchPage<ResourceKey, ConfigurationItem>, String>;

    /// Runs an advanced query. Each returned row is a JSON document.
    fn select_resources(
        &self,
        expression: &str,
        page_size: i32,
        next_token: Option<&str>,
    ) -> Result<Page<String>, String>;
}

pub trait LoadBalancerClient {
    fn describe_listeners(
        &self,
        load_balancer_arn: &str,
        page_size: i32,
        marker: Option<&str>,
    ) -> Result<Page<Listener>, String>;

    fn describe_rules(
        &self,
        listener_arn: &str,
        page_size: i32,
        marker: Option<&str>,
    ) -> Result<Page<ListenerRule>, String>;
}

pub trait RoleClient {
    fn get_role(&self, role_name: &str) -> Result<RoleUsage, String>;
}
