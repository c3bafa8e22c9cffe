//! Test helpers: in-memory fakes for the client traits.
//!
//! The fakes record every call so tests can assert on request counts, tokens
//! and batch shapes, not just on the verdicts.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::clients::{InventoryClient, LoadBalancerClient, RoleClient};
use crate::contract::{
    BatchPage, ConfigurationItem, Listener, ListenerRule, Page, ResourceKey, RoleUsage,
    RuleAction,
};
use crate::pagination::Throttle;

pub const LOAD_BALANCER_TYPE: &str = "AWS::ElasticLoadBalancingV2::LoadBalancer";

/// Throttle that only counts how often it was asked to pause.
#[derive(Debug, Default)]
pub struct CountingThrottle {
    pauses: AtomicUsize,
}

impl CountingThrottle {
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

impl Throttle for CountingThrottle {
    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn configuration_item(
    resource_type: &str,
    resource_id: &str,
    configuration: &str,
) -> ConfigurationItem {
    ConfigurationItem {
        resource_type: resource_type.to_string(),
        resource_id: resource_id.to_string(),
        resource_name: Some(format!("name-{resource_id}")),
        configuration: Some(configuration.to_string()),
    }
}

pub fn https_listener(listener_arn: &str) -> Listener {
    Listener {
        listener_arn: listener_arn.to_string(),
        protocol: Some("HTTPS".to_string()),
        ssl_policy: Some("ELBSecurityPolicy-2016-08".to_string()),
    }
}

pub fn http_listener(listener_arn: &str) -> Listener {
    Listener {
        listener_arn: listener_arn.to_string(),
        protocol: Some("HTTP".to_string()),
        ssl_policy: None,
    }
}

pub fn redirect_rule(rule_arn: &str, protocol: &str) -> ListenerRule {
    ListenerRule {
        rule_arn: rule_arn.to_string(),
        actions: vec![RuleAction {
            action_type: "redirect".to_string(),
            redirect_protocol: Some(protocol.to_string()),
        }],
    }
}

pub fn forward_rule(rule_arn: &str) -> ListenerRule {
    ListenerRule {
        rule_arn: rule_arn.to_string(),
        actions: vec![RuleAction {
            action_type: "forward".to_string(),
            redirect_protocol: None,
        }],
    }
}

pub fn role_usage(
    role_name: &str,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
) -> RoleUsage {
    RoleUsage {
        role_name: role_name.to_string(),
        created_at,
        last_used_at,
    }
}

fn paginate<T: Clone>(
    items: &[T],
    marker: Option<&str>,
    page_len: usize,
) -> Result<Page<T>, String> {
    let start = match marker {
        Some(marker) => marker
            .parse::<usize>()
            .map_err(|_| format!("unexpected marker '{marker}'"))?,
        None => 0,
    };
    let end = start.saturating_add(page_len).min(items.len());
    let page_items = items.get(start..end).unwrap_or_default().to_vec();
    if end < items.len() {
        Ok(Page::with_next(page_items, end.to_string()))
    } else {
        Ok(Page::last(page_items))
    }
}

/// In-memory inventory. Listing pages and query pages are served in the order
/// they were scripted; a call past the last scripted page gets an empty page.
#[derive(Debug, Default)]
pub struct FakeInventory {
    listing_pages: Mutex<VecDeque<Result<Page<ResourceKey>, String>>>,
    query_pages: Mutex<VecDeque<Result<Page<String>, String>>>,
    configurations: BTreeMap<String, ConfigurationItem>,
    describe_limit: Option<usize>,
    describe_failure: Option<String>,
    list_tokens: Mutex<Vec<Option<String>>>,
    query_tokens: Mutex<Vec<Option<String>>>,
    describe_requests: Mutex<Vec<Vec<String>>>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts discovery pages of `(arn, load balancer type)` pairs. Every
    /// page but the last carries a continuation token.
    pub fn with_load_balancer_pages(mut self, pages: &[&[(&str, &str)]]) -> Self {
        for (index, page) in pages.iter().enumerate() {
            let keys: Vec<ResourceKey> = page
                .iter()
                .map(|(arn, _)| ResourceKey::new(LOAD_BALANCER_TYPE, *arn))
                .collect();
            for (arn, lb_type) in page.iter() {
                let configuration = json!({ "type": lb_type }).to_string();
                self.configurations.insert(
                    arn.to_string(),
                    configuration_item(LOAD_BALANCER_TYPE, arn, &configuration),
                );
            }
            let scripted = if index + 1 < pages.len() {
                Page::with_next(keys, format!("list-token-{}", index + 1))
            } else {
                Page::last(keys)
            };
            self.push_listing(Ok(scripted));
        }
        self
    }

    pub fn with_listing_failure(self, message: &str) -> Self {
        self.push_listing(Err(message.to_string()));
        self
    }

    /// Scripts advanced-query pages of role names.
    pub fn with_role_pages(self, pages: &[&[&str]]) -> Self {
        for (index, page) in pages.iter().enumerate() {
            let rows: Vec<String> = page
                .iter()
                .map(|name| {
                    json!({ "resourceName": name, "resourceType": "AWS::IAM::Role" }).to_string()
                })
                .collect();
            let scripted = if index + 1 < pages.len() {
                Page::with_next(rows, format!("query-token-{}", index + 1))
            } else {
                Page::last(rows)
            };
            self.push_query(Ok(scripted));
        }
        self
    }

    pub fn with_raw_query_rows(self, rows: &[&str]) -> Self {
        let rows = rows.iter().map(|row| row.to_string()).collect();
        self.push_query(Ok(Page::last(rows)));
        self
    }

    pub fn with_query_failure(self, message: &str) -> Self {
        self.push_query(Err(message.to_string()));
        self
    }

    /// Serves at most `limit` keys per describe call and hands back the rest
    /// as unprocessed.
    pub fn with_describe_limit(mut self, limit: usize) -> Self {
        self.describe_limit = Some(limit);
        self
    }

    pub fn with_describe_failure(mut self, message: &str) -> Self {
        self.describe_failure = Some(message.to_string());
        self
    }

    pub fn list_tokens(&self) -> Vec<Option<String>> {
        self.list_tokens.lock().expect("poisoned mutex").clone()
    }

    pub fn query_tokens(&self) -> Vec<Option<String>> {
        self.query_tokens.lock().expect("poisoned mutex").clone()
    }

    pub fn describe_requests(&self) -> Vec<Vec<String>> {
        self.describe_requests.lock().expect("poisoned mutex").clone()
    }

    fn push_listing(&self, page: Result<Page<ResourceKey>, String>) {
        self.listing_pages.lock().expect("poisoned mutex").push_back(page);
    }

    fn push_query(&self, page: Result<Page<String>, String>) {
        self.query_pages.lock().expect("poisoned mutex").push_back(page);
    }
}

impl InventoryClient for FakeInventory {
    fn list_resources(
        &self,
        resource_type: &str,
        _page_size: i32,
        next_token: Option<&str>,
    ) -> Result<Page<ResourceKey>, String> {
        assert_eq!(resource_type, LOAD_BALANCER_TYPE, "unexpected resource type");
        self.list_tokens
            .lock()
            .expect("poisoned mutex")
            .push(next_token.map(str::to_string));
        self.listing_pages
            .lock()
            .expect("poisoned mutex")
            .pop_front()
            .unwrap_or_else(|| Ok(Page::last(Vec::new())))
    }

    fn batch_describe(
        &self,
        keys: &[ResourceKey],
    ) -> Result<BatchPage<ResourceKey, ConfigurationItem>, String> {
        self.describe_requests
            .lock()
            .expect("poisoned mutex")
            .push(keys.iter().map(|key| key.resource_id.clone()).collect());
        if let Some(message) = &self.describe_failure {
            return Err(message.clone());
        }

        let served = self.describe_limit.unwrap_or(keys.len()).min(keys.len());
        let (now, later) = keys.split_at(served);
        Ok(BatchPage {
            items: now
                .iter()
                .filter_map(|key| self.configurations.get(&key.resource_id).cloned())
                .collect(),
            unprocessed_keys: later.to_vec(),
        })
    }

    fn select_resources(
        &self,
        _expression: &str,
        _page_size: i32,
        next_token: Option<&str>,
    ) -> Result<Page<String>, String> {
        self.query_tokens
            .lock()
            .expect("poisoned mutex")
            .push(next_token.map(str::to_string));
        self.query_pages
            .lock()
            .expect("poisoned mutex")
            .pop_front()
            .unwrap_or_else(|| Ok(Page::last(Vec::new())))
    }
}

/// In-memory ELBv2 API. Unknown load balancers have no listeners and unknown
/// listeners have no rules.
#[derive(Debug)]
pub struct FakeLoadBalancers {
    listeners: BTreeMap<String, Vec<Listener>>,
    rules: BTreeMap<String, Vec<ListenerRule>>,
    page_len: usize,
    failing_listeners: BTreeSet<String>,
    listener_calls: Mutex<Vec<(String, Option<String>)>>,
    rule_calls: Mutex<Vec<(String, Option<String>)>>,
}

impl Default for FakeLoadBalancers {
    fn default() -> Self {
        Self {
            listeners: BTreeMap::new(),
            rules: BTreeMap::new(),
            page_len: usize::MAX,
            failing_listeners: BTreeSet::new(),
            listener_calls: Mutex::new(Vec::new()),
            rule_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeLoadBalancers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listeners(mut self, load_balancer_arn: &str, listeners: Vec<Listener>) -> Self {
        self.listeners.insert(load_balancer_arn.to_string(), listeners);
        self
    }

    pub fn with_rules(mut self, listener_arn: &str, rules: Vec<ListenerRule>) -> Self {
        self.rules.insert(listener_arn.to_string(), rules);
        self
    }

    /// Splits every describe response into pages of `page_len` items.
    pub fn with_page_len(mut self, page_len: usize) -> Self {
        self.page_len = page_len.max(1);
        self
    }

    pub fn with_failing_rules(mut self, listener_arn: &str) -> Self {
        self.failing_listeners.insert(listener_arn.to_string());
        self
    }

    pub fn listener_calls(&self) -> Vec<(String, Option<String>)> {
        self.listener_calls.lock().expect("poisoned mutex").clone()
    }

    pub fn rule_calls(&self) -> Vec<(String, Option<String>)> {
        self.rule_calls.lock().expect("poisoned mutex").clone()
    }

    /// Listener ARNs whose rules were fetched, one entry per listener.
    pub fn listeners_with_rule_fetches(&self) -> Vec<String> {
        let mut fetched: Vec<String> = Vec::new();
        for (listener_arn, _) in self.rule_calls() {
            if !fetched.contains(&listener_arn) {
                fetched.push(listener_arn);
            }
        }
        fetched
    }
}

impl LoadBalancerClient for FakeLoadBalancers {
    fn describe_listeners(
        &self,
        load_balancer_arn: &str,
        _page_size: i32,
        marker: Option<&str>,
    ) -> Result<Page<Listener>, String> {
        self.listener_calls
            .lock()
            .expect("poisoned mutex")
            .push((load_balancer_arn.to_string(), marker.map(str::to_string)));
        let listeners = self
            .listeners
            .get(load_balancer_arn)
            .map(Vec::as_slice)
            .unwrap_or_default();
        paginate(listeners, marker, self.page_len)
    }

    fn describe_rules(
        &self,
        listener_arn: &str,
        _page_size: i32,
        marker: Option<&str>,
    ) -> Result<Page<ListenerRule>, String> {
        self.rule_calls
            .lock()
            .expect("poisoned mutex")
            .push((listener_arn.to_string(), marker.map(str::to_string)));
        if self.failing_listeners.contains(listener_arn) {
            return Err(format!("ListenerNotFound: {listener_arn}"));
        }
        let rules = self
            .rules
            .get(listener_arn)
            .map(Vec::as_slice)
            .unwrap_or_default();
        paginate(rules, marker, self.page_len)
    }
}

/// In-memory IAM. Roles that were never registered fail like a missing entity.
#[derive(Debug, Default)]
pub struct FakeRoles {
    roles: BTreeMap<String, RoleUsage>,
    calls: Mutex<Vec<String>>,
}

impl FakeRoles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, usage: RoleUsage) -> Self {
        self.roles.insert(usage.role_name.clone(), usage);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("poisoned mutex").clone()
    }
}

impl RoleClient for FakeRoles {
    fn get_role(&self, role_name: &str) -> Result<RoleUsage, String> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(role_name.to_string());
        self.roles
            .get(role_name)
            .cloned()
            .ok_or_else(|| format!("NoSuchEntity: role {role_name} cannot be found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_splits_and_resumes() {
        let items = [1, 2, 3, 4, 5];
        let first = paginate(&items, None, 2).expect("first page");
        assert_eq!(first, Page::with_next(vec![1, 2], "2"));

        let last = paginate(&items, Some("4"), 2).expect("last page");
        assert_eq!(last, Page::last(vec![5]));
    }

    #[test]
    fn describe_limit_reports_unprocessed_keys() {
        let inventory = FakeInventory::new()
            .with_load_balancer_pages(&[&[("a", "application"), ("b", "network")]])
            .with_describe_limit(1);
        let keys = vec![
            ResourceKey::new(LOAD_BALANCER_TYPE, "a"),
            ResourceKey::new(LOAD_BALANCER_TYPE, "b"),
        ];

        let batch = inventory.batch_describe(&keys).expect("describe");
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.unprocessed_keys, keys[1..].to_vec());
    }
}
