use std::collections::VecDeque;

use serde_json::Value;

use crate::contract::{BatchPage, ConfigurationItem, ResourceKey, BATCH_DESCRIBE_LIMIT};
use crate::pagination::Throttle;

/// Describes `keys` in batches and keeps the items whose parsed configuration
/// satisfies `predicate`.
///
/// Keys are sent in groups of at most [`BATCH_DESCRIBE_LIMIT`]. Unprocessed keys
/// handed back by a response are requested again before the next group. The
/// throttle runs between consecutive describe calls, never after the last one.
/// Items without a configuration payload never match.
pub fn filter_by_configuration<F, P>(
    keys: &[ResourceKey],
    throttle: &dyn Throttle,
    mut describe: F,
    predicate: P,
) -> Result<Vec<ConfigurationItem>, String>
where
    F: FnMut(&[ResourceKey]) -> Result<BatchPage<ResourceKey, ConfigurationItem>, String>,
    P: Fn(&Value) -> bool,
{
    let mut pending: VecDeque<Vec<ResourceKey>> = keys
        .chunks(BATCH_DESCRIBE_LIMIT)
        .map(<[ResourceKey]>::to_vec)
        .collect();
    let mut matched = Vec::new();
    let mut issued_request = false;

    while let Some(group) = pending.pop_front() {
        if issued_request {
            throttle.pause();
        }
        issued_request = true;

        let batch = describe(&group)?;
        for item in batch.items {
            if configuration_matches(&item, &predicate)? {
                matched.push(item);
            }
        }

        if !batch.unprocessed_keys.is_empty() {
            pending.push_front(batch.unprocessed_keys);
        }
    }

    Ok(matched)
}

fn configuration_matches<P>(item: &ConfigurationItem, predicate: &P) -> Result<bool, String>
where
    P: Fn(&Value) -> bool,
{
    let Some(raw) = item.configuration.as_deref() else {
        return Ok(false);
    };

    let configuration: Value = serde_json::from_str(raw).map_err(|error| {
        format!(
            "configuration for resource {} is not valid JSON: {error}",
            item.resource_id
        )
    })?;
    Ok(predicate(&configuration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{configuration_item, CountingThrottle};

    const LB_TYPE: &str = "AWS::ElasticLoadBalancingV2::LoadBalancer";
    const APPLICATION: &str = r#"{"type":"application"}"#;

    fn keys(ids: &[&str]) -> Vec<ResourceKey> {
        ids.iter().map(|id| ResourceKey::new(LB_TYPE, *id)).collect()
    }

    fn is_application(configuration: &Value) -> bool {
        configuration.get("type").and_then(Value::as_str) == Some("application")
    }

    #[test]
    fn keeps_only_matching_configurations() {
        let throttle = CountingThrottle::default();
        let matched = filter_by_configuration(
            &keys(&["arn1", "arn2"]),
            &throttle,
            |requested| {
                assert_eq!(requested.len(), 2);
                Ok(BatchPage {
                    items: vec![
                        configuration_item(LB_TYPE, "arn1", r#"{"type": "network"}"#),
                        configuration_item(LB_TYPE, "arn2", r#"{"type": "application"}"#),
                    ],
                    unprocessed_keys: Vec::new(),
                })
            },
            is_application,
        )
        .expect("filter should succeed");

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].resource_id, "arn2");
        assert_eq!(throttle.pauses(), 0);
    }

    #[test]
    fn follows_unprocessed_keys_until_drained() {
        let throttle = CountingThrottle::default();
        let mut requests: Vec<Vec<String>> = Vec::new();

        let matched = filter_by_configuration(
            &keys(&["arn1", "arn2", "arn3"]),
            &throttle,
            |requested| {
                requests.push(
                    requested
                        .iter()
                        .map(|key| key.resource_id.clone())
                        .collect(),
                );
                let (served, rest) = requested.split_at(1);
                Ok(BatchPage {
                    items: served
                        .iter()
                        .map(|key| configuration_item(LB_TYPE, &key.resource_id, APPLICATION))
                        .collect(),
                    unprocessed_keys: rest.to_vec(),
                })
            },
            is_application,
        )
        .expect("filter should succeed");

        let ids: Vec<_> = matched.iter().map(|item| item.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["arn1", "arn2", "arn3"]);
        assert_eq!(
            requests,
            vec![
                vec!["arn1", "arn2", "arn3"],
                vec!["arn2", "arn3"],
                vec!["arn3"],
            ]
        );
        assert_eq!(throttle.pauses(), 2);
    }

    #[test]
    fn splits_large_key_sets_into_fixed_groups() {
        let throttle = CountingThrottle::default();
        let ids: Vec<String> = (0..BATCH_DESCRIBE_LIMIT * 2 + 5)
            .map(|index| format!("arn{index}"))
            .collect();
        let all_keys: Vec<ResourceKey> =
            ids.iter().map(|id| ResourceKey::new(LB_TYPE, id)).collect();
        let mut group_sizes = Vec::new();

        let matched = filter_by_configuration(
            &all_keys,
            &throttle,
            |requested| {
                group_sizes.push(requested.len());
                Ok(BatchPage {
                    items: requested
                        .iter()
                        .map(|key| configuration_item(LB_TYPE, &key.resource_id, APPLICATION))
                        .collect(),
                    unprocessed_keys: Vec::new(),
                })
            },
            is_application,
        )
        .expect("filter should succeed");

        assert_eq!(matched.len(), all_keys.len());
        assert_eq!(group_sizes, vec![BATCH_DESCRIBE_LIMIT, BATCH_DESCRIBE_LIMIT, 5]);
        assert_eq!(throttle.pauses(), 2);
    }

    #[test]
    fn no_keys_means_no_requests() {
        let throttle = CountingThrottle::default();
        let matched = filter_by_configuration(
            &[],
            &throttle,
            |_| -> Result<BatchPage<ResourceKey, ConfigurationItem>, String> {
                panic!("describe must not be called without keys")
            },
            is_application,
        )
        .expect("filter should succeed");

        assert!(matched.is_empty());
    }

    #[test]
    fn malformed_configuration_is_an_error() {
        let throttle = CountingThrottle::default();
        let error = filter_by_configuration(
            &keys(&["arn1"]),
            &throttle,
            |_| {
                Ok(BatchPage {
                    items: vec![configuration_item(LB_TYPE, "arn1", "{not json")],
                    unprocessed_keys: Vec::new(),
                })
            },
            is_application,
        )
        .expect_err("malformed configuration should fail");

        assert!(error.contains("arn1"));
    }

    #[test]
    fn missing_configuration_does_not_match() {
        let throttle = CountingThrottle::default();
        let mut item = configuration_item(LB_TYPE, "arn1", "{}");
        item.configuration = None;

        let matched = filter_by_configuration(
            &keys(&["arn1"]),
            &throttle,
            move |_| {
                Ok(BatchPage {
                    items: vec![item.clone()],
                    unprocessed_keys: Vec::new(),
                })
            },
            |_| true,
        )
        .expect("filter should succeed");

        assert!(matched.is_empty());
    }

    #[test]
    fn describe_failure_propagates() {
        let throttle = CountingThrottle::default();
        let error = filter_by_configuration(
            &keys(&["arn1"]),
            &throttle,
            |_| Err("access denied".to_string()),
            is_application,
        )
        .expect_err("describe failure should propagate");

        assert_eq!(error, "access denied");
    }
}
