use aws_sdk_config::error::DisplayErrorContext;
use aws_sdk_config::primitives::DateTime as SdkDateTime;
use aws_sdk_config::types::{
    ComplianceType as SdkComplianceType, Evaluation as SdkEvaluation,
    ResourceKey as SdkResourceKey, ResourceType,
};
use chrono::{DateTime, Utc};
use config_rules_core::clients::InventoryClient;
use config_rules_core::contract::{
    BatchPage, ComplianceType, ConfigurationItem, Evaluation, Page, ResourceKey,
};

use crate::adapters::block_on_sdk;
use crate::adapters::evaluation_sink::EvaluationSink;

/// AWS Config: resource discovery, advanced queries and evaluation results.
#[derive(Debug, Clone)]
pub struct AwsConfigService {
    client: aws_sdk_config::Client,
}

impl AwsConfigService {
    pub fn new(client: aws_sdk_config::Client) -> Self {
        Self { client }
    }
}

impl InventoryClient for AwsConfigService {
    fn list_resources(
        &self,
        resource_type: &str,
        page_size: i32,
        next_token: Option<&str>,
    ) -> Result<Page<ResourceKey>, String> {
        let request = self
            .client
            .list_discovered_resources()
            .resource_type(ResourceType::from(resource_type))
            .limit(page_size)
            .include_deleted_resources(false)
            .set_next_token(next_token.map(str::to_string));

        let output = block_on_sdk(request.send()).map_err(|error| {
            format!(
                "failed to list discovered {resource_type} resources: {}",
                DisplayErrorContext(&error)
            )
        })?;

        let items = output
            .resource_identifiers()
            .iter()
            .filter_map(|identifier| {
                let resource_id = identifier.resource_id()?;
                let listed_type = identifier
                    .resource_type()
                    .map(|value| value.as_str())
                    .unwrap_or(resource_type);
                Some(ResourceKey::new(listed_type, resource_id))
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    fn batch_describe(
        &self,
        keys: &[ResourceKey],
    ) -> Result<BatchPage<ResourceKey, ConfigurationItem>, String> {
        let sdk_keys = keys
            .iter()
            .map(|key| {
                SdkResourceKey::builder()
                    .resource_type(ResourceType::from(key.resource_type.as_str()))
                    .resource_id(&key.resource_id)
                    .build()
                    .map_err(|error| format!("invalid resource key {}: {error}", key.resource_id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let request = self
            .client
            .batch_get_resource_config()
            .set_resource_keys(Some(sdk_keys));
        let output = block_on_sdk(request.send()).map_err(|error| {
            format!(
                "failed to batch describe resources: {}",
                DisplayErrorContext(&error)
            )
        })?;

        let items = output
            .base_configuration_items()
            .iter()
            .filter_map(|item| {
                Some(ConfigurationItem {
                    resource_type: item.resource_type()?.as_str().to_string(),
                    resource_id: item.resource_id()?.to_string(),
                    resource_name: item.resource_name().map(str::to_string),
                    configuration: item.configuration().map(str::to_string),
                })
            })
            .collect();
        let unprocessed_keys = output
            .unprocessed_resource_keys()
            .iter()
            .map(|key| ResourceKey::new(key.resource_type().as_str(), key.resource_id()))
            .collect();

        Ok(BatchPage {
            items,
            unprocessed_keys,
        })
    }

    fn select_resources(
        &self,
        expression: &str,
        page_size: i32,
        next_token: Option<&str>,
    ) -> Result<Page<String>, String> {
        let request = self
            .client
            .select_resource_config()
            .expression(expression)
            .limit(page_size)
            .set_next_token(next_token.map(str::to_string));
        let output = block_on_sdk(request.send()).map_err(|error| {
            format!(
                "failed to run advanced query: {}",
                DisplayErrorContext(&error)
            )
        })?;

        Ok(Page {
            items: output.results().to_vec(),
            next_token: output.next_token().map(str::to_string),
        })
    }
}

impl EvaluationSink for AwsConfigService {
    fn put_evaluations(
        &self,
        result_token: &str,
        evaluations: &[Evaluation],
        ordering_timestamp: DateTime<Utc>,
    ) -> Result<usize, String> {
        let timestamp = SdkDateTime::from_millis(ordering_timestamp.timestamp_millis());
        let sdk_evaluations = evaluations
            .iter()
            .map(|evaluation| to_sdk_evaluation(evaluation, timestamp))
            .collect::<Result<Vec<_>, _>>()?;

        let request = self
            .client
            .put_evaluations()
            .result_token(result_token)
            .set_evaluations(Some(sdk_evaluations));
        let output = block_on_sdk(request.send()).map_err(|error| {
            format!(
                "failed to put evaluations: {}",
                DisplayErrorContext(&error)
            )
        })?;

        Ok(output.failed_evaluations().len())
    }
}

fn to_sdk_evaluation(
    evaluation: &Evaluation,
    ordering_timestamp: SdkDateTime,
) -> Result<SdkEvaluation, String> {
    SdkEvaluation::builder()
        .compliance_resource_type(&evaluation.resource_type)
        .compliance_resource_id(&evaluation.resource_id)
        .compliance_type(sdk_compliance_type(evaluation.compliance_type))
        .set_annotation(evaluation.annotation.clone())
        .ordering_timestamp(ordering_timestamp)
        .build()
        .map_err(|error| {
            format!(
                "invalid evaluation for {}: {error}",
                evaluation.resource_id
            )
        })
}

/// PutEvaluations has no ERROR value; a failed evaluation is reported as
/// missing data.
pub fn sdk_compliance_type(compliance_type: ComplianceType) -> SdkComplianceType {
    match compliance_type {
        ComplianceType::Compliant => SdkComplianceType::Compliant,
        ComplianceType::NonCompliant => SdkComplianceType::NonCompliant,
        ComplianceType::NotApplicable => SdkComplianceType::NotApplicable,
        ComplianceType::Error => SdkComplianceType::InsufficientData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_verdict_maps_to_insufficient_data() {
        assert_eq!(
            sdk_compliance_type(ComplianceType::Error),
            SdkComplianceType::InsufficientData
        );
        assert_eq!(
            sdk_compliance_type(ComplianceType::NonCompliant),
            SdkComplianceType::NonCompliant
        );
    }

    #[test]
    fn evaluation_carries_annotation_and_timestamp() {
        let evaluation = Evaluation::new(
            "role-a",
            "AWS::IAM::Role",
            ComplianceType::NonCompliant,
            Some("unused".to_string()),
        );
        let timestamp = SdkDateTime::from_secs(1_700_000_000);

        let sdk = to_sdk_evaluation(&evaluation, timestamp).expect("evaluation should build");

        assert_eq!(sdk.compliance_resource_id(), "role-a");
        assert_eq!(sdk.compliance_resource_type(), "AWS::IAM::Role");
        assert_eq!(sdk.annotation(), Some("unused"));
        assert_eq!(sdk.ordering_timestamp(), &timestamp);
    }
}
