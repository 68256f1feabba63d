pub mod aws;
pub mod azure;
pub mod gcloud;

use serde_json::Value;
use thiserror::Error;

use crate::config::AmiUsernames;
use crate::instance::{Cloud, InstanceRecord, Instances};
use crate::terraform::{RawState, StateResource};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unsupported cloud provider: {0}")]
    UnsupportedProvider(String),
    #[error("{address}: missing attribute '{attribute}'")]
    MissingAttribute { address: String, attribute: String },
    #[error("{address}: no default username known for AMI '{ami}'")]
    UnknownAmi { address: String, ami: String },
}

/// Maps one provider's Terraform resources onto [`InstanceRecord`]s.
pub trait InstanceParser: Send + Sync {
    fn cloud(&self) -> Cloud;

    /// Terraform resource type holding the provider's virtual machines.
    fn resource_type(&self) -> &'static str;

    /// Builds the record for one matching resource. `siblings` is the whole
    /// resource list, for providers that join across resources.
    fn to_record(
        &self,
        resource: &StateResource,
        siblings: &[StateResource],
    ) -> Result<InstanceRecord, ProviderError>;

    fn parse(&self, state: &RawState) -> Result<Instances, ProviderError> {
        let mut instances = Instances::new();
        for resource in state.managed_of_type(self.resource_type()) {
            let record = self.to_record(resource, state.resources())?;
            instances.insert(resource.address.clone(), record);
        }

        tracing::debug!(
            cloud = %self.cloud(),
            count = instances.len(),
            "instances parsed from state"
        );
        Ok(instances)
    }
}

pub fn get_parser(cloud: Cloud, ami_usernames: &AmiUsernames) -> Box<dyn InstanceParser + '_> {
    match cloud {
        Cloud::Aws => Box::new(aws::AwsParser::new(ami_usernames)),
        Cloud::Azure => Box::new(azure::AzureParser),
        Cloud::Gcloud => Box::new(gcloud::GcloudParser),
    }
}

/// Dispatches on the cloud identifier, then parses. An unknown identifier fails
/// before the state is looked at.
pub fn parse_instances(
    cloud: &str,
    state: &RawState,
    ami_usernames: &AmiUsernames,
) -> Result<Instances, ProviderError> {
    let cloud: Cloud = cloud.parse()?;
    get_parser(cloud, ami_usernames).parse(state)
}

pub(crate) fn required_str(
    resource: &StateResource,
    attribute: &str,
) -> Result<String, ProviderError> {
    resource
        .str_value(attribute)
        .map(str::to_string)
        .ok_or_else(|| missing(resource, attribute))
}

pub(crate) fn required_pointer(
    resource: &StateResource,
    pointer: &str,
) -> Result<String, ProviderError> {
    resource
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(resource, pointer.trim_start_matches('/')))
}

pub(crate) fn missing(resource: &StateResource, attribute: &str) -> ProviderError {
    ProviderError::MissingAttribute {
        address: resource.address.clone(),
        attribute: attribute.to_string(),
    }
}
