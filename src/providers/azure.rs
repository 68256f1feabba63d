use serde_json::Value;

use super::{InstanceParser, ProviderError, required_str};
use crate::instance::{AzureImage, Cloud, InstanceRecord, ProviderDetails};
use crate::terraform::StateResource;

pub const RESOURCE_TYPE: &str = "azurerm_linux_virtual_machine";
pub const PUBLIC_IP_TYPE: &str = "azurerm_public_ip";

pub struct AzureParser;

impl InstanceParser for AzureParser {
    fn cloud(&self) -> Cloud {
        Cloud::Azure
    }

    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn to_record(
        &self,
        resource: &StateResource,
        siblings: &[StateResource],
    ) -> Result<InstanceRecord, ProviderError> {
        Ok(InstanceRecord {
            cloud: Cloud::Azure,
            address: resource.address.clone(),
            name: resource.name.clone(),
            instance_id: required_str(resource, "id")?,
            public_ip: required_str(resource, "public_ip_address")?,
            public_dns: vm_fqdn(&resource.name, siblings),
            username: required_str(resource, "admin_username")?,
            details: ProviderDetails::Azure {
                location: required_str(resource, "location")?,
                image: image(resource),
            },
        })
    }
}

/// FQDN of the public IP whose DNS label equals the VM name.
fn vm_fqdn(vm_name: &str, resources: &[StateResource]) -> Option<String> {
    resources
        .iter()
        .filter(|r| r.is_managed() && r.resource_type == PUBLIC_IP_TYPE)
        .find(|r| r.str_value("domain_name_label") == Some(vm_name))
        .and_then(|r| r.str_value("fqdn"))
        .map(str::to_string)
}

/// `source_image_reference` wins over `source_image_id`. Terraform renders the
/// reference block as a one-element list, which is unwrapped here.
fn image(resource: &StateResource) -> Option<AzureImage> {
    let reference = match resource.values.get("source_image_reference") {
        Some(Value::Array(blocks)) => blocks.first().cloned(),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.clone()),
    };

    reference
        .filter(|block| !block.is_null())
        .map(AzureImage::Reference)
        .or_else(|| {
            resource
                .str_value("source_image_id")
                .filter(|id| !id.is_empty())
                .map(|id| AzureImage::Id(id.to_string()))
        })
}
