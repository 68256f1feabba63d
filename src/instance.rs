use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::providers::ProviderError;

/// Instances keyed by their Terraform resource address.
pub type Instances = BTreeMap<String, InstanceRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cloud {
    Aws,
    Azure,
    Gcloud,
}

impl Cloud {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cloud::Aws => "aws",
            Cloud::Azure => "azure",
            Cloud::Gcloud => "gcloud",
        }
    }

    pub fn all() -> [Cloud; 3] {
        [Cloud::Aws, Cloud::Azure, Cloud::Gcloud]
    }
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cloud {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(Cloud::Aws),
            "azure" => Ok(Cloud::Azure),
            "gcloud" => Ok(Cloud::Gcloud),
            _ => Err(ProviderError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// A provisioned virtual machine, normalized across providers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InstanceRecord {
    pub cloud: Cloud,
    pub address: String,
    pub name: String,
    pub instance_id: String,
    pub public_ip: String,
    /// Absent when the provider exposes no DNS name for the instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_dns: Option<String>,
    pub username: String,
    pub details: ProviderDetails,
}

impl InstanceRecord {
    /// Host used for the readiness probe. Falls back to the IP when there is no DNS name.
    pub fn probe_host(&self) -> &str {
        self.public_dns.as_deref().unwrap_or(&self.public_ip)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProviderDetails {
    Aws {
        availability_zone: String,
        ami: String,
    },
    Azure {
        location: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        image: Option<AzureImage>,
    },
    Gcloud {
        zone: String,
        image: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AzureImage {
    /// The `source_image_reference` block (publisher, offer, sku, version).
    Reference(serde_json::Value),
    /// A `source_image_id` pointing at a custom or gallery image.
    Id(String),
}
