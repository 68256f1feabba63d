use super::{InstanceParser, ProviderError, required_str};
use crate::config::AmiUsernames;
use crate::instance::{Cloud, InstanceRecord, ProviderDetails};
use crate::terraform::StateResource;

pub const RESOURCE_TYPE: &str = "aws_instance";

pub struct AwsParser<'a> {
    ami_usernames: &'a AmiUsernames,
}

impl<'a> AwsParser<'a> {
    pub fn new(ami_usernames: &'a AmiUsernames) -> Self {
        Self { ami_usernames }
    }
}

impl InstanceParser for AwsParser<'_> {
    fn cloud(&self) -> Cloud {
        Cloud::Aws
    }

    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn to_record(
        &self,
        resource: &StateResource,
        _siblings: &[StateResource],
    ) -> Result<InstanceRecord, ProviderError> {
        let ami = required_str(resource, "ami")?;
        let username = self
            .ami_usernames
            .get(&ami)
            .ok_or_else(|| ProviderError::UnknownAmi {
                address: resource.address.clone(),
                ami: ami.clone(),
            })?
            .to_string();

        // Instances without a public address report an empty DNS name.
        let public_dns = resource
            .str_value("public_dns")
            .filter(|dns| !dns.is_empty())
            .map(str::to_string);

        Ok(InstanceRecord {
            cloud: Cloud::Aws,
            address: resource.address.clone(),
            name: resource.name.clone(),
            instance_id: required_str(resource, "id")?,
            public_ip: required_str(resource, "public_ip")?,
            public_dns,
            username,
            details: ProviderDetails::Aws {
                availability_zone: required_str(resource, "availability_zone")?,
                ami,
            },
        })
    }
}
