use super::{InstanceParser, ProviderError, required_pointer, required_str};
use crate::instance::{Cloud, InstanceRecord, ProviderDetails};
use crate::terraform::StateResource;

pub const RESOURCE_TYPE: &str = "google_compute_instance";

const NAT_IP: &str = "/network_interface/0/access_config/0/nat_ip";

pub struct GcloudParser;

impl InstanceParser for GcloudParser {
    fn cloud(&self) -> Cloud {
        Cloud::Gcloud
    }

    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn to_record(
        &self,
        resource: &StateResource,
        _siblings: &[StateResource],
    ) -> Result<InstanceRecord, ProviderError> {
        // GCE has no public DNS name; the NAT address doubles as the hostname.
        let public_ip = required_pointer(resource, NAT_IP)?;

        Ok(InstanceRecord {
            cloud: Cloud::Gcloud,
            address: resource.address.clone(),
            name: resource.name.clone(),
            instance_id: required_str(resource, "id")?,
            public_dns: Some(public_ip.clone()),
            public_ip,
            username: required_pointer(resource, "/metadata/username")?,
            details: ProviderDetails::Gcloud {
                zone: required_str(resource, "zone")?,
                image: required_pointer(resource, "/metadata/image")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terraform::RawState;

    fn state(resources: serde_json::Value) -> RawState {
        serde_json::from_value(serde_json::json!({
            "values": {"root_module": {"resources": resources}}
        }))
        .unwrap()
    }

    fn instance(name: &str) -> serde_json::Value {
        serde_json::json!({
            "address": format!("google_compute_instance.{name}"),
            "mode": "managed",
            "type": "google_compute_instance",
            "name": name,
            "values": {
                "id": format!("projects/demo/zones/europe-west1-b/instances/{name}"),
                "zone": "europe-west1-b",
                "metadata": {"username": "tester", "image": "debian-cloud/debian-12"},
                "network_interface": [{
                    "network": "default",
                    "access_config": [{"nat_ip": "34.77.1.2", "network_tier": "PREMIUM"}]
                }]
            }
        })
    }

    #[test]
    fn test_public_ip_from_nested_access_config() {
        let instances = GcloudParser
            .parse(&state(serde_json::json!([instance("node")])))
            .unwrap();

        let node = &instances["google_compute_instance.node"];
        assert_eq!(node.cloud, Cloud::Gcloud);
        assert_eq!(node.public_ip, "34.77.1.2");
        assert_eq!(node.public_dns.as_deref(), Some("34.77.1.2"));
        assert_eq!(node.username, "tester");
        assert_eq!(
            node.details,
            ProviderDetails::Gcloud {
                zone: "europe-west1-b".to_string(),
                image: "debian-cloud/debian-12".to_string(),
            }
        );
    }

    #[test]
    fn test_instance_without_access_config_is_error() {
        let mut private = instance("node");
        private["values"]["network_interface"][0]["access_config"] = serde_json::json!([]);

        let result = GcloudParser.parse(&state(serde_json::json!([private])));
        match result {
            Err(ProviderError::MissingAttribute { address, attribute }) => {
                assert_eq!(address, "google_compute_instance.node");
                assert_eq!(attribute, "network_interface/0/access_config/0/nat_ip");
            }
            other => panic!("expected MissingAttribute error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_metadata_username_is_error() {
        let mut vm = instance("node");
        vm["values"]["metadata"] = serde_json::json!({"image": "debian-12"});

        let result = GcloudParser.parse(&state(serde_json::json!([vm])));
        assert!(matches!(
            result,
            Err(ProviderError::MissingAttribute { ref attribute, .. }) if attribute == "metadata/username"
        ));
    }
}
