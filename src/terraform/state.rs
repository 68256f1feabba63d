//! Decoding of `terraform show -json` output.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::Terraform;
use crate::error::describe_exit;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("could not run terraform show: {0}")]
    Io(#[from] std::io::Error),

    #[error("terraform show failed ({}): {}", describe_exit(*code), stderr.trim())]
    Show { code: Option<i32>, stderr: String },

    #[error("malformed state document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The state document as printed by `terraform show -json`.
///
/// An empty workspace prints no `values` key at all; that decodes to zero resources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawState {
    #[serde(default)]
    values: Option<StateValues>,
}

#[derive(Debug, Clone, Deserialize)]
struct StateValues {
    root_module: Module,
}

#[derive(Debug, Clone, Deserialize)]
struct Module {
    #[serde(default)]
    resources: Vec<StateResource>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateResource {
    pub address: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub values: Map<String, Value>,
}

fn default_mode() -> String {
    "managed".to_string()
}

impl RawState {
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn resources(&self) -> &[StateResource] {
        self.values
            .as_ref()
            .map(|v| v.root_module.resources.as_slice())
            .unwrap_or(&[])
    }

    /// Managed resources of one type, in state order. Data sources are skipped.
    pub fn managed_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a StateResource> + 'a {
        self.resources()
            .iter()
            .filter(move |r| r.is_managed() && r.resource_type == resource_type)
    }
}

impl StateResource {
    pub fn is_managed(&self) -> bool {
        self.mode == "managed"
    }

    /// String attribute, `None` when missing, null or not a string.
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Attribute looked up by JSON pointer relative to `values`,
    /// e.g. `/network_interface/0/access_config/0/nat_ip`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let (head, rest) = match pointer.trim_start_matches('/').split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (pointer.trim_start_matches('/'), None),
        };
        let value = self.values.get(head)?;
        match rest {
            Some(rest) => value.pointer(&format!("/{rest}")),
            None => Some(value),
        }
    }
}

/// Reads the current workspace state through `terraform show -json`.
pub async fn read_state(terraform: &dyn Terraform) -> Result<RawState, StateError> {
    let args = ["show".to_string(), "-json".to_string()];
    let output = terraform.capture(&args).await?;

    if !output.status.success() {
        return Err(StateError::Show {
            code: output.status.code,
            stderr: output.stderr,
        });
    }

    let state = RawState::from_json(&output.stdout)?;
    tracing::debug!(resources = state.resources().len(), "terraform state decoded");
    Ok(state)
}
