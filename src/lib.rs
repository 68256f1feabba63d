//! tfctl - Terraform provisioning controller
//!
//! Creates and destroys Terraform-managed virtual machines, normalizes AWS, Azure and
//! Google Cloud state into [`InstanceRecord`]s, and waits for every host to accept SSH.

pub mod config;
pub mod controller;
pub mod error;
pub mod instance;
pub mod providers;
pub mod readiness;
pub mod terraform;

pub use config::{AmiUsernames, ConfigError, ControllerConfig};
pub use controller::ProvisioningController;
pub use error::TfctlError;
pub use instance::{AzureImage, Cloud, InstanceRecord, Instances, ProviderDetails};
pub use providers::{InstanceParser, ProviderError, get_parser, parse_instances};
pub use readiness::{Probe, Readiness, ReadinessReport, ReadinessWaiter, SshProbe};
pub use terraform::{
    CapturedOutput, CommandStatus, RawState, StateError, Step, Terraform, TerraformCli,
};
