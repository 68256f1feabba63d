//! Lifecycle orchestration: create, destroy and query one Terraform workspace.

use std::sync::Arc;

use crate::config::ControllerConfig;
use crate::error::TfctlError;
use crate::instance::{Cloud, Instances};
use crate::providers;
use crate::readiness::{Probe, ReadinessReport, ReadinessWaiter};
use crate::terraform::{Step, Terraform, read_state};

pub struct ProvisioningController {
    config: ControllerConfig,
    terraform: Arc<dyn Terraform>,
    waiter: ReadinessWaiter,
}

impl ProvisioningController {
    pub fn new(
        config: ControllerConfig,
        terraform: Arc<dyn Terraform>,
        probe: Arc<dyn Probe>,
    ) -> Self {
        let waiter = ReadinessWaiter::new(probe).with_max_concurrent(config.max_concurrent_probes);
        Self {
            config,
            terraform,
            waiter,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// `init`, then `apply`, then waits until every instance accepts SSH.
    ///
    /// Nothing is rolled back when `apply` fails; call [`destroy_infra`](Self::destroy_infra).
    /// Instances that never become reachable are reported as
    /// [`TfctlError::Unreachable`] once all probes have finished; the error
    /// carries the full per-instance report.
    pub async fn create_infra(&self) -> Result<ReadinessReport, TfctlError> {
        let cloud = self.cloud()?;
        tracing::info!(%cloud, "creating infrastructure");

        self.run_step(Step::Init, args(&["init", "-input=false"])).await?;
        self.run_step(Step::Apply, args(&["apply", "-auto-approve", "-input=false"]))
            .await?;

        let instances = self.get_instances().await?;
        let report = self
            .waiter
            .wait_all(&instances, self.config.readiness_timeout)
            .await;

        if !report.all_reachable() {
            return Err(TfctlError::Unreachable { report });
        }

        tracing::info!(count = report.len(), "all instances reachable");
        Ok(report)
    }

    pub async fn destroy_infra(&self) -> Result<(), TfctlError> {
        tracing::info!("destroying infrastructure");
        self.run_step(
            Step::Destroy,
            args(&["destroy", "-auto-approve", "-input=false"]),
        )
        .await
    }

    /// Destroys only the resource at `address`.
    pub async fn destroy_resource(&self, address: &str) -> Result<(), TfctlError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(TfctlError::Config(
                "resource address must not be empty".to_string(),
            ));
        }

        tracing::info!(address, "destroying resource");
        let mut destroy = args(&["destroy", "-auto-approve", "-input=false"]);
        destroy.push(format!("-target={address}"));
        self.run_step(Step::DestroyOne, destroy).await
    }

    /// Current instances, read fresh from Terraform state on every call.
    pub async fn get_instances(&self) -> Result<Instances, TfctlError> {
        let cloud = self.cloud()?;
        let state = read_state(self.terraform.as_ref()).await?;
        let parser = providers::get_parser(cloud, &self.config.ami_usernames);
        Ok(parser.parse(&state)?)
    }

    fn cloud(&self) -> Result<Cloud, TfctlError> {
        Ok(self.config.cloud.parse::<Cloud>()?)
    }

    async fn run_step(&self, step: Step, args: Vec<String>) -> Result<(), TfctlError> {
        tracing::debug!(%step, "terraform {}", args.join(" "));
        let status = self.terraform.run(&args).await?;

        if !status.success() {
            tracing::error!(%step, code = ?status.code, "terraform step failed");
            return Err(TfctlError::Provisioning {
                step,
                code: status.code,
            });
        }
        Ok(())
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
