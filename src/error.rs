use thiserror::Error;

use crate::readiness::ReadinessReport;
use crate::terraform::Step;

#[derive(Debug, Error)]
pub enum TfctlError {
    #[error("terraform {step} failed ({})", describe_exit(*code))]
    Provisioning { step: Step, code: Option<i32> },

    #[error(transparent)]
    Provider(#[from] crate::providers::ProviderError),

    #[error("failed to read terraform state: {0}")]
    StateRead(#[from] crate::terraform::StateError),

    #[error(
        "{} instance(s) never became reachable: {}",
        report.unreachable().len(),
        report.unreachable().join(", ")
    )]
    Unreachable { report: ReadinessReport },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<crate::config::ConfigError> for TfctlError {
    fn from(err: crate::config::ConfigError) -> Self {
        TfctlError::Config(err.to_string())
    }
}

pub(crate) fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}
