//! Terraform CLI invocation.
//!
//! The [`Terraform`] trait is the seam between the controller and the external
//! binary; [`TerraformCli`] runs it as a subprocess inside one working directory.

mod state;

pub use state::{RawState, StateError, StateResource, read_state};

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

/// Lifecycle step that invoked Terraform, used to name failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Init,
    Apply,
    Destroy,
    DestroyOne,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Init => "init",
            Step::Apply => "apply",
            Step::Destroy => "destroy",
            Step::DestroyOne => "destroy-one",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait Terraform: Send + Sync {
    /// Runs a command to completion. Output goes wherever the implementation routes it.
    async fn run(&self, args: &[String]) -> std::io::Result<CommandStatus>;

    /// Runs a command and captures stdout and stderr.
    async fn capture(&self, args: &[String]) -> std::io::Result<CapturedOutput>;
}

pub struct TerraformCli {
    binary: PathBuf,
    workdir: PathBuf,
    verbose: bool,
}

impl TerraformCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            binary: PathBuf::from("terraform"),
            workdir: workdir.into(),
            verbose: false,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// When verbose, Terraform's stdout is passed through instead of discarded.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd.current_dir(&self.workdir);
        cmd.env("TF_IN_AUTOMATION", "1");
        cmd.stdin(Stdio::null());

        tracing::debug!(
            workdir = %self.workdir.display(),
            "Running: {} {}",
            self.binary.display(),
            args.join(" ")
        );

        cmd
    }
}

#[async_trait]
impl Terraform for TerraformCli {
    async fn run(&self, args: &[String]) -> std::io::Result<CommandStatus> {
        let mut cmd = self.command(args);
        if self.verbose {
            cmd.stdout(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::null());
        }
        cmd.stderr(Stdio::inherit());

        let status = cmd.status().await?;
        Ok(CommandStatus {
            code: status.code(),
        })
    }

    async fn capture(&self, args: &[String]) -> std::io::Result<CapturedOutput> {
        let mut cmd = self.command(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().await?;
        Ok(CapturedOutput {
            status: CommandStatus {
                code: output.status.code(),
            },
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

impl fmt::Debug for TerraformCli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerraformCli")
            .field("binary", &self.binary)
            .field("workdir", &self.workdir)
            .field("verbose", &self.verbose)
            .finish()
    }
}
