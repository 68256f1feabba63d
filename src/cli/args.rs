use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Cloud the workspace provisions into: aws, azure or gcloud
    #[arg(long, env = "TFCTL_CLOUD")]
    pub cloud: String,

    /// Terraform working directory
    #[arg(long, env = "TFCTL_WORKDIR", default_value = ".")]
    pub workdir: PathBuf,

    /// Terraform executable
    #[arg(long = "terraform", env = "TFCTL_TERRAFORM", default_value = "terraform")]
    pub terraform_bin: PathBuf,

    /// JSON file mapping AMI ids to login users (AWS only)
    #[arg(long, env = "TFCTL_AMI_USERS")]
    pub ami_users: Option<PathBuf>,

    /// Show Terraform output and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Init and apply the workspace, then wait for SSH on every instance
    Create(CreateArgs),
    /// Destroy everything in the workspace
    Destroy,
    /// Destroy a single resource by address
    DestroyOne(DestroyOneArgs),
    /// List instances in the current state
    #[command(alias = "list-instances")]
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// Seconds to wait for each host's SSH service
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// Upper bound on probes running at once
    #[arg(long, default_value_t = 64)]
    pub max_concurrent_probes: usize,

    #[arg(long, default_value_t = 22)]
    pub ssh_port: u16,
}

#[derive(clap::Args, Debug)]
pub struct DestroyOneArgs {
    /// Terraform resource address, e.g. aws_instance.web
    pub address: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
