mod cli;
mod output;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use tfctl::{
    AmiUsernames, ControllerConfig, ProvisioningController, SshProbe, TerraformCli, TfctlError,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let default_level = if cli.verbose { "tfctl=debug" } else { "tfctl=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let terraform = TerraformCli::new(&cli.workdir)
        .with_binary(&cli.terraform_bin)
        .verbose(cli.verbose);

    let mut config = ControllerConfig::new(cli.cloud.clone());
    let mut probe = SshProbe::new();

    if let Command::Create(args) = &cli.command {
        config = config
            .with_readiness_timeout(Duration::from_secs(args.timeout))
            .with_max_concurrent_probes(args.max_concurrent_probes);
        probe = probe.with_port(args.ssh_port);
    }

    // Only instance parsing needs the AMI table.
    if matches!(cli.command, Command::Create(_) | Command::List(_)) {
        let ami_usernames = AmiUsernames::load_or_default(cli.ami_users.as_deref())
            .map_err(TfctlError::from)?;
        tracing::debug!(entries = ami_usernames.len(), "AMI username table loaded");
        config = config.with_ami_usernames(ami_usernames);
    }

    let controller = ProvisioningController::new(config, Arc::new(terraform), Arc::new(probe));

    match cli.command {
        Command::Create(_) => match controller.create_infra().await {
            Ok(report) => println!("{}", output::readiness_tree(&report)),
            Err(err) => {
                if let TfctlError::Unreachable { report } = &err {
                    println!("{}", output::readiness_tree(report));
                }
                return Err(err.into());
            }
        },
        Command::Destroy => {
            controller.destroy_infra().await?;
            tracing::info!("infrastructure destroyed");
        }
        Command::DestroyOne(args) => {
            controller.destroy_resource(&args.address).await?;
            tracing::info!(address = %args.address, "resource destroyed");
        }
        Command::List(args) => {
            let instances = controller.get_instances().await?;
            tracing::info!(count = instances.len(), "instances listed");
            if args.json {
                println!("{}", output::instances_json(&instances)?);
            } else {
                println!("{}", output::instances_table(&instances));
            }
        }
    }

    Ok(())
}
