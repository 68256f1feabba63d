#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tfctl::terraform::read_state;
use tfctl::{ControllerConfig, Probe, ProvisioningController, Step, Terraform, TerraformCli, TfctlError};

const FAKE_TERRAFORM: &str = r#"#!/bin/sh
echo "$@" >> calls.log
case "$1" in
  init) echo "TF_IN_AUTOMATION=$TF_IN_AUTOMATION" > env.log ;;
  show) cat state.json ;;
  apply) echo "Error: quota exceeded" >&2; exit 3 ;;
esac
exit 0
"#;

const STATE: &str = r#"{
  "format_version": "1.0",
  "values": {"root_module": {"resources": [{
    "address": "google_compute_instance.node",
    "mode": "managed",
    "type": "google_compute_instance",
    "name": "node",
    "values": {
      "id": "projects/p/zones/z/instances/node",
      "zone": "europe-west1-b",
      "metadata": {"username": "tester", "image": "debian-12"},
      "network_interface": [{"access_config": [{"nat_ip": "34.1.1.1"}]}]
    }
  }]}}
}"#;

struct NeverProbed;

#[async_trait]
impl Probe for NeverProbed {
    async fn probe(&self, host: &str, _timeout: Duration) -> bool {
        panic!("unexpected probe of {host}");
    }
}

fn install_fake_terraform(dir: &Path) -> std::path::PathBuf {
    let binary = dir.join("terraform");
    fs::write(&binary, FAKE_TERRAFORM).unwrap();
    fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();
    fs::write(dir.join("state.json"), STATE).unwrap();
    binary
}

// Single test: spawning a freshly written script from parallel tests can hit ETXTBSY.
#[tokio::test]
async fn test_terraform_cli_against_fake_binary() {
    let workspace = tempfile::tempdir().unwrap();
    let binary = install_fake_terraform(workspace.path());
    let cli = TerraformCli::new(workspace.path()).with_binary(&binary);

    let status = cli.run(&["init".to_string(), "-input=false".to_string()]).await.unwrap();
    assert!(status.success());
    let env = fs::read_to_string(workspace.path().join("env.log")).unwrap();
    assert_eq!(env.trim(), "TF_IN_AUTOMATION=1");

    let status = cli.run(&["apply".to_string()]).await.unwrap();
    assert_eq!(status.code, Some(3));

    let state = read_state(&cli).await.unwrap();
    assert_eq!(state.resources().len(), 1);

    let controller = ProvisioningController::new(
        ControllerConfig::new("gcloud"),
        Arc::new(TerraformCli::new(workspace.path()).with_binary(&binary)),
        Arc::new(NeverProbed),
    );

    let instances = controller.get_instances().await.unwrap();
    assert_eq!(instances["google_compute_instance.node"].public_ip, "34.1.1.1");

    let err = controller.create_infra().await.unwrap_err();
    assert!(matches!(
        err,
        TfctlError::Provisioning {
            step: Step::Apply,
            code: Some(3)
        }
    ));

    let calls = fs::read_to_string(workspace.path().join("calls.log")).unwrap();
    let calls: Vec<&str> = calls.lines().collect();
    assert_eq!(
        calls,
        vec![
            "init -input=false",
            "apply",
            "show -json",
            "show -json",
            "init -input=false",
            "apply -auto-approve -input=false",
        ]
    );

    // Verbose only changes where terraform's stdout goes.
    let verbose = TerraformCli::new(workspace.path())
        .with_binary(&binary)
        .verbose(true);

    let status = verbose.run(&["init".to_string()]).await.unwrap();
    assert!(status.success());

    let status = verbose.run(&["apply".to_string()]).await.unwrap();
    assert!(!status.success());
    assert_eq!(status.code, Some(3));

    let calls = fs::read_to_string(workspace.path().join("calls.log")).unwrap();
    let calls: Vec<&str> = calls.lines().collect();
    assert_eq!(calls.len(), 8);
    assert_eq!(&calls[6..], ["init", "apply"]);
}
