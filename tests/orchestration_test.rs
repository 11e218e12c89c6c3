mod helpers;

use camino::Utf8PathBuf;
use cloudstrap::backends::{FIREWALL_ID_KEY, NETWORK_ID_KEY};
use cloudstrap::{ProvisionConfig, ProvisionError, cli, run_backends, run_bootstrap, run_validate};
use tempfile::tempdir;

const NETWORK_PROFILE: &str = r#"---
backend: network
cluster:
  cluster_name: cluster-9
  region: us-east
  ports_to_open_on_launch: [22]
retry:
  max_attempts: 1
network:
  regions: [us-east]
  state_file: state/networks.yml
"#;

fn common(file: Utf8PathBuf) -> cli::CommonArgs {
    cli::CommonArgs {
        file,
        log_level: cli::LogLevel::Error,
    }
}

#[test]
fn run_bootstrap_writes_bootstrapped_config() {
    let dir = tempdir().unwrap();
    let root = helpers::utf8_dir(&dir);
    let profile = helpers::write_profile(&root, NETWORK_PROFILE);
    let output = root.join("bootstrapped.yml");

    let opts = cli::BootstrapArgs {
        common: common(profile),
        output: Some(output.clone()),
    };
    let result = run_bootstrap(&opts).expect("run_bootstrap should succeed");

    assert_eq!(result.provider_str(NETWORK_ID_KEY), Some("net-9"));
    assert_eq!(result.provider_str(FIREWALL_ID_KEY), Some("fw-9"));
    assert!(root.join("state/networks.yml").exists());

    let written: ProvisionConfig =
        serde_yaml::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written, result);
}

#[test]
fn run_bootstrap_twice_reuses_state() {
    let dir = tempdir().unwrap();
    let root = helpers::utf8_dir(&dir);
    let profile = helpers::write_profile(&root, NETWORK_PROFILE);
    let opts = cli::BootstrapArgs {
        common: common(profile),
        output: Some(root.join("out.yml")),
    };

    let first = run_bootstrap(&opts).unwrap();
    let second = run_bootstrap(&opts).unwrap();

    assert_eq!(first, second);
    let state = std::fs::read_to_string(root.join("state/networks.yml")).unwrap();
    assert_eq!(state.matches("tag: cluster-9").count(), 2, "one network and one firewall");
}

#[test]
fn run_bootstrap_surfaces_backend_errors() {
    let dir = tempdir().unwrap();
    let root = helpers::utf8_dir(&dir);
    let profile = helpers::write_profile(
        &root,
        &NETWORK_PROFILE.replace("region: us-east", "region: eu-central"),
    );
    let opts = cli::BootstrapArgs {
        common: common(profile),
        output: Some(root.join("out.yml")),
    };

    let err = run_bootstrap(&opts).unwrap_err();

    let provision_err = err.downcast_ref::<ProvisionError>().expect("typed error in chain");
    assert!(matches!(provision_err.root(), ProvisionError::UnsupportedOperation(_)));
    let message = format!("{:#}", err);
    assert!(message.contains("backend 'network'"));
    assert!(message.contains("cluster-9"));
    assert!(!root.join("out.yml").exists());
}

#[test]
fn run_validate_succeeds_on_demo_profile() {
    let opts = cli::ValidateArgs {
        common: common("demos/runpod.yml".into()),
    };
    run_validate(&opts).expect("run_validate should succeed for demo profile");
}

#[test]
fn run_validate_fails_on_invalid_cluster_name() {
    let dir = tempdir().unwrap();
    let profile = helpers::write_profile(
        &helpers::utf8_dir(&dir),
        "backend: runpod\ncluster:\n  cluster_name: 9-lives\n",
    );
    let opts = cli::ValidateArgs {
        common: common(profile),
    };

    let err = run_validate(&opts).unwrap_err();

    assert!(format!("{:#}", err).contains("profile validation failed"));
}

#[test]
fn run_backends_lists_profile_backends() {
    let opts = cli::BackendsArgs {
        common: common("demos/network.yml".into()),
    };
    assert_eq!(run_backends(&opts).unwrap(), vec!["network", "runpod"]);

    let opts = cli::BackendsArgs {
        common: common("demos/runpod.yml".into()),
    };
    assert_eq!(run_backends(&opts).unwrap(), vec!["runpod"]);
}

#[test]
fn cli_bootstrap_prints_yaml_to_stdout() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_cloudstrap"))
        .args(["bootstrap", "--file", "demos/runpod.yml", "--log-level", "error"])
        .output()
        .unwrap();

    assert!(output.status.success(), "bootstrap command failed");
    let printed: ProvisionConfig = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(printed.cluster_name, "cluster-7");
    assert_eq!(printed.count, 2);
}
