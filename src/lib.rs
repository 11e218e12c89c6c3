pub mod backends;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod provision;
pub mod registry;
pub mod retry;

pub use error::ProvisionError;
pub use provision::ProvisionConfig;

use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    // stdout carries the bootstrapped config
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .context("failed to set global default tracing subscriber")
}

/// Loads and validates the profile at `file`.
fn load_valid_profile(file: &camino::Utf8Path) -> Result<config::Profile> {
    let profile = config::load_profile(file)
        .with_context(|| format!("failed to load profile from {}", file))?;
    profile.validate().context("profile validation failed")?;
    Ok(profile)
}

/// Runs the bootstrap phase and returns the bootstrapped configuration.
pub fn run_bootstrap(opts: &cli::BootstrapArgs) -> Result<ProvisionConfig> {
    let profile = load_valid_profile(&opts.common.file)?;
    let orchestrator = profile.orchestrator();

    let bootstrapped = orchestrator
        .bootstrap(&profile.backend, &profile.cluster)
        .with_context(|| {
            format!(
                "failed to bootstrap cluster '{}' with backend '{}'",
                profile.cluster.cluster_name, profile.backend
            )
        })?;

    let yaml = serde_yaml::to_string(&bootstrapped)
        .context("failed to serialize bootstrapped configuration")?;
    match &opts.output {
        Some(path) => {
            fs::write(path, &yaml).with_context(|| format!("failed to write {}", path))?;
            info!("wrote bootstrapped configuration to {}", path);
        }
        None => std::io::stdout()
            .write_all(yaml.as_bytes())
            .context("failed to write bootstrapped configuration")?,
    }

    Ok(bootstrapped)
}

pub fn run_validate(opts: &cli::ValidateArgs) -> Result<()> {
    let profile = load_valid_profile(&opts.common.file)?;
    info!("validation successful:\n{:#?}", profile);
    Ok(())
}

/// Returns the names of the backends the profile makes available.
pub fn run_backends(opts: &cli::BackendsArgs) -> Result<Vec<String>> {
    let profile = config::load_profile(&opts.common.file)
        .with_context(|| format!("failed to load profile from {}", opts.common.file))?;
    Ok(profile.registry().names().map(str::to_string).collect())
}
