//! Profile loading for the cloudstrap CLI.
//!
//! A profile names the backend to use, the cluster to bootstrap, and
//! optional retry and network backend settings.

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::debug;

use crate::backends::{NetworkBackend, NetworkBackendConfig};
use crate::cloud::FileNetworkApi;
use crate::error::ProvisionError;
use crate::orchestrator::Orchestrator;
use crate::provision::ProvisionConfig;
use crate::registry::BackendRegistry;
use crate::retry::RetryConfig;

/// A bootstrap profile.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Name of the backend to bootstrap with (e.g., "runpod").
    pub backend: String,
    /// The cluster's provisioning configuration.
    pub cluster: ProvisionConfig,
    /// Retry settings for the bootstrap hook.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Enables the network backend.
    #[serde(default)]
    pub network: Option<NetworkBackendConfig>,
    /// Directory containing the profile file; set by [`load_profile`].
    #[serde(skip)]
    pub dir: Utf8PathBuf,
}

impl Profile {
    /// Validates the profile without touching any cloud resource.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::InvalidConfig` if the cluster configuration
    /// is invalid, or `ProvisionError::Config` if the backend is unknown or
    /// the network section is incomplete.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        self.cluster.validate()?;

        if let Some(network) = &self.network
            && network.regions.is_empty()
        {
            return Err(ProvisionError::Config(
                "network.regions must list at least one region".to_string(),
            ));
        }

        if !self.registry().contains(&self.backend) {
            return Err(ProvisionError::Config(format!(
                "backend '{}' is not available{}",
                self.backend,
                if self.backend == "network" {
                    " (add a 'network' section to enable it)"
                } else {
                    ""
                }
            )));
        }
        Ok(())
    }

    /// Builds the backend registry described by the profile.
    pub fn registry(&self) -> BackendRegistry {
        let network = self.network.as_ref().map(|cfg| {
            let api = Arc::new(FileNetworkApi::new(cfg.state_file.clone()));
            NetworkBackend::new(cfg.regions.iter().cloned(), api)
        });
        BackendRegistry::with_builtin(network)
    }

    /// Builds an orchestrator for this profile.
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.registry(), self.retry.clone())
    }
}

/// Parses a profile from YAML, resolving relative paths against `base_dir`.
///
/// # Errors
///
/// Returns `ProvisionError::Config` if the YAML cannot be parsed.
pub fn parse_profile(yaml: &str, base_dir: &Utf8Path) -> Result<Profile, ProvisionError> {
    let mut profile: Profile = serde_yaml::from_str(yaml)
        .map_err(|e| ProvisionError::Config(format!("YAML parse error: {}", e)))?;
    profile.dir = base_dir.to_path_buf();
    if let Some(network) = profile.network.as_mut() {
        network.resolve_paths(base_dir);
    }
    Ok(profile)
}

/// Loads a profile from a YAML file.
///
/// # Errors
///
/// Returns `ProvisionError::Io` if the file cannot be read, or
/// `ProvisionError::Config` if it cannot be parsed.
pub fn load_profile(path: &Utf8Path) -> Result<Profile, ProvisionError> {
    let content = fs::read_to_string(path).map_err(|e| ProvisionError::io(path.as_str(), e))?;
    let base_dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    let profile = parse_profile(&content, &base_dir).map_err(|e| match e {
        ProvisionError::Config(msg) => ProvisionError::Config(format!("{}: {}", path, msg)),
        other => other,
    })?;
    debug!("loaded profile: {}", path);
    Ok(profile)
}
