//! Network backend implementation.
//!
//! Ensures every cluster has a region-scoped network and a firewall tagged
//! with its name before instances are requested, and records their ids in
//! `provider_config`.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::{debug, info};

use super::{FIREWALL_ID_KEY, NETWORK_ID_KEY, ProvisionBackend};
use crate::cloud::{CloudNetworkApi, Firewall, Network, ResourceKind};
use crate::error::ProvisionError;
use crate::provision::ProvisionConfig;

/// Network backend section of a profile.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NetworkBackendConfig {
    /// Regions the backend can create resources in.
    pub regions: Vec<String>,
    /// YAML file recording created resources. Relative paths are resolved
    /// against the profile's directory.
    #[serde(default = "default_state_file")]
    pub state_file: Utf8PathBuf,
}

fn default_state_file() -> Utf8PathBuf {
    Utf8PathBuf::from(".cloudstrap/networks.yml")
}

impl NetworkBackendConfig {
    /// Resolves a relative `state_file` against `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Utf8Path) {
        if self.state_file.is_relative() {
            self.state_file = base_dir.join(&self.state_file);
        }
    }
}

/// Backend that creates per-cluster networks and firewalls.
pub struct NetworkBackend {
    regions: Vec<String>,
    api: Arc<dyn CloudNetworkApi>,
}

impl NetworkBackend {
    /// Creates a backend serving `regions` through `api`.
    pub fn new<I, S>(regions: I, api: Arc<dyn CloudNetworkApi>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
            api,
        }
    }

    /// Returns the regions this backend can serve.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    fn check_request(
        &self,
        region: &str,
        cluster_name: &str,
        config: &ProvisionConfig,
    ) -> Result<(), ProvisionError> {
        if cluster_name.is_empty() {
            return Err(ProvisionError::InvalidConfig(
                "cluster_name is required by the network backend".to_string(),
            ));
        }
        if cluster_name != config.cluster_name {
            return Err(ProvisionError::InvalidConfig(format!(
                "cluster_name '{}' does not match config cluster_name '{}'",
                cluster_name, config.cluster_name
            )));
        }
        if region.is_empty() {
            return Err(ProvisionError::InvalidConfig(format!(
                "region is required by the network backend (cluster '{}')",
                cluster_name
            )));
        }
        if !self.regions.iter().any(|r| r == region) {
            return Err(ProvisionError::UnsupportedOperation(format!(
                "network backend does not serve region '{}' (available: {})",
                region,
                self.regions.join(", ")
            )));
        }
        Ok(())
    }

    fn ensure_network(&self, region: &str, cluster_name: &str) -> Result<Network, ProvisionError> {
        let setup_err = |e: anyhow::Error| {
            ProvisionError::resource_setup(ResourceKind::Network, cluster_name, &e)
        };

        if let Some(network) = self.api.find_network(region, cluster_name).map_err(setup_err)? {
            debug!(network_id = %network.id, "found existing network");
            return Ok(network);
        }
        let network = self.api.create_network(region, cluster_name).map_err(setup_err)?;
        info!(network_id = %network.id, "created network");
        Ok(network)
    }

    fn ensure_firewall(
        &self,
        region: &str,
        cluster_name: &str,
        network: &Network,
        ports: &[u16],
    ) -> Result<Firewall, ProvisionError> {
        let setup_err = |e: anyhow::Error| {
            ProvisionError::resource_setup(ResourceKind::Firewall, cluster_name, &e)
        };

        if let Some(firewall) = self.api.find_firewall(region, cluster_name).map_err(setup_err)? {
            debug!(firewall_id = %firewall.id, "found existing firewall");
            return Ok(firewall);
        }
        let firewall = self
            .api
            .create_firewall(region, cluster_name, &network.id, ports)
            .map_err(setup_err)?;
        info!(firewall_id = %firewall.id, ports = ?ports, "created firewall");
        Ok(firewall)
    }
}

impl ProvisionBackend for NetworkBackend {
    fn name(&self) -> &str {
        "network"
    }

    #[tracing::instrument(skip(self, config))]
    fn bootstrap_instances(
        &self,
        region: &str,
        cluster_name: &str,
        config: &ProvisionConfig,
    ) -> Result<ProvisionConfig, ProvisionError> {
        self.check_request(region, cluster_name, config)?;

        let network = self.ensure_network(region, cluster_name)?;
        let firewall =
            self.ensure_firewall(region, cluster_name, &network, &config.ports_to_open_on_launch)?;

        // Write only once every resource exists.
        let mut result = config.clone();
        result.provider_config.insert(NETWORK_ID_KEY.to_string(), network.id.into());
        result.provider_config.insert(FIREWALL_ID_KEY.to_string(), firewall.id.into());
        Ok(result)
    }
}
