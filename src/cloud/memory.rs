//! In-process cloud network API.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use super::{CloudNetworkApi, Firewall, Network, ResourceKind};

/// Resources known to a cloud account.
///
/// Shared by the in-memory and file-backed implementations.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct ResourceState {
    #[serde(default)]
    pub(super) networks: Vec<Network>,
    #[serde(default)]
    pub(super) firewalls: Vec<Firewall>,
}

impl ResourceState {
    pub(super) fn find_network(&self, region: &str, tag: &str) -> Option<Network> {
        self.networks.iter().find(|n| n.region == region && n.tag == tag).cloned()
    }

    pub(super) fn find_firewall(&self, region: &str, tag: &str) -> Option<Firewall> {
        self.firewalls.iter().find(|f| f.region == region && f.tag == tag).cloned()
    }

    pub(super) fn insert_network(&mut self, region: &str, tag: &str) -> Result<Network> {
        if self.find_network(region, tag).is_some() {
            bail!("network tagged '{}' already exists in region '{}'", tag, region);
        }
        let taken: Vec<&str> = self.networks.iter().map(|n| n.id.as_str()).collect();
        let network = Network {
            id: ResourceKind::Network.allocate_id(tag, &taken),
            region: region.to_string(),
            tag: tag.to_string(),
        };
        self.networks.push(network.clone());
        Ok(network)
    }

    pub(super) fn insert_firewall(
        &mut self,
        region: &str,
        tag: &str,
        network_id: &str,
        ports: &[u16],
    ) -> Result<Firewall> {
        if self.find_firewall(region, tag).is_some() {
            bail!("firewall tagged '{}' already exists in region '{}'", tag, region);
        }
        if !self.networks.iter().any(|n| n.region == region && n.id == network_id) {
            bail!("network '{}' does not exist in region '{}'", network_id, region);
        }
        let taken: Vec<&str> = self.firewalls.iter().map(|f| f.id.as_str()).collect();
        let firewall = Firewall {
            id: ResourceKind::Firewall.allocate_id(tag, &taken),
            region: region.to_string(),
            tag: tag.to_string(),
            network_id: network_id.to_string(),
            open_ports: ports.to_vec(),
        };
        self.firewalls.push(firewall.clone());
        Ok(firewall)
    }
}

/// Cloud network API that keeps resources in memory.
///
/// Useful as a stand-in account for tests and dry runs. Resources live as
/// long as the value does.
#[derive(Debug, Default)]
pub struct MemoryNetworkApi {
    state: Mutex<ResourceState>,
}

impl MemoryNetworkApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ResourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns every network created so far.
    pub fn networks(&self) -> Vec<Network> {
        self.state().networks.clone()
    }

    /// Returns every firewall created so far.
    pub fn firewalls(&self) -> Vec<Firewall> {
        self.state().firewalls.clone()
    }
}

impl CloudNetworkApi for MemoryNetworkApi {
    fn find_network(&self, region: &str, tag: &str) -> Result<Option<Network>> {
        Ok(self.state().find_network(region, tag))
    }

    fn create_network(&self, region: &str, tag: &str) -> Result<Network> {
        self.state().insert_network(region, tag)
    }

    fn find_firewall(&self, region: &str, tag: &str) -> Result<Option<Firewall>> {
        Ok(self.state().find_firewall(region, tag))
    }

    fn create_firewall(
        &self,
        region: &str,
        tag: &str,
        network_id: &str,
        ports: &[u16],
    ) -> Result<Firewall> {
        self.state().insert_firewall(region, tag, network_id, ports)
    }
}
