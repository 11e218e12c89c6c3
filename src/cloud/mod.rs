//! Cloud network API abstraction for cloudstrap.
//!
//! This module provides:
//! - [`Network`] / [`Firewall`]: Cloud resources tagged with a cluster name
//! - [`ResourceKind`]: Kind of resource being ensured, used in errors and logs
//! - [`CloudNetworkApi`]: Trait for the cloud calls a backend makes during bootstrap
//! - [`MemoryNetworkApi`]: In-process implementation
//! - [`FileNetworkApi`]: Implementation persisted to a YAML state file

mod file;
mod memory;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use strum::Display;

pub use file::FileNetworkApi;
pub use memory::MemoryNetworkApi;

/// Kind of cloud resource a backend ensures for a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
    Network,
    Firewall,
}

impl ResourceKind {
    /// Prefix of identifiers allocated for this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Network => "net",
            Self::Firewall => "fw",
        }
    }

    /// Derives the identifier for a resource tagged with `cluster_name`.
    ///
    /// A leading `cluster-` is dropped, so `cluster-9` maps to `net-9`.
    pub fn resource_id(&self, cluster_name: &str) -> String {
        let suffix = cluster_name
            .strip_prefix("cluster-")
            .filter(|s| !s.is_empty())
            .unwrap_or(cluster_name);
        format!("{}-{}", self.id_prefix(), suffix)
    }

    /// Allocates an identifier for `cluster_name` that is not in `taken`.
    ///
    /// The derived id is used when free. Otherwise a numeric suffix is
    /// appended, so `x` and `cluster-x` never share an id.
    pub fn allocate_id(&self, cluster_name: &str, taken: &[&str]) -> String {
        let base = self.resource_id(cluster_name);
        if !taken.contains(&base.as_str()) {
            return base;
        }
        (2u32..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !taken.contains(&candidate.as_str()))
            .unwrap_or(base)
    }
}

/// A region-scoped network tagged with a cluster name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub region: String,
    pub tag: String,
}

/// Firewall rules attached to a cluster's network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firewall {
    pub id: String,
    pub region: String,
    pub tag: String,
    pub network_id: String,
    #[serde(default)]
    pub open_ports: Vec<u16>,
}

/// Trait for the cloud calls made while bootstrapping a cluster.
///
/// Resources are addressed by `(region, tag)` where the tag is the cluster
/// name. `create_*` fails if a resource with the same tag already exists,
/// so callers look up first. Implementations must be `Send + Sync` so one
/// API client can serve concurrent bootstraps of different clusters.
pub trait CloudNetworkApi: Send + Sync {
    /// Finds the network tagged `tag` in `region`.
    fn find_network(&self, region: &str, tag: &str) -> Result<Option<Network>>;

    /// Creates a network tagged `tag` in `region`.
    fn create_network(&self, region: &str, tag: &str) -> Result<Network>;

    /// Finds the firewall tagged `tag` in `region`.
    fn find_firewall(&self, region: &str, tag: &str) -> Result<Option<Firewall>>;

    /// Creates a firewall tagged `tag` on `network_id`, opening `ports`.
    fn create_firewall(
        &self,
        region: &str,
        tag: &str,
        network_id: &str,
        ports: &[u16],
    ) -> Result<Firewall>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_strips_cluster_prefix() {
        assert_eq!(ResourceKind::Network.resource_id("cluster-9"), "net-9");
        assert_eq!(ResourceKind::Firewall.resource_id("cluster-9"), "fw-9");
    }

    #[test]
    fn test_resource_id_keeps_other_names() {
        assert_eq!(ResourceKind::Network.resource_id("training"), "net-training");
        assert_eq!(ResourceKind::Network.resource_id("cluster"), "net-cluster");
    }

    #[test]
    fn test_allocate_id_skips_taken_ids() {
        assert_eq!(ResourceKind::Network.allocate_id("cluster-9", &[]), "net-9");
        assert_eq!(ResourceKind::Network.allocate_id("cluster-9", &["net-9"]), "net-9-2");
        assert_eq!(
            ResourceKind::Firewall.allocate_id("x", &["fw-x", "fw-x-2"]),
            "fw-x-3"
        );
    }

    #[test]
    fn test_resource_kind_display() {
        assert_eq!(ResourceKind::Network.to_string(), "network");
        assert_eq!(ResourceKind::Firewall.to_string(), "firewall");
    }
}
