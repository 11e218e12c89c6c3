//! Provider-agnostic provisioning configuration.
//!
//! [`ProvisionConfig`] is the unit of work passed through a backend's
//! bootstrap hook. The orchestrator builds one per provisioning attempt,
//! hands it to exactly one backend, and passes the result on to instance
//! creation.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;

/// Backend-specific values keyed by name (network ids, image references, ...).
pub type ProviderConfig = BTreeMap<String, serde_yaml::Value>;

/// Cluster names start with a letter and end with a letter or digit.
static CLUSTER_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]([-_.a-zA-Z0-9]*[a-zA-Z0-9])?$").expect("cluster name regex is valid")
});

fn default_count() -> u32 {
    1
}

/// Desired cluster state for one provisioning call.
///
/// `region` and `cluster_name` are identity fields: backends read them but
/// never change them. `provider_config` is the payload backends populate.
/// The remaining fields belong to later phases and pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Target region. Empty for backends without a region concept.
    #[serde(default)]
    pub region: String,
    /// Stable per-cluster tag used to locate cloud resources.
    pub cluster_name: String,
    /// Backend-specific values filled in by the bootstrap hook.
    #[serde(default)]
    pub provider_config: ProviderConfig,
    #[serde(default)]
    pub authentication_config: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub docker_config: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub node_config: BTreeMap<String, serde_yaml::Value>,
    /// Number of instances to launch.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Tags applied to every launched instance.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Restart stopped instances instead of launching new ones.
    #[serde(default)]
    pub resume_stopped_nodes: bool,
    /// Ports opened on the cluster's firewall at launch.
    #[serde(default)]
    pub ports_to_open_on_launch: Vec<u16>,
}

impl ProvisionConfig {
    /// Creates a config for `cluster_name` in `region` with every other
    /// field at its default.
    pub fn new(region: impl Into<String>, cluster_name: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            cluster_name: cluster_name.into(),
            provider_config: ProviderConfig::new(),
            authentication_config: BTreeMap::new(),
            docker_config: BTreeMap::new(),
            node_config: BTreeMap::new(),
            count: default_count(),
            tags: BTreeMap::new(),
            resume_stopped_nodes: false,
            ports_to_open_on_launch: Vec::new(),
        }
    }

    /// Sets a `provider_config` entry.
    #[must_use]
    pub fn with_provider_value(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_yaml::Value>,
    ) -> Self {
        self.provider_config.insert(key.into(), value.into());
        self
    }

    /// Returns a `provider_config` entry as a string, if present.
    pub fn provider_str(&self, key: &str) -> Option<&str> {
        self.provider_config.get(key).and_then(serde_yaml::Value::as_str)
    }

    /// Checks the invariants every backend may rely on.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::InvalidConfig` if `cluster_name` is empty or
    /// malformed, or if `count` is zero.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        validate_cluster_name(&self.cluster_name)?;
        if self.count == 0 {
            return Err(ProvisionError::InvalidConfig(format!(
                "count must be at least 1 for cluster '{}'",
                self.cluster_name
            )));
        }
        Ok(())
    }
}

/// Validates a cluster name against the naming rule.
///
/// # Errors
///
/// Returns `ProvisionError::InvalidConfig` for an empty or malformed name.
pub fn validate_cluster_name(name: &str) -> Result<(), ProvisionError> {
    if name.is_empty() {
        return Err(ProvisionError::InvalidConfig("cluster_name must not be empty".to_string()));
    }
    if !CLUSTER_NAME_RE.is_match(name) {
        return Err(ProvisionError::InvalidConfig(format!(
            "cluster_name '{}' must start with a letter, end with a letter or digit, \
            and contain only letters, digits, '-', '_' or '.'",
            name
        )));
    }
    Ok(())
}
