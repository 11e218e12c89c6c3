//! Provisioning backend implementations.
//!
//! This module provides the bootstrap contract every cloud backend
//! implements and the reference backends shipped with cloudstrap
//! (runpod, network).

use crate::error::ProvisionError;
use crate::provision::ProvisionConfig;

pub mod network;
pub mod runpod;

pub use network::{NetworkBackend, NetworkBackendConfig};
pub use runpod::RunpodBackend;

/// `provider_config` key holding the cluster's network id.
pub const NETWORK_ID_KEY: &str = "network_id";
/// `provider_config` key holding the cluster's firewall id.
pub const FIREWALL_ID_KEY: &str = "firewall_id";

/// Trait for provisioning backend implementations.
///
/// Each cloud backend implements this trait to prepare a cluster's
/// configuration for instance creation. The signature is uniform across
/// backends: a backend with nothing to set up still accepts `region` and
/// `cluster_name` and ignores them.
///
/// Implementations must be `Send + Sync` so the orchestrator can bootstrap
/// different clusters from several threads at once.
pub trait ProvisionBackend: Send + Sync {
    /// Returns the name the backend is registered under (e.g., "runpod").
    fn name(&self) -> &str;

    /// Ensures the backend's prerequisite resources exist for a cluster.
    ///
    /// # Arguments
    /// * `region` - Target region; may be empty for region-less backends
    /// * `cluster_name` - Stable tag for per-cluster resources
    /// * `config` - The desired cluster configuration
    ///
    /// # Returns
    /// A configuration with identical `region` and `cluster_name` whose
    /// `provider_config` may carry additional or corrected entries. Existing
    /// keys are never removed. Calling again with the same inputs converges
    /// to the same result without creating duplicate resources.
    ///
    /// # Errors
    /// * `ProvisionError::InvalidConfig` - identity fields missing or malformed
    /// * `ProvisionError::ResourceSetup` - a prerequisite resource could not be
    ///   created or located
    /// * `ProvisionError::UnsupportedOperation` - the backend cannot honor the
    ///   request (e.g., an unknown region)
    fn bootstrap_instances(
        &self,
        region: &str,
        cluster_name: &str,
        config: &ProvisionConfig,
    ) -> Result<ProvisionConfig, ProvisionError>;
}
