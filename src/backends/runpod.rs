//! Runpod backend implementation.

use super::ProvisionBackend;
use crate::error::ProvisionError;
use crate::provision::ProvisionConfig;

/// Backend for the Runpod GPU marketplace.
///
/// Runpod needs no networks, firewalls or image lookups before instances
/// are requested, so bootstrapping returns the configuration unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunpodBackend;

impl ProvisionBackend for RunpodBackend {
    fn name(&self) -> &str {
        "runpod"
    }

    #[tracing::instrument(skip(self, config))]
    fn bootstrap_instances(
        &self,
        _region: &str,
        _cluster_name: &str,
        config: &ProvisionConfig,
    ) -> Result<ProvisionConfig, ProvisionError> {
        tracing::debug!("no prerequisite resources required");
        Ok(config.clone())
    }
}
