//! Provisioning orchestrator for the bootstrap phase.
//!
//! The orchestrator is the single caller of backend bootstrap hooks. For
//! each request it:
//!
//! 1. **Validates** the configuration's identity fields
//! 2. **Resolves** the backend by name from the registry
//! 3. **Serializes** calls for the same cluster behind a per-cluster lock
//! 4. **Invokes** the hook, retrying transient resource failures
//! 5. **Checks** the returned configuration against the contract
//!
//! Different clusters can be bootstrapped concurrently from several
//! threads through a shared `Orchestrator`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, info_span};

use crate::error::ProvisionError;
use crate::provision::ProvisionConfig;
use crate::registry::BackendRegistry;
use crate::retry::{RetryConfig, retry_with_backoff};

/// Per-cluster locks keyed by cluster name.
#[derive(Debug, Default)]
struct ClusterLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ClusterLocks {
    fn lock_for(&self, cluster_name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(cluster_name.to_string()).or_default().clone()
    }

    /// Drops `lock` and removes its entry once no other caller holds it.
    fn release(&self, cluster_name: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if let Some(entry) = locks.get(cluster_name)
            && Arc::strong_count(entry) == 1
        {
            locks.remove(cluster_name);
        }
    }
}

/// Runs the bootstrap phase of provisioning.
#[derive(Debug)]
pub struct Orchestrator {
    registry: BackendRegistry,
    retry: RetryConfig,
    locks: ClusterLocks,
}

impl Orchestrator {
    /// Creates an orchestrator dispatching to `registry`.
    pub fn new(registry: BackendRegistry, retry: RetryConfig) -> Self {
        Self {
            registry,
            retry,
            locks: ClusterLocks::default(),
        }
    }

    /// Returns the backend registry.
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Bootstraps `config` on the backend registered as `backend_name`.
    ///
    /// The hook is called with the config's own `region` and `cluster_name`.
    /// `config` itself is never modified; on success the bootstrapped copy
    /// is returned for the instance creation phase.
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` - the config fails validation (the hook is not called)
    /// * `UnknownBackend` - nothing is registered under `backend_name`
    /// * `Backend` - the hook failed; wraps its error unchanged
    /// * `ContractViolation` - the hook altered identity fields or dropped
    ///   `provider_config` keys
    pub fn bootstrap(
        &self,
        backend_name: &str,
        config: &ProvisionConfig,
    ) -> Result<ProvisionConfig, ProvisionError> {
        config.validate()?;
        let backend = self.registry.get(backend_name)?;

        let attempt_id = uuid::Uuid::new_v4();
        let span = info_span!(
            "bootstrap",
            %attempt_id,
            backend = %backend_name,
            cluster = %config.cluster_name,
            region = %config.region,
        );
        let _entered = span.enter();

        let cluster_lock = self.locks.lock_for(&config.cluster_name);
        let (result, attempts) = {
            let _guard = cluster_lock.lock().unwrap_or_else(PoisonError::into_inner);
            info!("bootstrapping cluster");
            retry_with_backoff(
                &self.retry,
                "bootstrap_instances",
                ProvisionError::is_retryable,
                || backend.bootstrap_instances(&config.region, &config.cluster_name, config),
            )
        };
        self.locks.release(&config.cluster_name, cluster_lock);

        let bootstrapped = result.map_err(|e| ProvisionError::Backend {
            backend: backend_name.to_string(),
            attempts,
            source: Box::new(e),
        })?;

        check_contract(backend_name, config, &bootstrapped)?;
        info!(attempts, "bootstrap completed");
        Ok(bootstrapped)
    }
}

/// Verifies the invariants a hook must preserve.
fn check_contract(
    backend_name: &str,
    input: &ProvisionConfig,
    output: &ProvisionConfig,
) -> Result<(), ProvisionError> {
    let violation = |message: String| ProvisionError::ContractViolation {
        backend: backend_name.to_string(),
        message,
    };

    if output.cluster_name != input.cluster_name {
        return Err(violation(format!(
            "cluster_name changed from '{}' to '{}'",
            input.cluster_name, output.cluster_name
        )));
    }
    if output.region != input.region {
        return Err(violation(format!(
            "region changed from '{}' to '{}'",
            input.region, output.region
        )));
    }
    let removed: Vec<&str> = input
        .provider_config
        .keys()
        .filter(|key| !output.provider_config.contains_key(*key))
        .map(String::as_str)
        .collect();
    if !removed.is_empty() {
        return Err(violation(format!(
            "provider_config keys removed: {}",
            removed.join(", ")
        )));
    }
    Ok(())
}
