//! Backend registry resolved at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backends::{NetworkBackend, ProvisionBackend, RunpodBackend};
use crate::error::ProvisionError;

/// Maps backend names to their implementations.
///
/// Built once before any provisioning starts and read-only afterwards, so
/// one registry can be shared by concurrent bootstrap calls.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn ProvisionBackend>>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in backends.
    ///
    /// `runpod` is always registered; `network` only when provided.
    pub fn with_builtin(network: Option<NetworkBackend>) -> Self {
        let mut backends: BTreeMap<String, Arc<dyn ProvisionBackend>> = BTreeMap::new();
        backends.insert(RunpodBackend.name().to_string(), Arc::new(RunpodBackend));
        if let Some(network) = network {
            backends.insert(network.name().to_string(), Arc::new(network));
        }
        Self { backends }
    }

    /// Registers a backend under its own name.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::Config` if the name is empty or taken.
    pub fn register(&mut self, backend: Arc<dyn ProvisionBackend>) -> Result<(), ProvisionError> {
        let name = backend.name().to_string();
        if name.is_empty() {
            return Err(ProvisionError::Config("backend name must not be empty".to_string()));
        }
        if self.backends.contains_key(&name) {
            return Err(ProvisionError::Config(format!(
                "backend '{}' is already registered",
                name
            )));
        }
        tracing::debug!(backend = %name, "registered backend");
        self.backends.insert(name, backend);
        Ok(())
    }

    /// Looks up a backend by name.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::UnknownBackend` if nothing is registered
    /// under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ProvisionBackend>, ProvisionError> {
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| ProvisionError::UnknownBackend(name.to_string()))
    }

    /// Returns true if a backend is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}
