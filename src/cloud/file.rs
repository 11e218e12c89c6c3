//! Cloud network API persisted to a YAML state file.
//!
//! The state file lets the stateful backend stay idempotent across
//! separate CLI invocations: a second `bootstrap` run finds the resources
//! the first one created.

use std::fs;
use std::io;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};

use super::memory::ResourceState;
use super::{CloudNetworkApi, Firewall, Network};

/// Cloud network API backed by a YAML state file.
///
/// Every call reads the file, and mutating calls write it back through a
/// temporary file and a rename so a crash never leaves it half-written.
/// Calls on one instance are serialized by an internal lock; sharing one
/// state file between processes is not supported.
#[derive(Debug)]
pub struct FileNetworkApi {
    path: Utf8PathBuf,
    lock: Mutex<()>,
}

impl FileNetworkApi {
    /// Creates an API storing state at `path`. The file is created on the
    /// first write.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the state file path.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn load(&self) -> Result<ResourceState> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(ResourceState::default()),
            Ok(content) => serde_yaml::from_str(&content)
                .with_context(|| format!("failed to parse state file: {}", self.path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("state file not found, starting empty: {}", self.path);
                Ok(ResourceState::default())
            }
            Err(e) => Err(e).with_context(|| format!("failed to read state file: {}", self.path)),
        }
    }

    fn save(&self, state: &ResourceState) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create state directory: {}", parent))?;
        }

        let content = serde_yaml::to_string(state).context("failed to serialize state")?;
        let file_name = self.path.file_name().unwrap_or("state.yml");
        let tmp_path =
            self.path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        fs::write(&tmp_path, content)
            .with_context(|| format!("failed to write temporary state file: {}", tmp_path))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                tracing::warn!(
                    path = %tmp_path,
                    "failed to remove temporary state file: {}",
                    cleanup
                );
            }
            return Err(e).with_context(|| format!("failed to replace state file: {}", self.path));
        }
        tracing::trace!("saved state file: {}", self.path);
        Ok(())
    }

    fn update<T>(&self, f: impl FnOnce(&mut ResourceState) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self.load()?;
        let value = f(&mut state)?;
        self.save(&state)?;
        Ok(value)
    }

    fn read<T>(&self, f: impl FnOnce(&ResourceState) -> T) -> Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&self.load()?))
    }
}

impl CloudNetworkApi for FileNetworkApi {
    fn find_network(&self, region: &str, tag: &str) -> Result<Option<Network>> {
        self.read(|state| state.find_network(region, tag))
    }

    fn create_network(&self, region: &str, tag: &str) -> Result<Network> {
        self.update(|state| state.insert_network(region, tag))
    }

    fn find_firewall(&self, region: &str, tag: &str) -> Result<Option<Firewall>> {
        self.read(|state| state.find_firewall(region, tag))
    }

    fn create_firewall(
        &self,
        region: &str,
        tag: &str,
        network_id: &str,
        ports: &[u16],
    ) -> Result<Firewall> {
        self.update(|state| state.insert_firewall(region, tag, network_id, ports))
    }
}
