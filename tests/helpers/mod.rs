use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use cloudstrap::cloud::{CloudNetworkApi, Firewall, MemoryNetworkApi, Network};

/// A call made against [`ScriptedNetworkApi`].
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCall {
    FindNetwork,
    CreateNetwork,
    FindFirewall,
    CreateFirewall,
}

/// Cloud network API that records calls and fails on demand.
///
/// Successful calls are forwarded to a [`MemoryNetworkApi`], so created
/// resources are visible to later lookups exactly as in a real account.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedNetworkApi {
    pub inner: MemoryNetworkApi,
    calls: Mutex<Vec<ApiCall>>,
    failures: Mutex<HashMap<ApiCall, u32>>,
}

#[allow(dead_code)]
impl ScriptedNetworkApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` calls of kind `call` fail.
    pub fn fail(&self, call: ApiCall, times: u32) {
        self.failures.lock().unwrap().insert(call, times);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: ApiCall) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: ApiCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        let mut failures = self.failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(&call)
            && *remaining > 0
        {
            *remaining -= 1;
            bail!("simulated {:?} failure: quota exceeded", call);
        }
        Ok(())
    }
}

impl CloudNetworkApi for ScriptedNetworkApi {
    fn find_network(&self, region: &str, tag: &str) -> Result<Option<Network>> {
        self.record(ApiCall::FindNetwork)?;
        self.inner.find_network(region, tag)
    }

    fn create_network(&self, region: &str, tag: &str) -> Result<Network> {
        self.record(ApiCall::CreateNetwork)?;
        self.inner.create_network(region, tag)
    }

    fn find_firewall(&self, region: &str, tag: &str) -> Result<Option<Firewall>> {
        self.record(ApiCall::FindFirewall)?;
        self.inner.find_firewall(region, tag)
    }

    fn create_firewall(
        &self,
        region: &str,
        tag: &str,
        network_id: &str,
        ports: &[u16],
    ) -> Result<Firewall> {
        self.record(ApiCall::CreateFirewall)?;
        self.inner.create_firewall(region, tag, network_id, ports)
    }
}

/// Writes `yaml` to `profile.yml` under `dir` and returns its path.
#[allow(dead_code)]
pub fn write_profile(dir: &Utf8Path, yaml: &str) -> Utf8PathBuf {
    let path = dir.join("profile.yml");
    std::fs::write(&path, yaml).expect("failed to write profile");
    path
}

/// Returns a UTF-8 view of a temporary directory.
#[allow(dead_code)]
pub fn utf8_dir(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("temp dir path is not UTF-8")
}
