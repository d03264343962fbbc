//! Backend contributions from plugins.
//!
//! A plugin may name a backend `module` in its manifest. Modules are Rust
//! types compiled into the dashboard and looked up by name in a
//! [`BackendCatalog`]; each one receives the router and the plugin's URL
//! prefix and adds its routes under that prefix.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::system::{self, LoadAverage};

pub trait PluginBackend: Send + Sync {
    /// Adds the plugin's routes below `base_url`.
    fn register(&self, router: Router, base_url: &str) -> Router;
}

/// Named backend modules available to manifests.
#[derive(Clone, Default)]
pub struct BackendCatalog {
    modules: BTreeMap<String, Arc<dyn PluginBackend>>,
}

impl BackendCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog shipped with the dashboard.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert("sysinfo", SysinfoBackend);
        catalog
    }

    pub fn insert(&mut self, name: impl Into<String>, backend: impl PluginBackend + 'static) {
        self.modules.insert(name.into(), Arc::new(backend));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PluginBackend>> {
        self.modules.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

#[derive(Debug, Serialize)]
struct HostInfo {
    hostname: Option<String>,
    kernel: Option<String>,
    machine: Option<String>,
    uptime_seconds: Option<f64>,
    load_average: Option<LoadAverage>,
}

async fn host_info() -> Json<HostInfo> {
    let uname = system::read_uname_info().ok();
    Json(HostInfo {
        hostname: uname.as_ref().map(|u| u.nodename.clone()),
        kernel: uname.as_ref().map(|u| u.release.clone()),
        machine: uname.map(|u| u.machine),
        uptime_seconds: system::read_uptime().ok(),
        load_average: system::read_load_average().ok(),
    })
}

/// Host identity and load: `GET {base_url}/api/info`.
pub struct SysinfoBackend;

impl PluginBackend for SysinfoBackend {
    fn register(&self, router: Router, base_url: &str) -> Router {
        router.route(&format!("{}/api/info", base_url), get(host_info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = BackendCatalog::builtin();
        assert!(catalog.contains("sysinfo"));
        assert!(catalog.get("missing").is_none());
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["sysinfo"]);
    }

    #[tokio::test]
    async fn test_host_info_reports_kernel() {
        let Json(info) = host_info().await;
        assert!(info.kernel.is_some());
        assert!(info.uptime_seconds.unwrap_or(0.0) > 0.0);
    }
}
