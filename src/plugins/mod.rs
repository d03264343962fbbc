//! Dashboard plugins: manifests, discovery, the role-filtered registry and
//! the routes plugins contribute.

pub mod assets;
pub mod backend;
pub mod loader;
pub mod manifest;
pub mod registry;

use axum::extract::Path as UrlPath;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{require_role, RoleGate, TokenAuthenticator};
use crate::role::UnknownRole;

pub use backend::{BackendCatalog, PluginBackend};
pub use loader::{load_plugins, LoadReport};
pub use manifest::{PluginManifest, PluginSummary};
pub use registry::PluginRegistry;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid plugin name '{0}' (allowed: letters, digits, '-', '_')")]
    InvalidName(String),

    #[error("plugin '{plugin}': asset '{asset}' must be a relative path inside static/")]
    InvalidAsset { plugin: String, asset: String },

    #[error("plugin '{plugin}': {source}")]
    UnknownRole {
        plugin: String,
        #[source]
        source: UnknownRole,
    },

    #[error("plugin name '{0}' is already taken by an earlier plugin")]
    DuplicateName(String),

    #[error("plugin '{plugin}': unknown backend module '{module}'")]
    UnknownModule { plugin: String, module: String },
}

/// Routes for every loaded plugin: public static assets under
/// `/plugins/{name}/static/` and backend routes gated by the plugin's
/// `min_role`.
pub fn routes(
    registry: &PluginRegistry,
    catalog: &BackendCatalog,
    authenticator: Arc<TokenAuthenticator>,
) -> Router {
    let mut router = Router::new();

    for plugin in registry.iter() {
        let base_url = plugin.base_url();

        let static_dir = plugin.static_dir();
        router = router.route(
            &format!("{}/static/{{*path}}", base_url),
            get(move |UrlPath(path): UrlPath<String>| {
                assets::serve_asset(static_dir.clone(), path)
            }),
        );

        let Some(backend) = plugin.module.as_deref().and_then(|m| catalog.get(m)) else {
            continue;
        };

        let gate = RoleGate {
            authenticator: authenticator.clone(),
            floor: plugin.min_role,
        };
        let backend_routes = backend
            .register(Router::new(), &base_url)
            .layer(middleware::from_fn_with_state(gate, require_role));
        router = router.merge(backend_routes);

        debug!(
            "Mounted backend for plugin {} at {} (min_role {})",
            plugin.name, base_url, plugin.min_role
        );
    }

    router
}
