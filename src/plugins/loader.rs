//! Plugin discovery.
//!
//! Every immediate subdirectory of the plugins directory that holds a
//! `manifest.json` is a plugin candidate. Candidates are visited in
//! lexicographic order and loaded independently: a broken manifest, an
//! unknown backend module or a name already taken skips that plugin only.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::backend::BackendCatalog;
use super::manifest::{PluginManifest, MANIFEST_FILE};
use super::registry::PluginRegistry;
use super::PluginError;

/// Result of a loading pass.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub registry: PluginRegistry,
    /// Plugin directories that were skipped, with the reason.
    pub skipped: Vec<(PathBuf, PluginError)>,
}

/// Lists plugin directories in deterministic order.
pub fn discover(plugins_dir: &Path) -> Result<Vec<PathBuf>, PluginError> {
    let entries = fs::read_dir(plugins_dir).map_err(|source| PluginError::Io {
        path: plugins_dir.to_path_buf(),
        source,
    })?;

    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join(MANIFEST_FILE).is_file())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Reads and validates one plugin directory.
pub fn load_plugin(dir: &Path, catalog: &BackendCatalog) -> Result<PluginManifest, PluginError> {
    let path = dir.join(MANIFEST_FILE);
    let content = fs::read_to_string(&path).map_err(|source| PluginError::Io { path, source })?;
    let manifest = PluginManifest::parse(&content, dir)?;

    if let Some(module) = &manifest.module {
        if !catalog.contains(module) {
            return Err(PluginError::UnknownModule {
                plugin: manifest.name.clone(),
                module: module.clone(),
            });
        }
    }

    Ok(manifest)
}

/// Loads every plugin under `plugins_dir`.
///
/// A missing directory yields an empty registry.
pub fn load_plugins(plugins_dir: &Path, catalog: &BackendCatalog) -> LoadReport {
    let dirs = match discover(plugins_dir) {
        Ok(dirs) => dirs,
        Err(e) => {
            info!("No plugins loaded: {}", e);
            return LoadReport::default();
        }
    };

    let mut seen = HashSet::new();
    let mut loaded = Vec::new();
    let mut skipped = Vec::new();

    for dir in dirs {
        let result = load_plugin(&dir, catalog).and_then(|manifest| {
            if seen.insert(manifest.name.clone()) {
                Ok(manifest)
            } else {
                Err(PluginError::DuplicateName(manifest.name))
            }
        });

        match result {
            Ok(manifest) => {
                debug!(
                    "Loaded plugin {} v{} (min_role {}) from {}",
                    manifest.name,
                    manifest.version,
                    manifest.min_role,
                    dir.display()
                );
                loaded.push(manifest);
            }
            Err(e) => {
                warn!("Skipping plugin at {}: {}", dir.display(), e);
                skipped.push((dir, e));
            }
        }
    }

    info!(
        "Loaded {} plugin(s) from {} ({} skipped)",
        loaded.len(),
        plugins_dir.display(),
        skipped.len()
    );

    LoadReport {
        registry: PluginRegistry::new(loaded),
        skipped,
    }
}
