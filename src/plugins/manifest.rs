//! Plugin manifest parsing and normalisation.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use super::PluginError;
use crate::role::Role;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DEFAULT_VERSION: &str = "0.0.0";

/// `manifest.json` as written by plugin authors. Everything is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawManifest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub min_role: Option<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub widgets: Vec<serde_json::Value>,
    pub module: Option<String>,
}

/// A validated manifest with defaults applied and asset URLs resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginManifest {
    pub name: String,
    pub title: String,
    pub version: String,
    pub min_role: Role,
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    pub widgets: Vec<serde_json::Value>,
    pub module: Option<String>,
    /// Directory the manifest was loaded from.
    pub dir: PathBuf,
}

/// What a caller sees of a plugin. The role floor stays private.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginSummary {
    pub name: String,
    pub title: String,
    pub version: String,
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    pub widgets: Vec<serde_json::Value>,
}

/// URL prefix owned by a plugin.
pub fn base_url(name: &str) -> String {
    format!("/plugins/{}", name)
}

pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// A manifest asset must stay inside the plugin's static directory.
pub fn is_safe_relative(asset: &str) -> bool {
    if asset.is_empty() {
        return false;
    }
    Path::new(asset)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn resolve_assets(name: &str, assets: Vec<String>) -> Result<Vec<String>, PluginError> {
    assets
        .into_iter()
        .map(|asset| {
            if is_safe_relative(&asset) {
                Ok(format!("{}/static/{}", base_url(name), asset.trim_start_matches("./")))
            } else {
                Err(PluginError::InvalidAsset {
                    plugin: name.to_string(),
                    asset,
                })
            }
        })
        .collect()
}

impl PluginManifest {
    /// Parses manifest text found in `dir`.
    pub fn parse(content: &str, dir: &Path) -> Result<Self, PluginError> {
        let raw: RawManifest =
            serde_json::from_str(content).map_err(|source| PluginError::Json {
                path: dir.join(MANIFEST_FILE),
                source,
            })?;
        Self::from_raw(raw, dir)
    }

    /// Applies defaults and validates a raw manifest.
    ///
    /// The name falls back to the directory name.
    pub fn from_raw(raw: RawManifest, dir: &Path) -> Result<Self, PluginError> {
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = raw.name.unwrap_or(dir_name);
        if !is_valid_name(&name) {
            return Err(PluginError::InvalidName(name));
        }

        let min_role = match raw.min_role {
            Some(role) => role.parse::<Role>().map_err(|source| PluginError::UnknownRole {
                plugin: name.clone(),
                source,
            })?,
            None => Role::default(),
        };

        let scripts = resolve_assets(&name, raw.scripts)?;
        let styles = resolve_assets(&name, raw.styles)?;

        Ok(Self {
            title: raw.title.unwrap_or_else(|| name.clone()),
            version: raw.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            min_role,
            scripts,
            styles,
            widgets: raw.widgets,
            module: raw.module.filter(|m| !m.trim().is_empty()),
            dir: dir.to_path_buf(),
            name,
        })
    }

    pub fn base_url(&self) -> String {
        base_url(&self.name)
    }

    pub fn static_dir(&self) -> PathBuf {
        self.dir.join("static")
    }

    pub fn summary(&self) -> PluginSummary {
        PluginSummary {
            name: self.name.clone(),
            title: self.title.clone(),
            version: self.version.clone(),
            scripts: self.scripts.clone(),
            styles: self.styles.clone(),
            widgets: self.widgets.clone(),
        }
    }
}
