//! Loaded plugin catalog.
//!
//! Built once by the loader and never mutated afterwards, so handlers share
//! it behind an `Arc` without locking.

use super::manifest::{PluginManifest, PluginSummary};
use crate::role::Role;

#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginManifest>,
}

impl PluginRegistry {
    /// Plugins in discovery order.
    pub fn new(plugins: Vec<PluginManifest>) -> Self {
        Self { plugins }
    }

    /// Every plugin whose floor the role reaches, in discovery order.
    pub fn list_visible(&self, role: Role) -> Vec<PluginSummary> {
        self.plugins
            .iter()
            .filter(|p| role.allows(p.min_role))
            .map(PluginManifest::summary)
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&PluginManifest> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginManifest> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
