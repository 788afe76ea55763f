//! Component registry and per-component configuration
//!
//! A workspace scope maps component names to the directory (or file) that
//! defines them. The map is produced by [`registry::ComponentRegistry`], which
//! caches one resolution per workspace for a short time-to-live and shares an
//! in-flight resolution between concurrent callers.
//!
//! Each component may declare slot names. Those are read on demand through a
//! [`config_loader::ComponentConfigLoader`] and are never cached.

pub mod config_loader;
pub mod error;
pub mod manifest;
pub mod registry;

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Deserialize;

pub use config_loader::{ComponentConfigLoader, FsConfigLoader};
pub use error::{ConfigError, RegistryError};
pub use manifest::{ComponentSource, PackageManifestSource};
pub use registry::{ComponentRegistry, RegistryConfig};

/// Immutable mapping from component name to its defining path.
///
/// Instances are shared behind an `Arc` by every request that resolved them,
/// so there is no mutation after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentMap {
    components: FxHashMap<String, PathBuf>,
}

impl ComponentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.components.get(name).map(PathBuf::as_path)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component names in lexicographic order.
    ///
    /// Every consumer that emits output per component iterates this order so
    /// results are reproducible for identical inputs.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.components.iter().map(|(name, path)| (name.as_str(), path.as_path()))
    }
}

impl<N, P> FromIterator<(N, P)> for ComponentMap
where
    N: Into<String>,
    P: Into<PathBuf>,
{
    fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
        Self {
            components: iter
                .into_iter()
                .map(|(name, path)| (name.into(), path.into()))
                .collect(),
        }
    }
}

/// Slot names declared by a single component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ComponentConfig {
    #[serde(default)]
    slots: Vec<String>,
}

impl ComponentConfig {
    /// Builds a config, dropping duplicate slot names while keeping first-seen order.
    pub fn new<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self { slots: slots.into_iter().map(Into::into).collect() };
        config.dedup();
        config
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub(crate) fn dedup(&mut self) {
        let mut seen = rustc_hash::FxHashSet::default();
        self.slots.retain(|slot| seen.insert(slot.clone()));
    }
}
