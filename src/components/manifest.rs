//! Component discovery from package manifests
//!
//! The default [`ComponentSource`] walks a workspace for `package.json` files
//! (skipping `node_modules` and hidden directories) and registers every named
//! package as a component whose defining path is the package directory.
//! Scoped package names (`@acme/Card`) register under their final segment.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::ComponentMap;
use super::error::RegistryError;

const MANIFEST_FILE: &str = "package.json";
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "dist"];

/// Produces the component map for a scan root.
///
/// The registry calls this at most once per cache window, so implementations
/// are free to do blocking or expensive work as long as they keep it off the
/// async executor.
#[async_trait::async_trait]
pub trait ComponentSource: Send + Sync {
    async fn scan(&self, root: &Path) -> Result<ComponentMap, RegistryError>;

    /// Human-readable name for logging
    fn source_name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    name: Option<String>,
}

/// Scans `package.json` manifests below the root on a blocking worker thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageManifestSource;

#[async_trait::async_trait]
impl ComponentSource for PackageManifestSource {
    async fn scan(&self, root: &Path) -> Result<ComponentMap, RegistryError> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || scan_manifests(&root)).await?
    }

    fn source_name(&self) -> &'static str {
        "package-manifests"
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map_or(false, |name| name.starts_with('.') || SKIPPED_DIRS.contains(&name))
}

/// Collects manifests in path order so duplicate names resolve deterministically.
fn find_manifests(root: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    let mut manifests = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_skipped_dir(e)) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE {
                    manifests.push(entry.into_path());
                }
            }
            Err(e) if e.depth() == 0 => {
                return Err(RegistryError::Walk { path: root.to_path_buf(), source: e });
            }
            Err(e) => warn!("Skipping unreadable entry under {:?}: {}", root, e),
        }
    }
    manifests.sort();
    Ok(manifests)
}

/// Reduces a package name to the name it is used under as a tag.
pub fn component_name(package_name: &str) -> &str {
    package_name.rsplit('/').next().unwrap_or(package_name)
}

fn read_manifest(path: &Path) -> Option<PackageManifest> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            warn!("Failed to parse {:?}: {}", path, e);
            None
        }
    }
}

pub(crate) fn scan_manifests(root: &Path) -> Result<ComponentMap, RegistryError> {
    let manifests = find_manifests(root)?;
    debug!("Found {} package manifests under {:?}", manifests.len(), root);

    let mut seen = FxHashSet::default();
    let mut components: Vec<(String, PathBuf)> = Vec::with_capacity(manifests.len());
    for manifest_path in manifests {
        let Some(manifest) = read_manifest(&manifest_path) else {
            continue;
        };
        let Some(package_name) = manifest.name else {
            continue;
        };
        let name = component_name(package_name.trim());
        if name.is_empty() {
            continue;
        }
        let Some(package_dir) = manifest_path.parent() else {
            continue;
        };
        if !seen.insert(name.to_string()) {
            debug!("Ignoring duplicate component '{}' at {:?}", name, package_dir);
            continue;
        }
        components.push((name.to_string(), package_dir.to_path_buf()));
    }

    Ok(components.into_iter().collect())
}
