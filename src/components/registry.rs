//! Component Registry Resolver with single-flight, time-bounded caching
//!
//! `resolve(dir)` first looks upward from `dir` for a build-configuration
//! marker (a Vite config by default). Without one there is no component scope
//! and the caller degrades to empty results. The outcome of that search, found
//! or not, is cached per directory under the same time-to-live as the maps.
//!
//! With a scope, the component map for the enclosing workspace folder (or the
//! scope root when no folder is known) is produced by a [`ComponentSource`].
//! Concurrent callers share one in-flight scan through a [`Shared`] future,
//! and the finished map is reused until the configured time-to-live has
//! elapsed since the scan completed.
//!
//! ```text
//! resolve(dir)
//!     ↓
//! scopes[dir] or find scope marker upward ── none ──→ None
//!     ↓
//! scans[scan_root]
//!     ├─ in flight       → await the shared future
//!     ├─ fresh           → clone the cached Arc<ComponentMap>
//!     └─ expired/absent  → start a new scan, publish it, await it
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::ComponentMap;
use super::manifest::{ComponentSource, PackageManifestSource};

/// How long a completed resolution stays valid.
pub const DEFAULT_REGISTRY_TTL: Duration = Duration::from_secs(8);

/// File names whose presence marks a directory as a component scope root.
pub const DEFAULT_SCOPE_MARKERS: &[&str] = &[
    "vite.config.ts",
    "vite.config.js",
    "vite.config.mts",
    "vite.config.mjs",
    "vite.config.cts",
    "vite.config.cjs",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub ttl: Duration,
    pub scope_markers: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_REGISTRY_TTL,
            scope_markers: DEFAULT_SCOPE_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

type PendingScan = Shared<BoxFuture<'static, Arc<ComponentMap>>>;

/// One published resolution: the shared scan plus the instant it finished.
struct CachedScan {
    pending: PendingScan,
    completed_at: Arc<Mutex<Option<Instant>>>,
}

impl CachedScan {
    /// In-flight scans never expire; they are awaited instead.
    fn is_expired(&self, ttl: Duration) -> bool {
        let completed_at = *self.completed_at.lock();
        completed_at.map_or(false, |completed| completed.elapsed() >= ttl)
    }
}

/// Scope search result for one directory.
struct CachedScope {
    root: Option<PathBuf>,
    found_at: Instant,
}

pub struct ComponentRegistry {
    config: RegistryConfig,
    source: Arc<dyn ComponentSource>,
    workspace_folders: RwLock<Vec<PathBuf>>,
    scopes: DashMap<PathBuf, CachedScope>,
    scans: DashMap<PathBuf, CachedScan>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("config", &self.config)
            .field("source", &self.source.source_name())
            .field("cached_scopes", &self.scopes.len())
            .field("cached_scans", &self.scans.len())
            .finish()
    }
}

impl ComponentRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_source(config, Arc::new(PackageManifestSource))
    }

    pub fn with_source(config: RegistryConfig, source: Arc<dyn ComponentSource>) -> Self {
        Self {
            config,
            source,
            workspace_folders: RwLock::new(Vec::new()),
            scopes: DashMap::new(),
            scans: DashMap::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn set_workspace_folders(&self, folders: Vec<PathBuf>) {
        debug!("Registry workspace folders: {:?}", folders);
        *self.workspace_folders.write() = folders;
        // Folders bound the upward search.
        self.scopes.clear();
    }

    pub fn workspace_folders(&self) -> Vec<PathBuf> {
        self.workspace_folders.read().clone()
    }

    /// Drops every cached resolution; in-flight scans finish for their
    /// current awaiters but are no longer handed out.
    pub fn invalidate(&self) {
        let dropped = self.scans.len();
        self.scans.clear();
        self.scopes.clear();
        debug!("Invalidated {} cached component scopes", dropped);
    }

    /// Innermost known workspace folder containing `dir`.
    fn workspace_folder_of(&self, dir: &Path) -> Option<PathBuf> {
        self.workspace_folders
            .read()
            .iter()
            .filter(|folder| dir.starts_with(folder))
            .max_by_key(|folder| folder.components().count())
            .cloned()
    }

    async fn has_marker(&self, dir: &Path) -> bool {
        for marker in &self.config.scope_markers {
            if tokio::fs::try_exists(dir.join(marker)).await.unwrap_or(false) {
                return true;
            }
        }
        false
    }

    /// Nearest ancestor of `dir` (inclusive) holding a scope marker, not
    /// searching past the enclosing workspace folder.
    pub async fn find_scope_root(&self, dir: &Path) -> Option<PathBuf> {
        let boundary = self.workspace_folder_of(dir);
        for ancestor in dir.ancestors() {
            if self.has_marker(ancestor).await {
                trace!("Scope marker found in {:?}", ancestor);
                return Some(ancestor.to_path_buf());
            }
            if boundary.as_deref() == Some(ancestor) {
                break;
            }
        }
        None
    }

    /// [`Self::find_scope_root`], answered from the cache while fresh.
    async fn cached_scope_root(&self, dir: &Path) -> Option<PathBuf> {
        if let Some(cached) = self.scopes.get(dir) {
            if cached.found_at.elapsed() < self.config.ttl {
                return cached.root.clone();
            }
        }
        let root = self.find_scope_root(dir).await;
        self.scopes.insert(
            dir.to_path_buf(),
            CachedScope { root: root.clone(), found_at: Instant::now() },
        );
        root
    }

    /// Resolves the component map for documents living in `dir`.
    pub async fn resolve(&self, dir: &Path) -> Option<Arc<ComponentMap>> {
        let Some(scope_root) = self.cached_scope_root(dir).await else {
            debug!("No component scope found for {:?}", dir);
            return None;
        };
        let scan_root = self.workspace_folder_of(dir).unwrap_or(scope_root);

        let pending = self.pending_scan(&scan_root);
        Some(pending.await)
    }

    /// Returns the shared scan for `scan_root`, starting one if none is
    /// cached or the cached one has expired. The map entry is held only for
    /// the duration of this call, never across an await.
    fn pending_scan(&self, scan_root: &Path) -> PendingScan {
        match self.scans.entry(scan_root.to_path_buf()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_expired(self.config.ttl) {
                    debug!("Component map for {:?} expired, rescanning", scan_root);
                    let fresh = self.start_scan(scan_root);
                    let pending = fresh.pending.clone();
                    entry.insert(fresh);
                    pending
                } else {
                    trace!("Reusing component map for {:?}", scan_root);
                    entry.get().pending.clone()
                }
            }
            Entry::Vacant(entry) => {
                let fresh = self.start_scan(scan_root);
                let pending = fresh.pending.clone();
                entry.insert(fresh);
                pending
            }
        }
    }

    fn start_scan(&self, scan_root: &Path) -> CachedScan {
        let source = Arc::clone(&self.source);
        let root = scan_root.to_path_buf();
        let completed_at = Arc::new(Mutex::new(None));
        let completion = Arc::clone(&completed_at);

        let pending = async move {
            let started = Instant::now();
            let map = match source.scan(&root).await {
                Ok(map) => {
                    info!(
                        "Resolved {} components under {:?} via {} in {:?}",
                        map.len(),
                        root,
                        source.source_name(),
                        started.elapsed()
                    );
                    map
                }
                Err(e) => {
                    warn!("Component scan of {:?} failed: {}", root, e);
                    ComponentMap::default()
                }
            };
            *completion.lock() = Some(Instant::now());
            Arc::new(map)
        }
        .boxed()
        .shared();

        CachedScan { pending, completed_at }
    }
}
