use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use tower_lsp::Client;
use tower_lsp::lsp_types::{MessageType, Url};
use tracing::{debug, trace};

use crate::components::{ComponentConfigLoader, ComponentMap, ComponentRegistry, FsConfigLoader};
use crate::config::ServerConfig;
use crate::lsp::models::LspDocument;

mod handlers;
mod state;

pub use state::ComponentBackend;

/// Shown when completion finds no component scope for the document.
pub const NO_SCOPE_ADVISORY: &str = "No vite.config.ts found in the current directory tree.";

impl ComponentBackend {
    /// Creates a backend reading components and slot configuration from disk.
    pub fn new(client: Client, config: ServerConfig) -> Self {
        let registry = Arc::new(ComponentRegistry::new(config.registry.clone()));
        Self::with_collaborators(client, config, registry, Arc::new(FsConfigLoader))
    }

    pub fn with_collaborators(
        client: Client,
        config: ServerConfig,
        registry: Arc<ComponentRegistry>,
        config_loader: Arc<dyn ComponentConfigLoader>,
    ) -> Self {
        Self {
            client,
            config: Arc::new(config),
            documents_by_uri: Arc::new(DashMap::new()),
            serial_document_id: Arc::new(AtomicU32::new(0)),
            registry,
            config_loader,
        }
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn document(&self, uri: &Url) -> Option<Arc<LspDocument>> {
        self.documents_by_uri.get(uri).map(|r| r.value().clone())
    }

    fn next_document_id(&self) -> u32 {
        self.serial_document_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Component map covering the directory of `uri`. Documents that are not
    /// files on disk have no scope.
    pub async fn component_map_for(&self, uri: &Url) -> Option<Arc<ComponentMap>> {
        let path: PathBuf = match uri.to_file_path() {
            Ok(path) => path,
            Err(()) => {
                debug!("No component scope for non-file URI {}", uri);
                return None;
            }
        };
        let dir = path.parent()?;
        trace!("Resolving components for {:?}", dir);
        self.registry.resolve(dir).await
    }

    /// Sends a warning to the user without making the request wait on it.
    fn advise(&self, message: &'static str) {
        let client = self.client.clone();
        tokio::spawn(async move {
            client.show_message(MessageType::WARNING, message).await;
        });
    }
}

/// Directories of file URIs; other schemes are skipped.
fn file_paths<'a>(uris: impl IntoIterator<Item = &'a Url>) -> Vec<PathBuf> {
    uris.into_iter().filter_map(|uri| uri.to_file_path().ok()).collect()
}
