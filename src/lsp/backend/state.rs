//! Backend state management
//!
//! This module defines the ComponentBackend struct, which holds the open
//! documents and the shared collaborators every request reads from.

use std::sync::Arc;
use std::sync::atomic::AtomicU32;

use dashmap::DashMap;
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::components::{ComponentConfigLoader, ComponentRegistry};
use crate::config::ServerConfig;
use crate::lsp::models::LspDocument;

/// The component language server backend, managing state and handling LSP requests.
#[derive(Clone)]
pub struct ComponentBackend {
    pub(super) client: Client,
    pub(super) config: Arc<ServerConfig>,
    pub(super) documents_by_uri: Arc<DashMap<Url, Arc<LspDocument>>>,
    pub(super) serial_document_id: Arc<AtomicU32>,
    /// The only shared mutable resource; single-flight and TTL-bounded.
    pub(super) registry: Arc<ComponentRegistry>,
    pub(super) config_loader: Arc<dyn ComponentConfigLoader>,
}

// Manual Debug implementation since the loader is a trait object
impl std::fmt::Debug for ComponentBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentBackend")
            .field("config", &self.config)
            .field("documents_count", &self.documents_by_uri.len())
            .field("registry", &self.registry)
            .finish()
    }
}
