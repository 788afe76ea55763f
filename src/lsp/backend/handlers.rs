//! LSP protocol handler implementations
//!
//! This module contains the `tower_lsp::LanguageServer` implementation for
//! the component backend:
//! - Lifecycle handlers (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_close)
//! - Workspace folder changes, which drop cached component registries
//! - Completion and semantic tokens (full and range)

use std::sync::Arc;

use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::{
    CompletionOptions, CompletionParams, CompletionResponse, DidChangeTextDocumentParams,
    DidChangeWorkspaceFoldersParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams, InitializeParams,
    InitializeResult, InitializedParams, OneOf, SemanticTokensFullOptions, SemanticTokensOptions,
    SemanticTokensParams, SemanticTokensRangeParams, SemanticTokensRangeResult, SemanticTokensResult,
    SemanticTokensServerCapabilities, ServerCapabilities, ServerInfo, TextDocumentSyncCapability,
    TextDocumentSyncKind, WorkspaceFoldersServerCapabilities, WorkspaceServerCapabilities,
};
use tower_lsp::{LanguageServer, jsonrpc};
use tracing::{debug, info, warn};

use super::state::ComponentBackend;
use super::{NO_SCOPE_ADVISORY, file_paths};
use crate::annotation::legend;
use crate::lsp::features::{CompletionOutcome, complete, semantic_tokens};
use crate::lsp::models::LspDocument;

#[tower_lsp::async_trait]
impl LanguageServer for ComponentBackend {
    /// Handles the LSP initialize request, recording workspace folders and advertising capabilities.
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!("Received initialize from {:?}", params.client_info.as_ref().map(|c| &c.name));

        let folders = match &params.workspace_folders {
            Some(folders) if !folders.is_empty() => file_paths(folders.iter().map(|f| &f.uri)),
            #[allow(deprecated)]
            _ => file_paths(params.root_uri.iter()),
        };
        if folders.is_empty() {
            warn!("No file-based workspace folders; scopes are searched up to the filesystem root");
        }
        self.registry.set_workspace_folders(folders);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec!["<".to_string()]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                semantic_tokens_provider: Some(SemanticTokensServerCapabilities::SemanticTokensOptions(
                    SemanticTokensOptions {
                        legend: legend(),
                        full: Some(SemanticTokensFullOptions::Bool(true)),
                        range: Some(true),
                        ..Default::default()
                    },
                )),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    /// Handles the LSP initialized notification.
    async fn initialized(&self, _params: InitializedParams) {
        info!("Initialized with workspace folders {:?}", self.registry.workspace_folders());
    }

    /// Handles the LSP shutdown request.
    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        info!("Opening document: URI={}, version={}", document.uri, document.version);
        let id = self.next_document_id();
        let lsp_document = LspDocument::new(id, document.uri.clone(), &document.text, document.version);
        self.documents_by_uri.insert(document.uri, Arc::new(lsp_document));
    }

    /// Handles changes to a text document, applying full or incremental updates in order.
    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        debug!("textDocument/didChange: URI={}, version={}", uri, version);
        match self.document(&uri) {
            Some(document) => {
                if !document.apply(params.content_changes, version).await {
                    warn!("Failed to apply changes to document with URI={}", uri);
                }
            }
            None => warn!("Failed to find document with URI={}", uri),
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        match self.documents_by_uri.remove(&uri) {
            Some((_, document)) => info!("Closed document: {}, id: {}", uri, document.id),
            None => warn!("Failed to find document with URI={}", uri),
        }
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        let removed = file_paths(params.event.removed.iter().map(|f| &f.uri));
        let added = file_paths(params.event.added.iter().map(|f| &f.uri));
        info!("Workspace folders changed: +{:?} -{:?}", added, removed);

        let mut folders = self.registry.workspace_folders();
        folders.retain(|folder| !removed.contains(folder));
        for folder in added {
            if !folders.contains(&folder) {
                folders.push(folder);
            }
        }
        self.registry.set_workspace_folders(folders);
        self.registry.invalidate();
    }

    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some(document) = self.document(&uri) else {
            warn!("Completion for unknown document {}", uri);
            return Ok(None);
        };
        let snapshot = document.snapshot().await;
        let components = self.component_map_for(&uri).await;

        let outcome = complete(&snapshot, components.as_deref(), position, self.config_loader.as_ref()).await;
        let items = match outcome {
            CompletionOutcome::NoScope => {
                self.advise(NO_SCOPE_ADVISORY);
                Vec::new()
            }
            CompletionOutcome::Items(items) => items,
        };
        debug!("Returning {} completion items for {}", items.len(), uri);
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn semantic_tokens_full(&self, params: SemanticTokensParams) -> LspResult<Option<SemanticTokensResult>> {
        let uri = params.text_document.uri;
        debug!("Semantic tokens request for: {}", uri);
        let Some(document) = self.document(&uri) else {
            return Ok(None);
        };
        let snapshot = document.snapshot().await;
        let components = self.component_map_for(&uri).await;

        let tokens = semantic_tokens(&snapshot, components.as_deref(), None, self.config_loader.as_ref()).await;
        debug!("Generated {} semantic tokens", tokens.data.len());
        Ok(Some(SemanticTokensResult::Tokens(tokens)))
    }

    async fn semantic_tokens_range(
        &self,
        params: SemanticTokensRangeParams,
    ) -> LspResult<Option<SemanticTokensRangeResult>> {
        let uri = params.text_document.uri;
        debug!("Semantic tokens range request for: {} {:?}", uri, params.range);
        let Some(document) = self.document(&uri) else {
            return Ok(None);
        };
        let snapshot = document.snapshot().await;
        let components = self.component_map_for(&uri).await;

        let tokens =
            semantic_tokens(&snapshot, components.as_deref(), Some(params.range), self.config_loader.as_ref()).await;
        Ok(Some(SemanticTokensRangeResult::Tokens(tokens)))
    }
}
