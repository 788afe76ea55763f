//! End-to-end protocol tests against the in-process backend.
//!
//! Each test builds a temporary workspace with a Vite config and a few
//! component packages, then drives the `LanguageServer` handlers directly.

use std::fs;
use std::path::Path;

use indoc::indoc;
use tempfile::TempDir;
use tower_lsp::lsp_types::{
    CompletionItemKind, CompletionParams, CompletionResponse, DidChangeTextDocumentParams,
    DidChangeWorkspaceFoldersParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams, InitializeParams,
    Position, Range, SemanticTokenType, SemanticTokensFullOptions, SemanticTokensParams, SemanticTokensRangeParams,
    SemanticTokensRangeResult, SemanticTokensResult, SemanticTokensServerCapabilities, TextDocumentContentChangeEvent,
    TextDocumentIdentifier, TextDocumentItem, TextDocumentPositionParams, Url, VersionedTextDocumentIdentifier,
    WorkspaceFolder, WorkspaceFoldersChangeEvent,
};
use tower_lsp::{ClientSocket, LanguageServer, LspService};

use component_language_server::annotation::encoder::flatten;
use component_language_server::config::ServerConfig;
use component_language_server::lsp::ComponentBackend;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn component_workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "vite.config.ts", "export default {}\n");
    write(
        dir.path(),
        "packages/card/package.json",
        r#"{"name": "@ui/Card", "component": {"slots": ["Header", "Footer"]}}"#,
    );
    write(dir.path(), "packages/button/package.json", r#"{"name": "Button"}"#);
    fs::create_dir_all(dir.path().join("src")).unwrap();
    dir
}

fn folder(path: &Path) -> WorkspaceFolder {
    WorkspaceFolder { uri: Url::from_directory_path(path).unwrap(), name: "workspace".to_string() }
}

async fn start(workspace: Option<&Path>) -> (LspService<ComponentBackend>, ClientSocket) {
    let (service, socket) = LspService::new(|client| ComponentBackend::new(client, ServerConfig::default()));
    let params = InitializeParams {
        workspace_folders: workspace.map(|path| vec![folder(path)]),
        ..Default::default()
    };
    service.inner().initialize(params).await.unwrap();
    (service, socket)
}

async fn open(backend: &ComponentBackend, path: &Path, text: &str) -> Url {
    let uri = Url::from_file_path(path).unwrap();
    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem::new(uri.clone(), "vue".to_string(), 1, text.to_string()),
        })
        .await;
    uri
}

async fn tokens(backend: &ComponentBackend, uri: &Url) -> Vec<u32> {
    let params = SemanticTokensParams {
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
        text_document: TextDocumentIdentifier::new(uri.clone()),
    };
    match backend.semantic_tokens_full(params).await.unwrap() {
        Some(SemanticTokensResult::Tokens(tokens)) => flatten(&tokens.data),
        other => panic!("unexpected semantic tokens result: {:?}", other),
    }
}

async fn completion_labels(backend: &ComponentBackend, uri: &Url, position: Position) -> Vec<String> {
    let params = CompletionParams {
        text_document_position: TextDocumentPositionParams::new(TextDocumentIdentifier::new(uri.clone()), position),
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
        context: None,
    };
    match backend.completion(params).await.unwrap() {
        Some(CompletionResponse::Array(items)) => items.into_iter().map(|item| item.label).collect(),
        other => panic!("unexpected completion result: {:?}", other),
    }
}

const CARD_DOCUMENT: &str = indoc! {r#"
    <Card>
      <Header>Title</Header>
      <Button/>
    </Card>
"#};

#[tokio::test]
async fn test_initialize_advertises_capabilities() {
    let (service, _socket) = LspService::new(|client| ComponentBackend::new(client, ServerConfig::default()));
    let result = service.inner().initialize(InitializeParams::default()).await.unwrap();
    let capabilities = result.capabilities;

    let completion = capabilities.completion_provider.unwrap();
    assert_eq!(completion.trigger_characters, Some(vec!["<".to_string()]));
    assert_eq!(completion.resolve_provider, Some(false));

    match capabilities.semantic_tokens_provider.unwrap() {
        SemanticTokensServerCapabilities::SemanticTokensOptions(options) => {
            assert_eq!(options.legend.token_types, vec![SemanticTokenType::CLASS, SemanticTokenType::PROPERTY]);
            assert!(options.legend.token_modifiers.is_empty());
            assert_eq!(options.full, Some(SemanticTokensFullOptions::Bool(true)));
            assert_eq!(options.range, Some(true));
        }
        other => panic!("unexpected semantic tokens capability: {:?}", other),
    }
}

#[tokio::test]
async fn test_semantic_tokens_for_components_and_slots() {
    let workspace = component_workspace();
    let (service, _socket) = start(Some(workspace.path())).await;
    let backend = service.inner();
    let uri = open(backend, &workspace.path().join("src/App.vue"), CARD_DOCUMENT).await;

    assert_eq!(
        tokens(backend, &uri).await,
        vec![
            0, 0, 6, 0, 0, // <Card>
            1, 2, 8, 1, 0, // <Header>
            0, 13, 9, 1, 0, // </Header>
            1, 2, 9, 0, 0, // <Button/>
            1, 0, 7, 0, 0, // </Card>
        ]
    );
}

#[tokio::test]
async fn test_semantic_tokens_range_reports_document_positions() {
    let workspace = component_workspace();
    let (service, _socket) = start(Some(workspace.path())).await;
    let backend = service.inner();
    let uri = open(backend, &workspace.path().join("src/App.vue"), CARD_DOCUMENT).await;

    let params = SemanticTokensRangeParams {
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
        text_document: TextDocumentIdentifier::new(uri),
        range: Range::new(Position::new(2, 0), Position::new(3, 7)),
    };
    let data = match backend.semantic_tokens_range(params).await.unwrap() {
        Some(SemanticTokensRangeResult::Tokens(tokens)) => flatten(&tokens.data),
        other => panic!("unexpected range result: {:?}", other),
    };
    assert_eq!(data, vec![2, 2, 9, 0, 0, 1, 0, 7, 0, 0]);
}

#[tokio::test]
async fn test_completion_ranks_slots_inside_parent() {
    let workspace = component_workspace();
    let (service, _socket) = start(Some(workspace.path())).await;
    let backend = service.inner();
    let uri = open(backend, &workspace.path().join("src/App.vue"), CARD_DOCUMENT).await;

    assert_eq!(
        completion_labels(backend, &uri, Position::new(2, 2)).await,
        vec!["Header", "Footer", "Button", "Card"]
    );
    assert_eq!(completion_labels(backend, &uri, Position::new(4, 0)).await, vec!["Button", "Card"]);
}

#[tokio::test]
async fn test_completion_item_kinds() {
    let workspace = component_workspace();
    let (service, _socket) = start(Some(workspace.path())).await;
    let backend = service.inner();
    let uri = open(backend, &workspace.path().join("src/App.vue"), "<Card>\n").await;

    let params = CompletionParams {
        text_document_position: TextDocumentPositionParams::new(TextDocumentIdentifier::new(uri), Position::new(1, 0)),
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
        context: None,
    };
    let Some(CompletionResponse::Array(items)) = backend.completion(params).await.unwrap() else {
        panic!("expected an item array");
    };
    let kinds: Vec<_> = items.iter().map(|item| (item.label.as_str(), item.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            ("Header", Some(CompletionItemKind::FIELD)),
            ("Footer", Some(CompletionItemKind::FIELD)),
            ("Button", Some(CompletionItemKind::CLASS)),
            ("Card", Some(CompletionItemKind::CLASS)),
        ]
    );
}

#[tokio::test]
async fn test_without_scope_results_are_empty() {
    let workspace = tempfile::tempdir().unwrap();
    write(workspace.path(), "packages/card/package.json", r#"{"name": "Card"}"#);
    let (service, _socket) = start(Some(workspace.path())).await;
    let backend = service.inner();
    let uri = open(backend, &workspace.path().join("App.vue"), "<Card></Card>").await;

    assert!(completion_labels(backend, &uri, Position::new(0, 6)).await.is_empty());
    assert!(tokens(backend, &uri).await.is_empty());
}

#[tokio::test]
async fn test_non_file_documents_are_degraded() {
    let (service, _socket) = start(None).await;
    let backend = service.inner();
    let uri = Url::parse("untitled:Untitled-1").unwrap();
    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem::new(uri.clone(), "vue".to_string(), 1, "<Card>".to_string()),
        })
        .await;

    assert!(tokens(backend, &uri).await.is_empty());
}

#[tokio::test]
async fn test_changes_are_reflected_in_tokens() {
    let workspace = component_workspace();
    let (service, _socket) = start(Some(workspace.path())).await;
    let backend = service.inner();
    let uri = open(backend, &workspace.path().join("src/App.vue"), "<Card>\n</Card>").await;
    assert_eq!(tokens(backend, &uri).await, vec![0, 0, 6, 0, 0, 1, 0, 7, 0, 0]);

    backend
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier::new(uri.clone(), 2),
            content_changes: vec![TextDocumentContentChangeEvent {
                range: Some(Range::new(Position::new(1, 0), Position::new(1, 0))),
                range_length: None,
                text: "<Footer/>\n".to_string(),
            }],
        })
        .await;
    assert_eq!(tokens(backend, &uri).await, vec![0, 0, 6, 0, 0, 1, 0, 9, 1, 0, 1, 0, 7, 0, 0]);

    backend
        .did_close(DidCloseTextDocumentParams { text_document: TextDocumentIdentifier::new(uri.clone()) })
        .await;
    let params = SemanticTokensParams {
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
        text_document: TextDocumentIdentifier::new(uri),
    };
    assert!(backend.semantic_tokens_full(params).await.unwrap().is_none());
}

#[tokio::test]
async fn test_positions_use_utf16_columns() {
    let workspace = component_workspace();
    let (service, _socket) = start(Some(workspace.path())).await;
    let backend = service.inner();
    let uri = open(backend, &workspace.path().join("src/App.vue"), "😀<Card title=\"x\"></Card>").await;
    assert_eq!(tokens(backend, &uri).await, vec![0, 2, 16, 0, 0, 0, 16, 7, 0, 0]);

    // Column 18 is just past `>` in UTF-16 units.
    backend
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier::new(uri.clone(), 2),
            content_changes: vec![TextDocumentContentChangeEvent {
                range: Some(Range::new(Position::new(0, 18), Position::new(0, 18))),
                range_length: None,
                text: "<Header/>".to_string(),
            }],
        })
        .await;
    assert_eq!(
        tokens(backend, &uri).await,
        vec![0, 2, 16, 0, 0, 0, 16, 9, 1, 0, 0, 9, 7, 0, 0]
    );
}

#[tokio::test]
async fn test_workspace_folder_change_refreshes_components() {
    let workspace = component_workspace();
    let (service, _socket) = start(Some(workspace.path())).await;
    let backend = service.inner();
    let uri = open(backend, &workspace.path().join("src/App.vue"), "<Dialog></Dialog>").await;
    assert!(tokens(backend, &uri).await.is_empty());

    write(workspace.path(), "packages/dialog/package.json", r#"{"name": "Dialog"}"#);
    // Still within the registry's time-to-live.
    assert!(tokens(backend, &uri).await.is_empty());

    backend
        .did_change_workspace_folders(DidChangeWorkspaceFoldersParams {
            event: WorkspaceFoldersChangeEvent { added: vec![folder(workspace.path())], removed: vec![] },
        })
        .await;
    assert_eq!(tokens(backend, &uri).await, vec![0, 0, 8, 0, 0, 0, 8, 9, 0, 0]);
}
