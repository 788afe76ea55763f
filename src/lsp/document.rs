use ropey::Rope;

use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};

use crate::document::TextDocument;

pub use crate::lsp::models::{DocumentError, LspDocument, LspDocumentState};

impl LspDocumentState {
    pub fn new(uri: Url, text: &str, version: i32) -> Self {
        Self { uri, text: Rope::from_str(text), version }
    }

    /// Applies a list of content changes in order. Changes carrying an older
    /// (or equal) version are rejected and leave the text untouched.
    pub fn apply(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<(), DocumentError> {
        if version <= self.version {
            return Err(DocumentError::StaleVersion { version, current: self.version });
        }
        for change in changes {
            match change.range {
                Some(range) => {
                    // Positions past the end clamp the same way queries do.
                    let bounds = TextDocument::from_rope(self.text.clone()).offset_range(range);
                    self.text.remove(bounds.clone());
                    self.text.insert(bounds.start, &change.text);
                }
                None => self.text = Rope::from_str(&change.text),
            }
        }
        self.version = version;
        Ok(())
    }
}

impl LspDocument {
    pub fn new(id: u32, uri: Url, text: &str, version: i32) -> Self {
        Self {
            id,
            state: tokio::sync::RwLock::new(LspDocumentState::new(uri, text, version)),
        }
    }

    /// Returns the URI of the document.
    pub async fn uri(&self) -> Url {
        self.state.read().await.uri.clone()
    }

    /// Returns the current text of the document as a string.
    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    /// Returns the current version of the document.
    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Immutable copy of the current text for one request.
    pub async fn snapshot(&self) -> TextDocument {
        TextDocument::from_rope(self.state.read().await.text.clone())
    }

    /// Applies changes to the document; `false` when they were rejected.
    pub async fn apply(&self, changes: Vec<TextDocumentContentChangeEvent>, version: i32) -> bool {
        let mut state = self.state.write().await;
        match state.apply(changes, version) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Ignoring change to {}: {}", state.uri, e);
                false
            }
        }
    }
}
