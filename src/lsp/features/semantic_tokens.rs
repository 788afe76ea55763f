//! Semantic tokens for component tags and slot markers.

use tower_lsp::lsp_types::{Range, SemanticTokens};

use crate::annotation::{annotate, encode};
use crate::components::{ComponentConfigLoader, ComponentMap};
use crate::document::TextDocument;

/// Annotates `document` (or just `range`) and encodes the result. Without a
/// component scope the token data is empty.
pub async fn semantic_tokens(
    document: &TextDocument,
    components: Option<&ComponentMap>,
    range: Option<Range>,
    loader: &dyn ComponentConfigLoader,
) -> SemanticTokens {
    let data = match components {
        Some(components) => {
            let spans = annotate(document, components, loader, range).await;
            encode(&spans)
        }
        None => Vec::new(),
    };
    SemanticTokens { result_id: None, data }
}
