//! Token Encoder
//!
//! LSP semantic tokens use delta encoding where each token's position is
//! relative to the previous token, reducing payload size. Each span becomes
//! five integers: `deltaLine`, `deltaStartChar`, `length`, `tokenType`,
//! `tokenModifiers` (always 0 here).
//!
//! Input must already be sorted by `(line, start_char)`; the encoder does not
//! re-sort.

use tower_lsp::lsp_types::{SemanticToken, SemanticTokenType, SemanticTokensLegend};

use super::scanner::Span;

/// Token types in legend order; indices match [`super::SpanKind`].
pub const TOKEN_TYPES: &[SemanticTokenType] = &[SemanticTokenType::CLASS, SemanticTokenType::PROPERTY];

pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: TOKEN_TYPES.to_vec(),
        token_modifiers: vec![],
    }
}

/// Helper for building semantic tokens using delta encoding
pub struct SemanticTokensBuilder {
    tokens: Vec<SemanticToken>,
    prev_line: u32,
    prev_start: u32,
}

impl Default for SemanticTokensBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticTokensBuilder {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            prev_line: 0,
            prev_start: 0,
        }
    }

    /// Add a semantic token with absolute position
    pub fn push(&mut self, line: u32, start: u32, length: u32, token_type: u32) {
        debug_assert!(
            (line, start) >= (self.prev_line, self.prev_start),
            "semantic tokens must be pushed in position order"
        );
        let delta_line = line.saturating_sub(self.prev_line);
        let delta_start = if delta_line == 0 {
            start.saturating_sub(self.prev_start)
        } else {
            start
        };

        self.tokens.push(SemanticToken {
            delta_line,
            delta_start,
            length,
            token_type,
            token_modifiers_bitset: 0,
        });

        self.prev_line = line;
        self.prev_start = start;
    }

    pub fn push_span(&mut self, span: &Span) {
        self.push(span.line, span.start_char, span.length, span.kind.token_type_index());
    }

    pub fn build(self) -> Vec<SemanticToken> {
        self.tokens
    }
}

/// Delta-encodes position-sorted spans.
pub fn encode(spans: &[Span]) -> Vec<SemanticToken> {
    let mut builder = SemanticTokensBuilder::new();
    for span in spans {
        builder.push_span(span);
    }
    builder.build()
}

/// The flat integer stream a client decodes, five integers per token.
pub fn flatten(tokens: &[SemanticToken]) -> Vec<u32> {
    tokens
        .iter()
        .flat_map(|t| [t.delta_line, t.delta_start, t.length, t.token_type, t.token_modifiers_bitset])
        .collect()
}
