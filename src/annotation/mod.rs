//! Lightweight markup annotation
//!
//! Component usages and the slot markers nested inside them are found with
//! plain text search plus a forward tag-stack scan. No parser is involved, so
//! half-typed or malformed markup still annotates as far as it can.
//!
//! - [`parent_tag`] locates the nearest enclosing component at an offset
//! - [`scanner`] produces the spans to highlight
//! - [`encoder`] turns sorted spans into LSP semantic tokens

pub mod encoder;
pub mod parent_tag;
pub mod scanner;

pub use encoder::{SemanticTokensBuilder, encode, legend};
pub use parent_tag::{TagStack, parent_component, parent_tag_of};
pub use scanner::{Annotator, Span, SpanKind, annotate, annotate_with, sort_spans};
