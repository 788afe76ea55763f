//! Protocol features built on the annotation engine.

pub mod completion;
pub mod semantic_tokens;

pub use completion::{CompletionOutcome, complete, complete_with};
pub use semantic_tokens::semantic_tokens;
