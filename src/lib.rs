pub mod annotation;
pub mod components;
pub mod config;
pub mod document;
pub mod logging;
pub mod lsp;
