//! Completion Resolver
//!
//! Component names are offered everywhere in lexicographic order. When the
//! cursor sits inside a known component that declares slots, the slot names
//! are offered too, ranked ahead of every component name through their sort
//! text.

use std::path::Path;

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, Position};
use tracing::trace;

use crate::annotation::parent_component;
use crate::components::{ComponentConfig, ComponentConfigLoader, ComponentMap};
use crate::document::TextDocument;

const SLOT_TIER: &str = "0";
const COMPONENT_TIER: &str = "1";

/// Result of a completion request.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// No build-configuration scope covers the document; the caller advises
    /// the user and answers with an empty list.
    NoScope,
    Items(Vec<CompletionItem>),
}

impl CompletionOutcome {
    pub fn into_items(self) -> Vec<CompletionItem> {
        match self {
            CompletionOutcome::NoScope => Vec::new(),
            CompletionOutcome::Items(items) => items,
        }
    }
}

fn component_item(name: &str) -> CompletionItem {
    CompletionItem {
        label: name.to_string(),
        kind: Some(CompletionItemKind::CLASS),
        sort_text: Some(format!("{}_{}", COMPONENT_TIER, name)),
        ..Default::default()
    }
}

fn slot_item(slot: &str, owner: &str) -> CompletionItem {
    CompletionItem {
        label: slot.to_string(),
        kind: Some(CompletionItemKind::FIELD),
        detail: Some(format!("slot of <{}>", owner)),
        sort_text: Some(format!("{}_{}", SLOT_TIER, slot)),
        ..Default::default()
    }
}

/// The component tier plus, when `slots_of` yields a configuration for the
/// enclosing component, the slot tier.
pub fn complete_with<F>(
    document: &TextDocument,
    components: Option<&ComponentMap>,
    position: Position,
    slots_of: F,
) -> CompletionOutcome
where
    F: FnOnce(&str, &Path) -> Option<ComponentConfig>,
{
    let Some(components) = components else {
        return CompletionOutcome::NoScope;
    };

    let mut items: Vec<CompletionItem> = components.sorted_names().into_iter().map(component_item).collect();

    if let Some(parent) = parent_component(document, position, components) {
        trace!("Completion inside <{}>", parent);
        if let Some(config) = components.get(&parent).and_then(|path| slots_of(&parent, path)) {
            items.extend(config.slots().iter().map(|slot| slot_item(slot, &parent)));
        }
    }

    // Stable: slots keep their declared order within the tier.
    items.sort_by(|a, b| a.sort_text.cmp(&b.sort_text));
    CompletionOutcome::Items(items)
}

/// Resolves completions, loading the parent's slot configuration on demand.
pub async fn complete(
    document: &TextDocument,
    components: Option<&ComponentMap>,
    position: Position,
    loader: &dyn ComponentConfigLoader,
) -> CompletionOutcome {
    let parent_config = match components {
        Some(components) => match parent_component(document, position, components) {
            Some(parent) => match components.get(&parent) {
                Some(path) => loader.load(path).await.map(|config| (parent, config)),
                None => None,
            },
            None => None,
        },
        None => None,
    };

    complete_with(document, components, position, move |name, _| {
        parent_config.filter(|(parent, _)| parent == name).map(|(_, config)| config)
    })
}
