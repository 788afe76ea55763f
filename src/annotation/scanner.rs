//! Token Scanner / Annotator
//!
//! Finds component tags and slot markers in a document (or a sub-range of
//! it) and classifies them into [`Span`]s:
//!
//! 1. Every known component name is searched as a whole word. An occurrence
//!    counts as a tag only when directly preceded by `<` or `</`; anything
//!    else (plain text, attribute values) is ignored. Components seen as tags
//!    are the "used" components.
//! 2. For each used component, each of its slot names is searched the same
//!    way. A slot occurrence is kept only when the Parent Tag Locator places
//!    it inside that component; a same-named slot of another component is
//!    dropped.
//! 3. All spans are sorted by `(line, start_char)`.
//!
//! A tag span covers the `<` or `</` through the tag's terminating `>`,
//! attributes included. Quoted values may hold `>`. When the tag is not
//! closed on its own line the span stops after the name, since a token
//! cannot cross a line break.
//!
//! The synchronous [`annotate_with`] takes slot configurations from a
//! closure so it can run on pre-fetched inputs; [`annotate`] loads them
//! through a [`ComponentConfigLoader`].

use std::collections::BTreeSet;
use std::ops::Range as OffsetRange;
use std::path::Path;

use futures::future::join_all;
use tower_lsp::lsp_types::Range;
use tracing::{debug, trace};

use super::parent_tag::{TagStack, find_tag_end, is_identifier_char};
use crate::components::{ComponentConfig, ComponentConfigLoader, ComponentMap};
use crate::document::{TextDocument, is_line_break};

/// Classification of a span; the discriminant is its index in the token legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpanKind {
    ComponentTag = 0,
    SlotMarker = 1,
}

impl SpanKind {
    pub fn token_type_index(self) -> u32 {
        self as u32
    }
}

/// A classified region of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: u32,
    pub start_char: u32,
    pub length: u32,
    pub kind: SpanKind,
}

/// A bracket-prefixed occurrence of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TagOccurrence {
    /// Offset of the `<`
    start: usize,
    /// Offset just past the terminating `>`, or past the name when the tag
    /// is not closed on its line
    end: usize,
    name_start: usize,
    closing: bool,
}

/// Offsets of whole-word occurrences of `word` lying inside `bounds`.
///
/// Word boundaries are checked against the full text, so a name cut by the
/// start or end of the range is not mistaken for a whole word.
pub(crate) fn find_word_occurrences(text: &[char], word: &[char], bounds: OffsetRange<usize>) -> Vec<usize> {
    let mut found = Vec::new();
    let len = word.len();
    let end = bounds.end.min(text.len());
    if len == 0 || end < len {
        return found;
    }

    let mut index = bounds.start;
    while index + len <= end {
        if text[index..index + len] == *word {
            let bounded_left = index == 0 || !is_identifier_char(text[index - 1]);
            let bounded_right = index + len == text.len() || !is_identifier_char(text[index + len]);
            if bounded_left && bounded_right {
                found.push(index);
                index += len;
                continue;
            }
        }
        index += 1;
    }
    found
}

/// Classifies the occurrence at `name_start` by the characters before it on
/// its line. `</` is checked before `<`.
fn tag_occurrence(text: &[char], name_start: usize, name_len: usize) -> Option<TagOccurrence> {
    let (start, closing) = if name_start >= 2 && text[name_start - 2] == '<' && text[name_start - 1] == '/' {
        (name_start - 2, true)
    } else if name_start >= 1 && text[name_start - 1] == '<' {
        (name_start - 1, false)
    } else {
        return None;
    };

    let name_end = name_start + name_len;
    let line_end = text[name_end..]
        .iter()
        .position(|&c| is_line_break(c))
        .map_or(text.len(), |at| name_end + at);
    let end = find_tag_end(text, name_end, line_end, !closing).unwrap_or(name_end);
    Some(TagOccurrence { start, end, name_start, closing })
}

/// Scanning state shared by the tag and slot passes of one annotation.
pub struct Annotator<'a> {
    document: &'a TextDocument,
    components: &'a ComponentMap,
    text: Vec<char>,
    bounds: OffsetRange<usize>,
}

impl<'a> Annotator<'a> {
    pub fn new(document: &'a TextDocument, components: &'a ComponentMap, range: Option<Range>) -> Self {
        let bounds = match range {
            Some(range) => document.offset_range(range),
            None => 0..document.len_chars(),
        };
        Self { document, components, text: document.chars(), bounds }
    }

    fn span(&self, occurrence: &TagOccurrence, kind: SpanKind) -> Span {
        let position = self.document.position_at(occurrence.start);
        Span {
            line: position.line,
            start_char: position.character,
            length: self.document.utf16_len(occurrence.start..occurrence.end) as u32,
            kind,
        }
    }

    fn occurrences_of(&self, name: &str) -> Vec<TagOccurrence> {
        let word: Vec<char> = name.chars().collect();
        find_word_occurrences(&self.text, &word, self.bounds.clone())
            .into_iter()
            .filter_map(|offset| tag_occurrence(&self.text, offset, word.len()))
            .collect()
    }

    /// Tag spans for every known component, plus the names actually used as tags.
    pub fn component_tags(&self) -> (Vec<Span>, BTreeSet<String>) {
        let mut spans = Vec::new();
        let mut used = BTreeSet::new();
        for name in self.components.sorted_names() {
            let before = spans.len();
            spans.extend(
                self.occurrences_of(name)
                    .iter()
                    .map(|occurrence| self.span(occurrence, SpanKind::ComponentTag)),
            );
            if spans.len() > before {
                trace!("Component '{}' used {} times", name, spans.len() - before);
                used.insert(name.to_string());
            }
        }
        (spans, used)
    }

    /// Slot marker spans for one used component.
    ///
    /// Opening markers are checked at the name (the marker itself is not yet
    /// complete there); closing markers just past the tag, after the marker
    /// has been closed again.
    pub fn slot_markers(&self, component: &str, config: &ComponentConfig) -> Vec<Span> {
        let mut spans = Vec::new();
        for slot in config.slots() {
            // Occurrences come in increasing order, so one resumable stack
            // serves the whole pass.
            let mut stack = TagStack::new(&self.text);
            for occurrence in self.occurrences_of(slot) {
                let checked_at = if occurrence.closing { occurrence.end } else { occurrence.name_start };
                stack.advance_to(checked_at);
                let owner = stack.innermost_matching(|name| self.components.contains(name));
                if owner == Some(component) {
                    spans.push(self.span(&occurrence, SpanKind::SlotMarker));
                } else {
                    trace!("Slot '{}' at {} belongs to {:?}, not {}", slot, occurrence.start, owner, component);
                }
            }
        }
        spans
    }
}

/// Orders spans by position; ties keep discovery order.
pub fn sort_spans(spans: &mut [Span]) {
    spans.sort_by_key(|span| (span.line, span.start_char));
}

/// Annotates with slot configurations supplied by `slots_of`, which is
/// called once per used component with its name and defining path.
pub fn annotate_with<F>(
    document: &TextDocument,
    components: &ComponentMap,
    range: Option<Range>,
    mut slots_of: F,
) -> Vec<Span>
where
    F: FnMut(&str, &Path) -> Option<ComponentConfig>,
{
    if components.is_empty() {
        return Vec::new();
    }
    let annotator = Annotator::new(document, components, range);
    let (mut spans, used) = annotator.component_tags();

    for component in &used {
        let Some(path) = components.get(component) else {
            continue;
        };
        if let Some(config) = slots_of(component, path) {
            spans.extend(annotator.slot_markers(component, &config));
        }
    }

    sort_spans(&mut spans);
    spans
}

/// Annotates a document, loading slot configurations for the components it uses.
pub async fn annotate(
    document: &TextDocument,
    components: &ComponentMap,
    loader: &dyn ComponentConfigLoader,
    range: Option<Range>,
) -> Vec<Span> {
    if components.is_empty() {
        return Vec::new();
    }
    let annotator = Annotator::new(document, components, range);
    let (mut spans, used) = annotator.component_tags();

    let configs = join_all(used.iter().filter_map(|component| {
        let path = components.get(component)?;
        Some(async move { (component.as_str(), loader.load(path).await) })
    }))
    .await;

    for (component, config) in configs {
        match config {
            Some(config) => spans.extend(annotator.slot_markers(component, &config)),
            None => debug!("Component '{}' contributes no slots", component),
        }
    }

    sort_spans(&mut spans);
    spans
}
