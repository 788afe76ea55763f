//! Parent Tag Locator
//!
//! Answers "which component tag encloses this offset" without a parser. A
//! [`TagStack`] walks the text forward, simulating a stack of open tags:
//!
//! - `<Name ...>` pushes `Name`, unless the tag ends with `/>`
//! - `</Name>` pops down to the innermost open `Name`; a close with no
//!   matching open tag is ignored
//! - `<!-- ... -->`, `<!...>` and `<?...>` are skipped
//! - a tag that is not finished by the scan limit does not count
//!
//! Tags that never close stay open through the end of the scanned text, and
//! nothing in malformed input makes the scan fail. Whitespace (including line
//! breaks) may separate `<` or `</` from the tag name, and quoted attribute
//! values may contain `>`.
//!
//! The stack is resumable: advancing to a later offset continues from where
//! the previous scan stopped, so a caller that queries offsets in increasing
//! order pays for one pass over the text.

use tower_lsp::lsp_types::Position;

use crate::components::ComponentMap;
use crate::document::TextDocument;

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_tag_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_tag_name_char(c: char) -> bool {
    is_identifier_char(c) || matches!(c, '-' | '.' | ':')
}

/// Index just past the first `>` at or after `from`, or `None` when the limit
/// comes first.
///
/// With `quoted` set, a quote opens an attribute value only when it follows
/// `=` (whitespace allowed between), so `title=it's` does not swallow the
/// rest of the text.
pub(crate) fn find_tag_end(text: &[char], from: usize, limit: usize, quoted: bool) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut after_equals = false;
    for (index, &c) in text.iter().enumerate().take(limit).skip(from) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if quoted && after_equals && (c == '"' || c == '\'') => quote = Some(c),
            None if c == '>' => return Some(index + 1),
            None => {}
        }
        if quote.is_none() && !c.is_whitespace() {
            after_equals = c == '=';
        }
    }
    None
}

/// Outcome of trying to read one markup construct at a `<`.
enum Construct {
    Open { name: String, end: usize },
    SelfClosing { end: usize },
    Close { name: String, end: usize },
    Skipped { end: usize },
    /// Not markup; the `<` is plain text.
    Text,
    /// Markup that the scan limit cuts off.
    Incomplete,
}

#[derive(Debug, Clone)]
pub struct TagStack<'a> {
    text: &'a [char],
    cursor: usize,
    open: Vec<String>,
}

impl<'a> TagStack<'a> {
    pub fn new(text: &'a [char]) -> Self {
        Self { text, cursor: 0, open: Vec::new() }
    }

    /// Open tags, outermost first.
    pub fn open_tags(&self) -> &[String] {
        &self.open
    }

    /// Innermost open tag accepted by `predicate`.
    pub fn innermost_matching<F>(&self, predicate: F) -> Option<&str>
    where
        F: Fn(&str) -> bool,
    {
        self.open.iter().rev().map(String::as_str).find(|name| predicate(name))
    }

    /// Simulates every tag completed before `offset`. Moving backwards
    /// restarts from the beginning of the text.
    pub fn advance_to(&mut self, offset: usize) {
        let limit = offset.min(self.text.len());
        if limit < self.cursor {
            self.cursor = 0;
            self.open.clear();
        }

        while let Some(relative) = self.text[self.cursor..limit].iter().position(|&c| c == '<') {
            let start = self.cursor + relative;
            match self.read_construct(start, limit) {
                Construct::Open { name, end } => {
                    self.open.push(name);
                    self.cursor = end;
                }
                Construct::Close { name, end } => {
                    if let Some(index) = self.open.iter().rposition(|open| *open == name) {
                        self.open.truncate(index);
                    }
                    self.cursor = end;
                }
                Construct::SelfClosing { end } | Construct::Skipped { end } => self.cursor = end,
                Construct::Text => self.cursor = start + 1,
                Construct::Incomplete => {
                    // Resume at this `<` once the limit moves past it.
                    self.cursor = start;
                    return;
                }
            }
        }
        self.cursor = limit;
    }

    fn starts_with_at(&self, at: usize, limit: usize, pattern: &str) -> bool {
        let mut index = at;
        for expected in pattern.chars() {
            if index >= limit || self.text[index] != expected {
                return false;
            }
            index += 1;
        }
        true
    }

    fn skip_whitespace(&self, mut index: usize, limit: usize) -> usize {
        while index < limit && self.text[index].is_whitespace() {
            index += 1;
        }
        index
    }

    fn find_tag_end(&self, from: usize, limit: usize, quoted: bool) -> Option<usize> {
        find_tag_end(self.text, from, limit, quoted)
    }

    fn read_name(&self, from: usize, limit: usize) -> (String, usize) {
        let mut end = from;
        if end < limit && is_tag_name_start(self.text[end]) {
            end += 1;
            while end < limit && is_tag_name_char(self.text[end]) {
                end += 1;
            }
        }
        (self.text[from..end].iter().collect(), end)
    }

    fn read_construct(&self, start: usize, limit: usize) -> Construct {
        let after = start + 1;
        if after >= limit {
            return Construct::Incomplete;
        }

        if self.starts_with_at(after, limit, "!--") {
            let body = after + 3;
            return match (body..limit).find(|&i| self.starts_with_at(i, limit, "-->")) {
                Some(close) => Construct::Skipped { end: close + 3 },
                None => Construct::Incomplete,
            };
        }
        if matches!(self.text[after], '!' | '?') {
            return match self.find_tag_end(after, limit, false) {
                Some(end) => Construct::Skipped { end },
                None => Construct::Incomplete,
            };
        }

        let mut index = self.skip_whitespace(after, limit);
        let closing = index < limit && self.text[index] == '/';
        if closing {
            index = self.skip_whitespace(index + 1, limit);
        }
        if index >= limit {
            return Construct::Incomplete;
        }

        let (name, name_end) = self.read_name(index, limit);
        if name.is_empty() {
            return Construct::Text;
        }
        if name_end >= limit {
            return Construct::Incomplete;
        }
        // `<Card-` is a longer name being typed; `<Card>` and `<Card attr` are not.
        let next = self.text[name_end];
        if !(next.is_whitespace() || next == '>' || next == '/') {
            return Construct::Text;
        }

        let Some(end) = self.find_tag_end(name_end, limit, !closing) else {
            return Construct::Incomplete;
        };
        if closing {
            return Construct::Close { name, end };
        }

        let before_bracket = self.text[name_end..end - 1]
            .iter()
            .rev()
            .find(|c| !c.is_whitespace());
        if before_bracket == Some(&'/') {
            Construct::SelfClosing { end }
        } else {
            Construct::Open { name, end }
        }
    }
}

/// Innermost open tag at `offset` accepted by `is_component`.
///
/// Open tags rejected by the predicate (plain elements, slot markers) are
/// transparent: the search continues outward past them.
pub fn parent_tag_of<F>(text: &[char], offset: usize, is_component: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let mut stack = TagStack::new(text);
    stack.advance_to(offset);
    stack.innermost_matching(is_component).map(str::to_string)
}

/// Name of the nearest enclosing, unclosed component tag at `position`.
pub fn parent_component(
    document: &TextDocument,
    position: Position,
    components: &ComponentMap,
) -> Option<String> {
    let text = document.chars();
    let offset = document.offset_at(position);
    parent_tag_of(&text, offset, |name| components.contains(name))
}
