//! Lenient HTML / XML fragment parser
//!
//! A single forward scan that builds nodes straight into the tree. It keeps
//! a stack of open elements and recovers from sloppy markup the way browsers
//! do for the common cases:
//!
//! - void elements (`br`, `img`, ...) never take children
//! - `script` / `style` bodies are raw text up to the matching end tag
//! - `li`, `p`, `option`, `tr`, `td`, `th`, `dt`, `dd` close implicitly
//! - end tags with no open counterpart are dropped
//! - elements still open at the end of input are closed
//!
//! Only a tag, comment or directive cut off by the end of input is an error.

use compact_str::CompactString;

use crate::attr::{Attrs, AttrsExt};
use crate::error::{GraftError, GraftResult};
use crate::node::{Element, NodeId, Tree};

use super::{MarkupParser, ParseOptions, decode_entities};

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

// =============================================================================
// HtmlParser
// =============================================================================

/// The bundled [`MarkupParser`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HtmlParser {
    pub options: ParseOptions,
}

impl HtmlParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Parser with XML rules
    pub fn xml() -> Self {
        Self::new(ParseOptions::XML)
    }
}

impl MarkupParser for HtmlParser {
    fn parse(&self, tree: &mut Tree, markup: &str, context: Option<NodeId>) -> GraftResult<NodeId> {
        let fragment = tree.create_fragment();

        // Content destined for a raw text element is not markup at all
        let raw_context = !self.options.xml_mode
            && context
                .and_then(|c| tree.element(c))
                .is_some_and(|e| is_raw_text_element(&e.tag));
        if raw_context {
            if !markup.is_empty() {
                let text = tree.create_text(markup);
                tree.push_child(fragment, text);
            }
            return Ok(fragment);
        }

        Builder {
            tree,
            options: self.options,
            src: markup,
            pos: 0,
            fragment,
            open: Vec::new(),
        }
        .run()?;

        log::trace!("parsed {} bytes into fragment {fragment}", markup.len());
        Ok(fragment)
    }
}

// =============================================================================
// Builder
// =============================================================================

struct Builder<'t, 's> {
    tree: &'t mut Tree,
    options: ParseOptions,
    src: &'s str,
    pos: usize,
    fragment: NodeId,
    /// Open elements above the fragment root
    open: Vec<NodeId>,
}

impl<'s> Builder<'_, 's> {
    fn run(mut self) -> GraftResult<()> {
        let src = self.src;
        while self.pos < src.len() {
            let rest = &src[self.pos..];
            let Some(lt) = rest.find('<') else {
                self.push_text(rest);
                break;
            };
            if lt > 0 {
                self.push_text(&rest[..lt]);
                self.pos += lt;
            }
            self.markup()?;
        }
        Ok(())
    }

    /// Dispatch on the construct starting at `self.pos` (always a `<`)
    fn markup(&mut self) -> GraftResult<()> {
        let src = self.src;
        let rest = &src[self.pos..];
        let next = rest.as_bytes().get(1).copied();

        if rest.starts_with(COMMENT_START) {
            self.comment()
        } else if matches!(next, Some(b'!' | b'?')) {
            self.directive()
        } else if next == Some(b'/') {
            self.end_tag()
        } else if next.is_some_and(|b| b.is_ascii_alphabetic()) {
            self.start_tag()
        } else {
            // A stray `<` is just text
            self.push_text("<");
            self.pos += 1;
            Ok(())
        }
    }

    fn comment(&mut self) -> GraftResult<()> {
        let (src, start) = (self.src, self.pos);
        let body_start = start + COMMENT_START.len();
        let Some(len) = src[body_start..].find(COMMENT_END) else {
            return Err(GraftError::parse(start, "unterminated comment"));
        };
        let comment = self.tree.create_comment(&src[body_start..body_start + len]);
        self.attach(comment);
        self.pos = body_start + len + COMMENT_END.len();
        Ok(())
    }

    fn directive(&mut self) -> GraftResult<()> {
        let (src, start) = (self.src, self.pos);
        let Some(len) = src[start..].find('>') else {
            return Err(GraftError::parse(start, "unterminated directive"));
        };
        let directive = self.tree.create_directive(&src[start + 1..start + len]);
        self.attach(directive);
        self.pos = start + len + 1;
        Ok(())
    }

    fn end_tag(&mut self) -> GraftResult<()> {
        let (src, start) = (self.src, self.pos);
        let Some(len) = src[start..].find('>') else {
            return Err(GraftError::parse(start, "unterminated end tag"));
        };
        let name = src[start + 2..start + len].trim();
        let name = self.normalize_name(name);
        self.pos = start + len + 1;

        match self.open.iter().rposition(|&id| self.is_open_tag(id, &name)) {
            Some(depth) => self.open.truncate(depth),
            None => log::debug!("dropping unmatched end tag </{name}> at {start}"),
        }
        Ok(())
    }

    fn start_tag(&mut self) -> GraftResult<()> {
        let start = self.pos;
        self.pos += 1;
        let name = self.read_name();
        let tag = self.normalize_name(name);

        let mut attrs = Attrs::new();
        let self_closing = self.attributes(start, &mut attrs)?;

        if !self.options.xml_mode {
            self.close_implied(&tag);
        }

        let element = self.tree.create_element(Element::with_attrs(tag.clone(), attrs));
        self.attach(element);

        let html = !self.options.xml_mode;
        if (self_closing && self.options.recognize_self_closing) || (html && is_void_element(&tag)) {
            return Ok(());
        }
        if html && is_raw_text_element(&tag) {
            self.raw_text(element, &tag);
            return Ok(());
        }
        self.open.push(element);
        Ok(())
    }

    /// Parse attributes up to the closing `>`; returns whether it was `/>`
    fn attributes(&mut self, tag_start: usize, attrs: &mut Attrs) -> GraftResult<bool> {
        let src = self.src;
        let bytes = src.as_bytes();
        loop {
            self.skip_whitespace();
            match bytes.get(self.pos) {
                None => return Err(GraftError::parse(tag_start, "unterminated start tag")),
                Some(b'>') => {
                    self.pos += 1;
                    return Ok(false);
                }
                Some(b'/') if bytes.get(self.pos + 1) == Some(&b'>') => {
                    self.pos += 2;
                    return Ok(true);
                }
                Some(b'/') => self.pos += 1,
                Some(_) => {
                    let name = self.read_name();
                    if name.is_empty() {
                        // Lone `=` or quote; skip it rather than loop forever
                        self.pos += 1;
                        continue;
                    }
                    let name = self.normalize_name(name);
                    let value = self.attribute_value(tag_start)?;
                    if !attrs.has_attr(&name) {
                        attrs.set_attr(name, value);
                    }
                }
            }
        }
    }

    fn attribute_value(&mut self, tag_start: usize) -> GraftResult<String> {
        self.skip_whitespace();
        if self.src.as_bytes().get(self.pos) != Some(&b'=') {
            return Ok(String::new());
        }
        self.pos += 1;
        self.skip_whitespace();

        let src = self.src;
        let rest = &src[self.pos..];
        let raw = match rest.as_bytes().first() {
            Some(&quote @ (b'"' | b'\'')) => {
                let Some(len) = rest[1..].find(quote as char) else {
                    return Err(GraftError::parse(tag_start, "unterminated attribute value"));
                };
                self.pos += len + 2;
                &rest[1..1 + len]
            }
            _ => {
                let len = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += len;
                &rest[..len]
            }
        };
        Ok(self.decode(raw))
    }

    /// Consume a raw text body and its end tag
    fn raw_text(&mut self, element: NodeId, tag: &str) {
        let src = self.src;
        let rest = &src[self.pos..];
        let (body, consumed) = match find_end_tag(rest, tag) {
            Some((body_len, total)) => (&rest[..body_len], total),
            None => (rest, rest.len()),
        };
        if !body.is_empty() {
            let text = self.tree.create_text(body);
            self.tree.push_child(element, text);
        }
        self.pos += consumed;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.fragment)
    }

    fn attach(&mut self, node: NodeId) {
        let parent = self.current();
        self.tree.push_child(parent, node);
    }

    fn push_text(&mut self, raw: &str) {
        let data = self.decode(raw);
        // Merge with a preceding text node (stray `<` splits otherwise)
        let parent = self.current();
        if let Some(last) = self.tree.last_child(parent) {
            if let Some(text) = self.tree.text_mut(last) {
                text.data.push_str(&data);
                return;
            }
        }
        let text = self.tree.create_text(data);
        self.tree.push_child(parent, text);
    }

    fn decode(&self, raw: &str) -> String {
        if self.options.decode_entities {
            decode_entities(raw).into_owned()
        } else {
            raw.to_owned()
        }
    }

    /// Pop open elements that the incoming tag closes implicitly
    fn close_implied(&mut self, incoming: &str) {
        while let Some(&top) = self.open.last() {
            let closes = self
                .tree
                .element(top)
                .is_some_and(|e| closes_implicitly(&e.tag, incoming));
            if !closes {
                break;
            }
            self.open.pop();
        }
    }

    fn is_open_tag(&self, id: NodeId, name: &str) -> bool {
        self.tree.element(id).is_some_and(|e| {
            if self.options.xml_mode {
                e.tag == name
            } else {
                e.is(name)
            }
        })
    }

    fn read_name(&mut self) -> &'s str {
        let src = self.src;
        let rest = &src[self.pos..];
        let len = rest
            .find(|c: char| c.is_ascii_whitespace() || matches!(c, '/' | '>' | '=' | '"' | '\''))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn normalize_name(&self, name: &str) -> CompactString {
        if self.options.lower_case_tags {
            CompactString::from(name.to_ascii_lowercase())
        } else {
            CompactString::from(name)
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_whitespace()).len();
    }
}

// =============================================================================
// Content model tables
// =============================================================================

/// Elements that never have content in HTML
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub(crate) fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

pub(crate) fn is_raw_text_element(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
}

/// Whether an open `open` element ends when an `incoming` start tag appears
fn closes_implicitly(open: &str, incoming: &str) -> bool {
    match open {
        "li" => incoming == "li",
        "p" => closes_paragraph(incoming),
        "option" => matches!(incoming, "option" | "optgroup"),
        "tr" => incoming == "tr",
        "td" | "th" => matches!(incoming, "td" | "th" | "tr"),
        "dt" | "dd" => matches!(incoming, "dt" | "dd"),
        _ => false,
    }
}

fn closes_paragraph(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "div"
            | "dl"
            | "fieldset"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

/// Find `</tag` (any case) followed by optional whitespace and `>`
///
/// Returns the body length and the total bytes consumed through the `>`.
fn find_end_tag(haystack: &str, tag: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let mut from = 0;
    while let Some(offset) = haystack[from..].find("</") {
        let at = from + offset;
        let name_start = at + 2;
        let name_end = name_start + tag.len();
        let name_matches = bytes
            .get(name_start..name_end)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag.as_bytes()));
        if name_matches {
            let tail = &haystack[name_end..];
            let trimmed = tail.trim_start_matches(|c: char| c.is_ascii_whitespace());
            if trimmed.starts_with('>') {
                let consumed = name_end + (tail.len() - trimmed.len()) + 1;
                return Some((at, consumed));
            }
        }
        from = name_start;
    }
    None
}
