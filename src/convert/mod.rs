//! Markup parsing collaborators
//!
//! The engine never tokenizes markup itself. Anything that accepts a markup
//! string goes through a [`MarkupParser`] held by the [`Tree`], which builds
//! the parsed nodes directly inside the tree's arena.
//!
//! # Bundled parser
//!
//! | Parser | Module | Mode |
//! |--------|--------|------|
//! | [`HtmlParser`] | [`markup`] | lenient HTML or XML, per [`ParseOptions`] |
//!
//! # Custom parsers
//!
//! A replacement only has to allocate a Document-kind fragment root with
//! [`Tree::create_fragment`], attach the parsed nodes under it, and return
//! it. Install it with [`Tree::with_parser`].

mod entities;
pub mod markup;

pub use self::entities::decode_entities;
pub use self::markup::HtmlParser;

use crate::error::GraftResult;
use crate::node::{NodeId, Tree};

// =============================================================================
// MarkupParser
// =============================================================================

/// Turns markup into nodes allocated in a tree
pub trait MarkupParser: Send + Sync {
    /// Parse `markup` into a fresh, detached Document-kind fragment root
    ///
    /// `context` is the node the result is destined for, if known; parsers
    /// may use it to pick a content model (raw text inside `script`, say).
    fn parse(&self, tree: &mut Tree, markup: &str, context: Option<NodeId>) -> GraftResult<NodeId>;
}

// =============================================================================
// ParseOptions
// =============================================================================

/// Options for the bundled parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// XML rules: no void elements, no raw text, no implied end tags
    pub xml_mode: bool,
    /// Lowercase tag and attribute names
    pub lower_case_tags: bool,
    /// Decode character references in text and attribute values
    pub decode_entities: bool,
    /// Treat `<tag/>` as an empty element rather than an open tag
    pub recognize_self_closing: bool,
}

impl ParseOptions {
    /// Lenient HTML
    pub const HTML: Self = Self {
        xml_mode: false,
        lower_case_tags: true,
        decode_entities: true,
        recognize_self_closing: true,
    };

    /// XML: case-preserving, every element closes explicitly or with `/>`
    pub const XML: Self = Self {
        xml_mode: true,
        lower_case_tags: false,
        decode_entities: true,
        recognize_self_closing: true,
    };

    /// Enable or disable character reference decoding
    pub fn with_decode_entities(mut self, decode: bool) -> Self {
        self.decode_entities = decode;
        self
    }

    /// Enable or disable name lowercasing
    pub fn with_lower_case_tags(mut self, lower: bool) -> Self {
        self.lower_case_tags = lower;
        self
    }

    /// Enable or disable `/>` handling
    pub fn with_self_closing(mut self, recognize: bool) -> Self {
        self.recognize_self_closing = recognize;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::HTML
    }
}
