//! Selector matching collaborator
//!
//! The engine only needs two questions answered: does a node match a
//! selector, and which of these candidates do. [`Query`] is that seam;
//! [`SelectorQuery`] is the bundled implementation over a CSS subset:
//!
//! - compound selectors: `*`, `tag`, `#id`, `.class`, `[attr]`,
//!   `[attr=v]`, `[attr~=v]`, `[attr^=v]`, `[attr$=v]`, `[attr*=v]`
//! - combinators: descendant (whitespace), `>`, `+`, `~`
//! - selector lists separated by `,`
//!
//! Anything outside this grammar is a [`GraftError::Selector`].

use smallvec::SmallVec;

use crate::error::{GraftError, GraftResult};
use crate::node::{Element, NodeId, Tree};

// =============================================================================
// Query trait
// =============================================================================

/// Answers selector questions about nodes of a tree
pub trait Query: Send + Sync {
    /// Whether `node` matches `selector`
    fn matches(&self, tree: &Tree, selector: &str, node: NodeId) -> GraftResult<bool>;

    /// The candidates matching `selector`, in their given order
    fn filter(&self, tree: &Tree, selector: &str, candidates: &[NodeId]) -> GraftResult<Vec<NodeId>> {
        let mut matched = Vec::new();
        for &node in candidates {
            if self.matches(tree, selector, node)? {
                matched.push(node);
            }
        }
        Ok(matched)
    }
}

/// The bundled [`Query`]: parses with [`Selector::parse`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorQuery;

impl Query for SelectorQuery {
    fn matches(&self, tree: &Tree, selector: &str, node: NodeId) -> GraftResult<bool> {
        Ok(Selector::parse(selector)?.matches(tree, node))
    }

    fn filter(&self, tree: &Tree, selector: &str, candidates: &[NodeId]) -> GraftResult<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(candidates
            .iter()
            .copied()
            .filter(|&node| selector.matches(tree, node))
            .collect())
    }
}

// =============================================================================
// Selector AST
// =============================================================================

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

/// Compounds joined by combinators, stored left to right
///
/// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: SmallVec<[Compound; 4]>,
    combinators: SmallVec<[Combinator; 4]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    /// `None` is the universal selector or an omitted tag
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    test: Option<(AttrOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    /// `=`
    Equals,
    /// `~=`
    Includes,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
}

impl AttrOp {
    fn test(self, value: &str, expected: &str) -> bool {
        match self {
            AttrOp::Equals => value == expected,
            AttrOp::Includes => value.split_ascii_whitespace().any(|w| w == expected),
            AttrOp::Prefix => !expected.is_empty() && value.starts_with(expected),
            AttrOp::Suffix => !expected.is_empty() && value.ends_with(expected),
            AttrOp::Substring => !expected.is_empty() && value.contains(expected),
        }
    }
}

// =============================================================================
// Matching
// =============================================================================

impl Selector {
    /// Parse a selector list
    ///
    /// ```
    /// use tola_graft::query::Selector;
    ///
    /// assert!(Selector::parse("ul > li.a, #main p").is_ok());
    /// assert!(Selector::parse("li:first-child").is_err());
    /// ```
    pub fn parse(selector: &str) -> GraftResult<Self> {
        Parser {
            src: selector,
            pos: 0,
        }
        .selector_list()
        .map_err(|message| GraftError::selector(selector, message))
    }

    /// Whether `node` matches any alternative; non-elements never match
    pub fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.alternatives.iter().any(|complex| complex.matches(tree, node))
    }
}

impl Complex {
    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.matches_from(tree, self.compounds.len() - 1, node)
    }

    /// Match `compounds[..=index]` with `compounds[index]` anchored at `node`
    fn matches_from(&self, tree: &Tree, index: usize, node: NodeId) -> bool {
        let Some(element) = tree.element(node) else {
            return false;
        };
        if !self.compounds[index].matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }

        let next = index - 1;
        match self.combinators[next] {
            Combinator::Child => tree
                .parent(node)
                .is_some_and(|p| self.matches_from(tree, next, p)),
            Combinator::Descendant => tree
                .ancestors(node)
                .any(|a| self.matches_from(tree, next, a)),
            Combinator::NextSibling => {
                previous_element(tree, node).is_some_and(|s| self.matches_from(tree, next, s))
            }
            Combinator::SubsequentSibling => {
                let mut sibling = previous_element(tree, node);
                while let Some(s) = sibling {
                    if self.matches_from(tree, next, s) {
                        return true;
                    }
                    sibling = previous_element(tree, s);
                }
                false
            }
        }
    }
}

fn previous_element(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let mut cur = tree.prev(node);
    while let Some(id) = cur {
        if tree.data(id).is_element() {
            return Some(id);
        }
        cur = tree.prev(id);
    }
    None
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !element.is(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|attr| match element.get_attr(&attr.name) {
            None => false,
            Some(value) => match &attr.test {
                None => true,
                Some((op, expected)) => op.test(value, expected),
            },
        })
    }
}

// =============================================================================
// Parser
// =============================================================================

type ParseResult<T> = Result<T, String>;

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn selector_list(mut self) -> ParseResult<Selector> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_whitespace();
            alternatives.push(self.complex()?);
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(c) => return Err(format!("unexpected `{c}` at {}", self.pos)),
            }
        }
        Ok(Selector { alternatives })
    }

    fn complex(&mut self) -> ParseResult<Complex> {
        let mut compounds = SmallVec::new();
        let mut combinators = SmallVec::new();
        compounds.push(self.compound()?);

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_space => Combinator::Descendant,
                Some(c) => return Err(format!("unexpected `{c}` at {}", self.pos)),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }

        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> ParseResult<Compound> {
        let start = self.pos;
        let mut compound = Compound::default();

        match self.peek() {
            Some('*') => self.pos += 1,
            Some(c) if is_name_char(c) => {
                compound.tag = Some(self.name()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.name()?.to_owned());
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.name()?.to_owned());
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return match self.peek() {
                Some(c) => Err(format!("unexpected `{c}` at {start}")),
                None => Err("expected a selector".to_owned()),
            };
        }
        Ok(compound)
    }

    /// `[` already consumed
    fn attribute(&mut self) -> ParseResult<AttrSelector> {
        self.skip_whitespace();
        let name = self.name()?.to_ascii_lowercase();
        self.skip_whitespace();

        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttrSelector { name, test: None });
            }
            Some('=') => AttrOp::Equals,
            Some('~') => AttrOp::Includes,
            Some('^') => AttrOp::Prefix,
            Some('$') => AttrOp::Suffix,
            Some('*') => AttrOp::Substring,
            Some(c) => return Err(format!("unexpected `{c}` in attribute selector")),
            None => return Err("unterminated attribute selector".to_owned()),
        };
        self.pos += 1;
        if op != AttrOp::Equals {
            if self.peek() != Some('=') {
                return Err("expected `=` in attribute selector".to_owned());
            }
            self.pos += 1;
        }
        self.skip_whitespace();

        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let rest = &self.src[self.pos..];
                let Some(len) = rest.find(quote) else {
                    return Err("unterminated string in attribute selector".to_owned());
                };
                self.pos += len + 1;
                rest[..len].to_owned()
            }
            _ => self.name()?.to_owned(),
        };

        self.skip_whitespace();
        if self.peek() != Some(']') {
            return Err("unterminated attribute selector".to_owned());
        }
        self.pos += 1;
        Ok(AttrSelector {
            name,
            test: Some((op, value)),
        })
    }

    fn name(&mut self) -> ParseResult<&'a str> {
        let src = self.src;
        let rest = &src[self.pos..];
        let len = rest
            .find(|c: char| !is_name_char(c))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(format!("expected a name at {}", self.pos));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    /// Returns whether anything was skipped
    fn skip_whitespace(&mut self) -> bool {
        let rest = &self.src[self.pos..];
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
        skipped > 0
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_') || !c.is_ascii()
}
