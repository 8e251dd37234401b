//! Node model: arena slots, payload variants and the `Tree` that owns them.
//!
//! Every node lives in a slot of a [`Tree`] arena and is addressed by a
//! [`NodeId`]. The slot holds the payload ([`NodeData`]), the owning
//! `children` sequence, and three non-owning links (`parent`, `prev`, `next`).
//!
//! # Ownership
//!
//! Only `children` expresses ownership. The links are caches derived from it
//! and are rewritten exclusively by the splice primitive, so outside code can
//! read them but never set them.

mod element;
mod text;
mod tree;

pub use element::Element;
pub use text::{Comment, Directive, Text};
pub use tree::{Ancestors, Descendants, Tree};

use std::fmt;

use smallvec::SmallVec;

// =============================================================================
// NodeId
// =============================================================================

/// Handle to a node slot inside a [`Tree`]
///
/// Ids are only meaningful for the tree that issued them. They stay valid for
/// the tree's whole lifetime because slots are never freed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw slot index
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type alias for the owning children sequence.
pub type Children = SmallVec<[NodeId; 8]>;

// =============================================================================
// NodeData - payload sum type
// =============================================================================

/// Fieldless discriminant of [`NodeData`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    Directive,
    Document,
}

/// Node payload
///
/// `Document` is the root container of a parsed document and also of parsed
/// fragments; it has no payload of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(Text),
    Comment(Comment),
    Directive(Directive),
    Document,
}

impl NodeData {
    // Generates for each variant (element -> Element, etc.):
    //   - is_xxx(&self) -> bool
    //   - as_xxx(&self) -> Option<&Type>
    //   - as_xxx_mut(&mut self) -> Option<&mut Type>
    crate::impl_enum_accessors!(element, text, comment, directive);

    crate::impl_kind_match!(NodeKind; Element, Text, Comment, Directive; Document);

    /// Check if this is the Document variant
    #[inline]
    pub fn is_document(&self) -> bool {
        matches!(self, NodeData::Document)
    }

    /// Only elements and documents own children
    #[inline]
    pub fn can_have_children(&self) -> bool {
        matches!(self, NodeData::Element(_) | NodeData::Document)
    }

    /// Tag name for elements
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|e| e.tag.as_str())
    }
}

impl From<Element> for NodeData {
    fn from(e: Element) -> Self {
        NodeData::Element(e)
    }
}

impl From<Text> for NodeData {
    fn from(t: Text) -> Self {
        NodeData::Text(t)
    }
}

impl From<Comment> for NodeData {
    fn from(c: Comment) -> Self {
        NodeData::Comment(c)
    }
}

impl From<Directive> for NodeData {
    fn from(d: Directive) -> Self {
        NodeData::Directive(d)
    }
}

// =============================================================================
// Node - arena slot
// =============================================================================

/// One arena slot: payload, owned children, and cached relationship links
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) children: Children,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            prev: None,
            next: None,
            children: SmallVec::new(),
        }
    }

    /// Node payload
    #[inline]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Owning parent, if attached
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Previous sibling within the parent's children
    #[inline]
    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    /// Next sibling within the parent's children
    #[inline]
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Owned children, in document order
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Shorthand for `data().can_have_children()`
    #[inline]
    pub fn can_have_children(&self) -> bool {
        self.data.can_have_children()
    }

    /// True when the node has no parent
    #[inline]
    pub fn is_detached(&self) -> bool {
        self.parent.is_none()
    }
}
