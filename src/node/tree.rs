//! Tree arena and related utilities
//!
//! The arena owns every node slot. It also carries the parsing and query
//! collaborators so that operations accepting markup or selectors can reach
//! them without any process-wide state.

use std::fmt;
use std::sync::Arc;

use crate::convert::{HtmlParser, MarkupParser};
use crate::error::{GraftError, GraftResult};
use crate::query::{Query, SelectorQuery};

use super::{Comment, Directive, Element, Node, NodeData, NodeId, Text};

// =============================================================================
// Tree
// =============================================================================

/// Arena-backed mutable document tree
#[derive(Clone)]
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    root: NodeId,
    parser: Arc<dyn MarkupParser>,
    query: Arc<dyn Query>,
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("slots", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create an empty tree (a lone Document root) with the bundled
    /// HTML parser and selector engine
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            root: NodeId(0),
            parser: Arc::new(HtmlParser::default()),
            query: Arc::new(SelectorQuery),
        }
    }

    /// Replace the parsing collaborator
    pub fn with_parser(mut self, parser: impl MarkupParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Replace the query collaborator
    pub fn with_query(mut self, query: impl Query + 'static) -> Self {
        self.query = Arc::new(query);
        self
    }

    /// Parse a whole document with the bundled HTML parser
    ///
    /// ```
    /// use tola_graft::Tree;
    ///
    /// let tree = Tree::parse("<p>hi</p>").unwrap();
    /// assert_eq!(tree.children(tree.root()).len(), 1);
    /// ```
    pub fn parse(markup: &str) -> GraftResult<Self> {
        let mut tree = Self::new();
        tree.load(markup)?;
        Ok(tree)
    }

    /// Parse markup with this tree's parser and append it under the root
    pub fn load(&mut self, markup: &str) -> GraftResult<()> {
        let fragment = self.parse_fragment(markup, None)?;
        let nodes = self.nodes[fragment.index()].children.to_vec();
        let root = self.root;
        let at = self.nodes[root.index()].children.len();
        self.splice(root, at, 0, &nodes);
        Ok(())
    }

    /// Run the parsing collaborator, returning a fresh detached fragment root
    pub fn parse_fragment(&mut self, markup: &str, context: Option<NodeId>) -> GraftResult<NodeId> {
        let parser = Arc::clone(&self.parser);
        parser.parse(self, markup, context)
    }

    /// The query collaborator
    pub fn query(&self) -> &dyn Query {
        self.query.as_ref()
    }

    /// Document root
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of arena slots, attached or not
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Node factory
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        assert!(id.0 != u32::MAX, "tree arena exhausted");
        self.nodes.push(Node::new(data));
        id
    }

    /// Create a detached node from any payload
    pub fn create(&mut self, data: impl Into<NodeData>) -> NodeId {
        self.alloc(data.into())
    }

    /// Create a detached element
    pub fn create_element(&mut self, element: impl Into<Element>) -> NodeId {
        self.alloc(NodeData::Element(element.into()))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, data: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(Text::new(data)))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(Comment::new(data)))
    }

    /// Create a detached directive from its raw inner text
    pub fn create_directive(&mut self, raw: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Directive(Directive::from_raw(raw)))
    }

    /// Create an empty Document-kind container for fragments
    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Document)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a node slot
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.get(id).data
    }

    /// Mutable payload access
    ///
    /// Crate-private: swapping the variant could turn a parent into a leaf.
    #[inline]
    pub(crate) fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()].data
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    #[inline]
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).prev
    }

    #[inline]
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).next
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.get(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).children.first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).children.last().copied()
    }

    /// Element payload, if `id` is an element
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.data(id).as_element()
    }

    /// Mutable element payload, if `id` is an element
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.data_mut(id).as_element_mut()
    }

    /// Mutable text payload, if `id` is a text node
    ///
    /// Payloads are editable in place, but a node's kind is fixed:
    ///
    /// ```compile_fail
    /// use tola_graft::{NodeData, Text, Tree};
    ///
    /// let mut tree = Tree::parse("<ul><li>A</li></ul>").unwrap();
    /// let ul = tree.select("ul").unwrap()[0];
    /// *tree.data_mut(ul) = NodeData::Text(Text::new("x"));
    /// ```
    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut Text> {
        self.data_mut(id).as_text_mut()
    }

    pub fn comment_mut(&mut self, id: NodeId) -> Option<&mut Comment> {
        self.data_mut(id).as_comment_mut()
    }

    pub fn directive_mut(&mut self, id: NodeId) -> Option<&mut Directive> {
        self.data_mut(id).as_directive_mut()
    }

    /// Position of `id` in its parent's live children sequence
    ///
    /// Looked up in the owning sequence rather than trusted from the links,
    /// so a stale parent reference yields `None`.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.get(id).parent?;
        self.get(parent).children.iter().position(|&c| c == id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Traversal
    // ─────────────────────────────────────────────────────────────────────────

    /// Iterate strict ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).parent,
        }
    }

    /// Iterate strict descendants in document order (depth-first)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = self.get(id).children.iter().rev().copied().collect();
        Descendants { tree: self, stack }
    }

    /// Check whether `ancestor` strictly contains `node`
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Check whether `ancestor` is `node` or contains it
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.contains(ancestor, node)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        if let Some(text) = self.data(id).as_text() {
            result.push_str(&text.data);
        }
        for d in self.descendants(id) {
            if let Some(text) = self.data(d).as_text() {
                result.push_str(&text.data);
            }
        }
        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query API
    // ─────────────────────────────────────────────────────────────────────────

    /// Find all nodes under the root matching a predicate
    pub fn find_all<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&NodeData) -> bool,
    {
        self.descendants(self.root)
            .filter(|&id| predicate(self.data(id)))
            .collect()
    }

    /// Select descendants of the root matching a selector
    pub fn select(&self, selector: &str) -> GraftResult<Vec<NodeId>> {
        self.select_in(self.root, selector)
    }

    /// Select strict descendants of `scope` matching a selector
    pub fn select_in(&self, scope: NodeId, selector: &str) -> GraftResult<Vec<NodeId>> {
        let candidates: Vec<NodeId> = self
            .descendants(scope)
            .filter(|&id| self.data(id).is_element())
            .collect();
        self.query.filter(self, selector, &candidates)
    }

    /// Select the first match under the root
    pub fn select_first(&self, selector: &str) -> GraftResult<Option<NodeId>> {
        Ok(self.select(selector)?.into_iter().next())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Integrity
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify the structural invariants over every slot in the arena
    ///
    /// - children/parent/prev/next agree for every owner
    /// - no node is listed twice, whether under one parent or two
    /// - a parent link implies membership in that parent's children
    /// - detached nodes keep no sibling links
    /// - only elements and documents own children, documents have no parent
    /// - no parent cycles
    pub fn check_invariants(&self) -> GraftResult<()> {
        let mut owner_of: Vec<Option<NodeId>> = vec![None; self.nodes.len()];

        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            if !node.can_have_children() && !node.children.is_empty() {
                return Err(GraftError::invariant(format!("leaf {id} owns children")));
            }
            if node.data.is_document() && node.parent.is_some() {
                return Err(GraftError::invariant(format!("document {id} has a parent")));
            }
            for (pos, &child) in node.children.iter().enumerate() {
                let Some(slot) = self.nodes.get(child.index()) else {
                    return Err(GraftError::invariant(format!("{id} lists dangling child {child}")));
                };
                if let Some(other) = owner_of[child.index()] {
                    return Err(GraftError::invariant(format!(
                        "{child} listed under both {other} and {id}"
                    )));
                }
                owner_of[child.index()] = Some(id);

                if slot.parent != Some(id) {
                    return Err(GraftError::invariant(format!(
                        "{child} is a child of {id} but its parent link is {:?}",
                        slot.parent
                    )));
                }
                let expected_prev = pos.checked_sub(1).map(|p| node.children[p]);
                if slot.prev != expected_prev {
                    return Err(GraftError::invariant(format!(
                        "{child}.prev is {:?}, expected {:?}",
                        slot.prev, expected_prev
                    )));
                }
                let expected_next = node.children.get(pos + 1).copied();
                if slot.next != expected_next {
                    return Err(GraftError::invariant(format!(
                        "{child}.next is {:?}, expected {:?}",
                        slot.next, expected_next
                    )));
                }
            }
        }

        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            match (node.parent, owner_of[i]) {
                (Some(p), None) => {
                    return Err(GraftError::invariant(format!(
                        "{id} claims parent {p} but is not among its children"
                    )));
                }
                (None, _) if node.prev.is_some() || node.next.is_some() => {
                    return Err(GraftError::invariant(format!(
                        "detached {id} keeps sibling links"
                    )));
                }
                _ => {}
            }
        }

        // Ownership is unique by now, so walking down from every parentless
        // node terminates; anything it misses sits on a parent cycle.
        let mut reached = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].parent.is_none())
            .map(|i| NodeId(i as u32))
            .collect();
        while let Some(id) = stack.pop() {
            reached[id.index()] = true;
            stack.extend(self.get(id).children.iter().copied());
        }
        if let Some(i) = reached.iter().position(|&r| !r) {
            return Err(GraftError::invariant(format!(
                "{} is its own ancestor",
                NodeId(i as u32)
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Iterator over strict ancestors, nearest first
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.get(id).parent;
        Some(id)
    }
}

/// Depth-first iterator over strict descendants
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        // Push children in reverse order so they're visited left-to-right
        self.stack
            .extend(self.tree.get(id).children.iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn list() -> Tree {
        Tree::parse(r#"<ul id="f"><li class="a">A</li><li class="b">B</li><li class="c">C</li></ul>"#)
            .unwrap()
    }

    #[test]
    fn test_parse_links_siblings() {
        let tree = list();
        let ul = tree.first_child(tree.root()).unwrap();
        let items = tree.children(ul).to_vec();
        assert_eq!(items.len(), 3);
        assert_eq!(tree.prev(items[0]), None);
        assert_eq!(tree.next(items[0]), Some(items[1]));
        assert_eq!(tree.prev(items[2]), Some(items[1]));
        assert_eq!(tree.next(items[2]), None);
        assert_eq!(tree.parent(items[1]), Some(ul));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_descendants_in_document_order() {
        let tree = list();
        let tags: Vec<_> = tree
            .descendants(tree.root())
            .filter_map(|id| tree.data(id).tag())
            .collect();
        assert_eq!(tags, vec!["ul", "li", "li", "li"]);
        assert_eq!(tree.text_content(tree.root()), "ABC");
    }

    #[test]
    fn test_ancestors_and_contains() {
        let tree = list();
        let li = tree.select_first("li.b").unwrap().unwrap();
        let ul = tree.parent(li).unwrap();
        let chain: Vec<_> = tree.ancestors(li).collect();
        assert_eq!(chain, vec![ul, tree.root()]);
        assert!(tree.contains(ul, li));
        assert!(!tree.contains(li, li));
        assert!(tree.is_inclusive_ancestor(li, li));
    }

    #[test]
    fn test_index_in_parent() {
        let tree = list();
        let c = tree.select_first(".c").unwrap().unwrap();
        assert_eq!(tree.index_in_parent(c), Some(2));
        assert_eq!(tree.index_in_parent(tree.root()), None);
    }

    #[test]
    fn test_factory_nodes_are_detached() {
        let mut tree = Tree::new();
        let p = tree.create_element(Element::new("p").with_class("x"));
        let t = tree.create_text("hello");
        assert!(tree.get(p).is_detached());
        assert!(tree.get(t).is_detached());
        assert_eq!(tree.element(p).unwrap().tag, "p");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_check_invariants_detects_corruption() {
        let mut tree = list();
        let b = tree.select_first(".b").unwrap().unwrap();
        tree.nodes[b.index()].prev = None;
        let err = tree.check_invariants().unwrap_err();
        assert!(matches!(err, GraftError::Invariant(_)));
    }

    #[test]
    fn test_check_invariants_detects_double_listing() {
        let mut tree = list();
        let ul = tree.first_child(tree.root()).unwrap();
        let a = tree.first_child(ul).unwrap();
        let root = tree.root().index();
        tree.nodes[root].children.push(a);
        assert!(tree.check_invariants().is_err());
    }

    #[test]
    fn test_check_invariants_detects_cycle() {
        let mut tree = Tree::new();
        let a = tree.create_element(Element::new("a"));
        let b = tree.create_element(Element::new("b"));
        tree.nodes[a.index()].children.push(b);
        tree.nodes[b.index()].parent = Some(a);
        tree.nodes[b.index()].children.push(a);
        tree.nodes[a.index()].parent = Some(b);
        let err = tree.check_invariants().unwrap_err();
        assert!(err.to_string().contains("own ancestor"), "{err}");
    }

    #[test]
    fn test_payload_setters_keep_kind() {
        let mut tree = Tree::parse("<ul><li>A</li></ul><!--c--><!doctype html>").unwrap();
        let ul = tree.select_first("ul").unwrap().unwrap();
        let li = tree.first_child(ul).unwrap();
        let text = tree.first_child(li).unwrap();
        let comment = tree.next(ul).unwrap();
        let directive = tree.next(comment).unwrap();

        assert!(tree.text_mut(ul).is_none());
        assert!(tree.element_mut(text).is_none());
        assert!(tree.comment_mut(directive).is_none());
        assert!(tree.directive_mut(comment).is_none());

        tree.text_mut(text).unwrap().data = "B".into();
        tree.comment_mut(comment).unwrap().data = "d".into();
        tree.directive_mut(directive).unwrap().data = "!DOCTYPE xml".into();
        tree.element_mut(ul).unwrap().tag = "ol".into();

        assert_eq!(tree.data(ul).kind(), NodeKind::Element);
        assert_eq!(tree.data(text).kind(), NodeKind::Text);
        assert_eq!(tree.text_content(ul), "B");
        assert_eq!(tree.data(comment).as_comment().unwrap().data, "d");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_select_propagates_selector_errors() {
        let tree = list();
        assert!(matches!(tree.select("li["), Err(GraftError::Selector { .. })));
    }
}
