//! Content normalization and deep cloning
//!
//! Everything an operation can insert is first turned into a flat list of
//! node ids by [`Tree::materialize`]. When the same content fans out to
//! several destinations, every destination but the last gets a deep clone and
//! the last one receives the original nodes.

use rustc_hash::FxHashSet;

use crate::error::GraftResult;
use crate::node::{NodeId, Tree};

// =============================================================================
// NodeInput
// =============================================================================

/// Content accepted by insertion operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeInput {
    /// One existing node (moved or cloned)
    Single(NodeId),
    /// Several existing nodes, inserted in this order
    Many(Vec<NodeId>),
    /// Markup handed to the parsing collaborator
    Markup(String),
}

impl NodeInput {
    /// Content that inserts nothing
    pub fn empty() -> Self {
        NodeInput::Many(Vec::new())
    }
}

impl From<NodeId> for NodeInput {
    fn from(id: NodeId) -> Self {
        NodeInput::Single(id)
    }
}

impl From<Vec<NodeId>> for NodeInput {
    fn from(ids: Vec<NodeId>) -> Self {
        NodeInput::Many(ids)
    }
}

impl From<&[NodeId]> for NodeInput {
    fn from(ids: &[NodeId]) -> Self {
        NodeInput::Many(ids.to_vec())
    }
}

impl<const N: usize> From<[NodeId; N]> for NodeInput {
    fn from(ids: [NodeId; N]) -> Self {
        NodeInput::Many(ids.to_vec())
    }
}

impl From<&str> for NodeInput {
    fn from(markup: &str) -> Self {
        NodeInput::Markup(markup.to_owned())
    }
}

impl From<String> for NodeInput {
    fn from(markup: String) -> Self {
        NodeInput::Markup(markup)
    }
}

// =============================================================================
// Normalization
// =============================================================================

impl Tree {
    /// Turn `input` into a flat, duplicate-free list of nodes ready to splice
    ///
    /// - `Markup` is parsed (with `context` as the fragment context) and the
    ///   fragment's top-level children are returned; each call yields fresh
    ///   nodes.
    /// - Existing nodes are returned as-is, or as deep clones when `clone` is
    ///   set. A Document-kind node stands for its children.
    ///
    /// Returned originals stay where they are until a splice moves them.
    pub fn materialize(
        &mut self,
        input: &NodeInput,
        clone: bool,
        context: Option<NodeId>,
    ) -> GraftResult<Vec<NodeId>> {
        let sources: Vec<NodeId> = match input {
            NodeInput::Markup(markup) => {
                let fragment = self.parse_fragment(markup, context)?;
                return Ok(self.children(fragment).to_vec());
            }
            NodeInput::Single(id) => vec![*id],
            NodeInput::Many(ids) => ids.clone(),
        };

        let mut seen = FxHashSet::default();
        let mut flat = Vec::with_capacity(sources.len());
        for id in sources {
            if self.data(id).is_document() {
                flat.extend(self.children(id).iter().copied());
            } else {
                flat.push(id);
            }
        }
        flat.retain(|id| seen.insert(*id));

        if clone {
            Ok(flat.into_iter().map(|id| self.deep_clone(id)).collect())
        } else {
            Ok(flat)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cloning
    // ─────────────────────────────────────────────────────────────────────────

    /// Deep-copy a subtree into new, detached node identities
    ///
    /// Payloads (attributes, text) are copied and nothing is shared with the
    /// original. Uses an explicit work stack, so depth is bounded by memory
    /// rather than the call stack.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let data = self.data(id).clone();
        let copy = self.alloc(data);

        // (original, copy) pairs whose children are still to be copied
        let mut pending = vec![(id, copy)];
        while let Some((source, target)) = pending.pop() {
            for i in 0..self.children(source).len() {
                let child = self.children(source)[i];
                let data = self.data(child).clone();
                let child_copy = self.alloc(data);
                self.push_child(target, child_copy);
                pending.push((child, child_copy));
            }
        }
        copy
    }

    /// Deep-copy each node of a selection, preserving order
    pub fn clone_nodes(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        ids.iter().map(|&id| self.deep_clone(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::fingerprint;
    use crate::node::Element;
    use crate::render::{RenderConfig, render_node};

    fn list() -> Tree {
        Tree::parse(r#"<ul id="f"><li class="a">A</li><li class="b">B</li><li class="c">C</li></ul>"#)
            .unwrap()
    }

    #[test]
    fn test_markup_is_fresh_per_call() {
        let mut tree = list();
        let input = NodeInput::from("<i>x</i><b>y</b>");
        let first = tree.materialize(&input, false, None).unwrap();
        let second = tree.materialize(&input, false, None).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert!(first.iter().all(|id| !second.contains(id)));
        assert_eq!(tree.data(first[0]).tag(), Some("i"));
    }

    #[test]
    fn test_nodes_pass_through_without_clone() {
        let mut tree = list();
        let li = tree.select("li").unwrap();
        let out = tree.materialize(&NodeInput::from(li.clone()), false, None).unwrap();
        assert_eq!(out, li);
    }

    #[test]
    fn test_nodes_clone_when_requested() {
        let mut tree = list();
        let a = tree.select_first(".a").unwrap().unwrap();
        let out = tree.materialize(&NodeInput::Single(a), true, None).unwrap();
        assert_eq!(out.len(), 1);
        assert_ne!(out[0], a);
        assert!(tree.get(out[0]).is_detached());
        assert_eq!(fingerprint(&tree, out[0]), fingerprint(&tree, a));
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut tree = list();
        let a = tree.select_first(".a").unwrap().unwrap();
        let out = tree.materialize(&NodeInput::Many(vec![a, a]), false, None).unwrap();
        assert_eq!(out, vec![a]);
    }

    #[test]
    fn test_fragment_stands_for_children() {
        let mut tree = Tree::new();
        let frag = tree.parse_fragment("<p>1</p><p>2</p>", None).unwrap();
        let expected = tree.children(frag).to_vec();
        let out = tree.materialize(&NodeInput::Single(frag), false, None).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let mut tree = list();
        let a = tree.select_first(".a").unwrap().unwrap();
        let copy = tree.deep_clone(a);
        let config = RenderConfig::HTML;
        assert_eq!(render_node(&tree, copy, &config), render_node(&tree, a, &config));

        let text = tree.first_child(copy).unwrap();
        tree.text_mut(text).unwrap().data = "changed".into();
        tree.element_mut(copy).unwrap().set_attr("class", "z");

        assert_eq!(render_node(&tree, a, &config), r#"<li class="a">A</li>"#);
        assert_eq!(render_node(&tree, copy, &config), r#"<li class="z">changed</li>"#);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_clone_nodes_keeps_order() {
        let mut tree = Tree::new();
        let a = tree.create_element(Element::new("a"));
        let b = tree.create_element(Element::new("b"));
        let copies = tree.clone_nodes(&[a, b]);
        assert_eq!(tree.data(copies[0]).tag(), Some("a"));
        assert_eq!(tree.data(copies[1]).tag(), Some("b"));
    }
}
