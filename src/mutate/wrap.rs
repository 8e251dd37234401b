//! Wrapping operations
//!
//! A wrapper is the first node of the normalized content that can own
//! children. Targets are placed at its insertion point: the node reached by
//! repeatedly descending into the first child that can own children.

use rustc_hash::FxHashSet;

use crate::error::GraftResult;
use crate::node::{NodeId, Tree};

use super::NodeInput;

impl Tree {
    /// Deepest node reached by following the first container child
    pub fn insertion_point(&self, wrapper: NodeId) -> NodeId {
        let mut current = wrapper;
        while let Some(next) = self
            .children(current)
            .iter()
            .copied()
            .find(|&c| self.get(c).can_have_children())
        {
            current = next;
        }
        current
    }

    /// The wrapper for wrap and wrap_inner: the first top-level node,
    /// provided it can hold children
    fn wrapper_shell(&self, nodes: &[NodeId]) -> Option<NodeId> {
        nodes
            .first()
            .copied()
            .filter(|&n| self.get(n).can_have_children())
    }

    /// Wrap each target in its own copy of `wrapper`
    ///
    /// Only the wrapper's first top-level node is used; when that node is
    /// not an element the target is skipped. Returns the wrapper node used
    /// for each wrapped target.
    ///
    /// ```
    /// use tola_graft::Tree;
    /// use tola_graft::render::{RenderConfig, render_node};
    ///
    /// let mut tree = Tree::parse("<p>hi</p>").unwrap();
    /// let p = tree.select("p").unwrap();
    /// let wrappers = tree.wrap(&p, "<div><b></b></div>").unwrap();
    /// assert_eq!(
    ///     render_node(&tree, wrappers[0], &RenderConfig::HTML),
    ///     "<div><b><p>hi</p></b></div>"
    /// );
    /// ```
    pub fn wrap(
        &mut self,
        targets: &[NodeId],
        wrapper: impl Into<NodeInput>,
    ) -> GraftResult<Vec<NodeId>> {
        let wrapper = wrapper.into();
        self.wrap_with(targets, |_, _, _| wrapper.clone())
    }

    /// Wrap each target in a wrapper produced per target by a closure
    pub fn wrap_with<F>(&mut self, targets: &[NodeId], mut wrapper: F) -> GraftResult<Vec<NodeId>>
    where
        F: FnMut(&Tree, NodeId, usize) -> NodeInput,
    {
        let last = targets.len().saturating_sub(1);
        let mut shells = Vec::new();

        for (i, &target) in targets.iter().enumerate() {
            let input = wrapper(self, target, i);
            let context = self.parent(target);
            let nodes = self.materialize(&input, i < last, context)?;
            let Some(shell) = self.wrapper_shell(&nodes) else {
                log::debug!("wrap: wrapper for {target} does not start with a container");
                continue;
            };
            let inner = self.insertion_point(shell);

            // A detached target still ends up inside the (detached) wrapper
            if let Some((parent, index)) = self.detach(target) {
                self.splice(parent, index, 0, &[shell]);
            }
            let at = self.children(inner).len();
            self.splice(inner, at, 0, &[target]);
            shells.push(shell);
        }

        Ok(shells)
    }

    /// Wrap the children of each target
    ///
    /// The target's former children move to the wrapper's insertion point and
    /// the wrapper becomes the target's only child.
    pub fn wrap_inner(
        &mut self,
        targets: &[NodeId],
        wrapper: impl Into<NodeInput>,
    ) -> GraftResult<Vec<NodeId>> {
        let wrapper = wrapper.into();
        let last = targets.len().saturating_sub(1);
        let mut shells = Vec::new();

        for (i, &target) in targets.iter().enumerate() {
            if !self.get(target).can_have_children() {
                log::debug!("wrap_inner: skipping leaf {target}");
                continue;
            }
            let nodes = self.materialize(&wrapper, i < last, Some(target))?;
            let Some(shell) = self.wrapper_shell(&nodes) else {
                log::debug!("wrap_inner: wrapper for {target} does not start with a container");
                continue;
            };
            // The shell may be an existing node anywhere under the target
            self.detach(shell);
            let inner = self.insertion_point(shell);

            let moved = self.children(target).to_vec();
            let at = self.children(inner).len();
            self.splice(inner, at, 0, &moved);

            let rest = self.children(target).len();
            self.splice(target, 0, rest, &[shell]);
            shells.push(shell);
        }

        Ok(shells)
    }

    /// Wrap all targets together in a single wrapper
    ///
    /// Unlike [`Tree::wrap`], every top-level node of the wrapper is kept:
    /// they all go where the first target stood, and the targets are then
    /// appended, in the given order, at the insertion point of the last
    /// container among them. Returns the top-level nodes.
    pub fn wrap_all(
        &mut self,
        targets: &[NodeId],
        wrapper: impl Into<NodeInput>,
    ) -> GraftResult<Vec<NodeId>> {
        let Some(&first) = targets.first() else {
            return Ok(Vec::new());
        };
        let context = self.parent(first);
        let nodes = self.materialize(&wrapper.into(), false, context)?;
        let Some(shell) = nodes
            .iter()
            .rev()
            .copied()
            .find(|&n| self.get(n).can_have_children())
        else {
            log::debug!("wrap_all: no container in wrapper");
            return Ok(Vec::new());
        };
        let inner = self.insertion_point(shell);

        if let (Some(parent), Some(index)) = (self.parent(first), self.index_in_parent(first)) {
            self.splice(parent, index, 0, &nodes);
        }

        let mut seen = FxHashSet::default();
        let gathered: Vec<NodeId> = targets
            .iter()
            .copied()
            .filter(|&t| seen.insert(t))
            .collect();
        let at = self.children(inner).len();
        self.splice(inner, at, 0, &gathered);

        Ok(nodes)
    }

    /// Replace each distinct parent of the targets with its own children
    ///
    /// With a selector, only parents matching it are unwrapped. `body`
    /// elements and parents that are themselves roots are left alone.
    /// Returns the parents that were removed.
    pub fn unwrap(&mut self, targets: &[NodeId], selector: Option<&str>) -> GraftResult<Vec<NodeId>> {
        let mut seen = FxHashSet::default();
        let mut parents: Vec<NodeId> = targets
            .iter()
            .filter_map(|&t| self.parent(t))
            .filter(|&p| seen.insert(p))
            .collect();
        if let Some(selector) = selector {
            parents = self.query().filter(self, selector, &parents)?;
        }

        let mut removed = Vec::new();
        for parent in parents {
            if self.element(parent).is_some_and(|e| e.is("body")) {
                continue;
            }
            let (Some(grand), Some(index)) = (self.parent(parent), self.index_in_parent(parent)) else {
                log::debug!("unwrap: {parent} has no parent of its own");
                continue;
            };
            let children = self.children(parent).to_vec();
            removed.extend(self.splice(grand, index, 1, &children));
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use crate::node::{NodeId, Tree};
    use crate::render::{RenderConfig, render_children, render_node};

    const LIST: &str = r#"<ul id="f"><li class="a">A</li><li class="b">B</li><li class="c">C</li></ul>"#;

    fn one(tree: &Tree, selector: &str) -> NodeId {
        tree.select_first(selector).unwrap().unwrap()
    }

    fn html(tree: &Tree, id: NodeId) -> String {
        render_node(tree, id, &RenderConfig::HTML)
    }

    #[test]
    fn test_wrap_all_gathers_targets_at_first_position() {
        let mut tree = Tree::parse(LIST).unwrap();
        let (ul, a, b, c) = (one(&tree, "ul"), one(&tree, ".a"), one(&tree, ".b"), one(&tree, ".c"));

        let nodes = tree.wrap_all(&[a, c], r#"<div class="w"></div>"#).unwrap();
        assert_eq!(nodes.len(), 1);
        let div = nodes[0];

        assert_eq!(tree.children(ul), &[div, b]);
        assert_eq!(tree.children(div), &[a, c]);
        assert_eq!(
            render_children(&tree, ul, &RenderConfig::HTML),
            r#"<div class="w"><li class="a">A</li><li class="c">C</li></div><li class="b">B</li>"#
        );
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_wrap_all_uses_last_container() {
        let mut tree = Tree::parse("<p>1</p><p>2</p>").unwrap();
        let ps = tree.select("p").unwrap();
        let nodes = tree.wrap_all(&ps, "<hr><section><em></em></section>").unwrap();
        assert_eq!(nodes.len(), 2);
        let root = tree.root();
        assert_eq!(
            render_children(&tree, root, &RenderConfig::HTML),
            "<hr><section><em><p>1</p><p>2</p></em></section>"
        );
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_wrap_then_unwrap_restores_shape() {
        let mut tree = Tree::parse(LIST).unwrap();
        let (ul, b) = (one(&tree, "ul"), one(&tree, ".b"));
        let before = tree.children(ul).to_vec();

        let shells = tree.wrap(&[b], "<div></div>").unwrap();
        assert_eq!(tree.parent(b), Some(shells[0]));
        assert_eq!(tree.children(ul)[1], shells[0]);
        tree.check_invariants().unwrap();

        let removed = tree.unwrap(&[b], None).unwrap();
        assert_eq!(removed, shells);
        assert_eq!(tree.children(ul), &before[..]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_wrap_descends_to_insertion_point() {
        let mut tree = Tree::parse("<p>x</p>").unwrap();
        let p = one(&tree, "p");
        let shells = tree
            .wrap(&[p], "<div><span>t</span><section><i></i></section></div>")
            .unwrap();
        // The first container child of div is span
        assert_eq!(html(&tree, shells[0]), "<div><span>t<p>x</p></span><section><i></i></section></div>");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_wrap_each_target_gets_own_wrapper() {
        let mut tree = Tree::parse(LIST).unwrap();
        let items = tree.select("li").unwrap();
        let shells = tree.wrap(&items, "<b></b>").unwrap();
        assert_eq!(shells.len(), 3);
        assert_ne!(shells[0], shells[1]);
        assert_ne!(shells[1], shells[2]);
        for (&shell, &item) in shells.iter().zip(&items) {
            assert_eq!(tree.children(shell), &[item]);
        }
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_wrap_with_existing_node_moves_it() {
        let mut tree = Tree::parse("<p>x</p><div></div>").unwrap();
        let (p, div) = (one(&tree, "p"), one(&tree, "div"));
        tree.wrap(&[p], div).unwrap();
        let root = tree.root();
        assert_eq!(tree.children(root), &[div]);
        assert_eq!(tree.children(div), &[p]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_wrap_skips_wrapper_without_container() {
        let mut tree = Tree::parse("<p>x</p>").unwrap();
        let p = one(&tree, "p");
        assert!(tree.wrap(&[p], "just text").unwrap().is_empty());
        assert_eq!(tree.parent(p), Some(tree.root()));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_wrap_uses_only_the_first_top_level_node() {
        let mut tree = Tree::parse("<p>x</p>").unwrap();
        let p = one(&tree, "p");
        let root = tree.root();

        assert!(tree.wrap(&[p], "x<div></div>").unwrap().is_empty());
        assert!(tree.wrap_inner(&[p], "<!--c--><div></div>").unwrap().is_empty());
        assert_eq!(render_children(&tree, root, &RenderConfig::HTML), "<p>x</p>");

        let shells = tree.wrap(&[p], "<div></div><span>tail</span>").unwrap();
        assert_eq!(tree.children(root), &shells[..]);
        assert_eq!(render_children(&tree, root, &RenderConfig::HTML), "<div><p>x</p></div>");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_wrap_inner() {
        let mut tree = Tree::parse(LIST).unwrap();
        let ul = one(&tree, "ul");
        let shells = tree.wrap_inner(&[ul], r#"<div class="in"></div>"#).unwrap();
        assert_eq!(tree.children(ul), &shells[..]);
        assert_eq!(tree.children(shells[0]).len(), 3);
        assert_eq!(tree.text_content(shells[0]), "ABC");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_wrap_inner_with_nested_descendant() {
        let mut tree = Tree::parse("<div><p><span></span>1</p><p>2</p></div>").unwrap();
        let (div, span) = (one(&tree, "div"), one(&tree, "span"));
        tree.wrap_inner(&[div], span).unwrap();
        assert_eq!(tree.children(div), &[span]);
        assert_eq!(html(&tree, div), "<div><span><p>1</p><p>2</p></span></div>");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_wrap_inner_with_existing_child() {
        let mut tree = Tree::parse("<div><p>1</p><section></section><p>2</p></div>").unwrap();
        let (div, section) = (one(&tree, "div"), one(&tree, "section"));
        tree.wrap_inner(&[div], section).unwrap();
        assert_eq!(tree.children(div), &[section]);
        assert_eq!(
            html(&tree, div),
            "<div><section><p>1</p><p>2</p></section></div>"
        );
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_unwrap_distinct_parents_once() {
        let mut tree = Tree::parse(LIST).unwrap();
        let items = tree.select("li").unwrap();
        let removed = tree.unwrap(&items, None).unwrap();
        assert_eq!(removed.len(), 1);
        let root = tree.root();
        assert_eq!(tree.children(root), &items[..]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_unwrap_with_selector() {
        let mut tree = Tree::parse("<div><span>1</span></div><section><span>2</span></section>").unwrap();
        let spans = tree.select("span").unwrap();
        let removed = tree.unwrap(&spans, Some("section")).unwrap();
        assert_eq!(removed.len(), 1);
        let root = tree.root();
        assert_eq!(
            render_children(&tree, root, &RenderConfig::HTML),
            "<div><span>1</span></div><span>2</span>"
        );
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_unwrap_skips_body_and_roots() {
        let mut tree = Tree::parse("<body><p>x</p></body>").unwrap();
        let p = one(&tree, "p");
        let body = one(&tree, "body");
        assert!(tree.unwrap(&[p], None).unwrap().is_empty());
        assert!(tree.unwrap(&[body], None).unwrap().is_empty());
        assert_eq!(tree.parent(p), Some(body));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_insertion_point_of_leafless_wrapper() {
        let mut tree = Tree::new();
        let frag = tree.parse_fragment("<div>text</div>", None).unwrap();
        let div = tree.first_child(frag).unwrap();
        assert_eq!(tree.insertion_point(div), div);
    }
}
