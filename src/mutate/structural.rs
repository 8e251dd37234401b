//! Structural operations
//!
//! append / prepend / before / after and their inverse forms, plus
//! replace_with, remove, empty, set_html and set_text. Each one normalizes
//! content, computes an owner and index per target, and hands off to
//! [`Tree::splice`].
//!
//! Targets an operation cannot apply to (a leaf for append, a detached node
//! for before) are skipped and logged at debug level; they never error.

use crate::error::GraftResult;
use crate::node::{NodeId, Tree};

use super::NodeInput;

// =============================================================================
// Position
// =============================================================================

/// Where inserted content lands relative to a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// After the target's last child
    Append,
    /// Before the target's first child
    Prepend,
    /// Immediately before the target, under its parent
    Before,
    /// Immediately after the target, under its parent
    After,
}

impl Position {
    fn name(self) -> &'static str {
        match self {
            Position::Append => "append",
            Position::Prepend => "prepend",
            Position::Before => "before",
            Position::After => "after",
        }
    }
}

impl Tree {
    /// Owner and insertion index for `target`, or `None` when it does not apply
    fn locate(&self, target: NodeId, position: Position) -> Option<(NodeId, usize)> {
        match position {
            Position::Append | Position::Prepend => {
                if !self.get(target).can_have_children() {
                    return None;
                }
                let at = match position {
                    Position::Append => self.children(target).len(),
                    _ => 0,
                };
                Some((target, at))
            }
            Position::Before | Position::After => {
                let parent = self.parent(target)?;
                let index = self.index_in_parent(target)?;
                let at = match position {
                    Position::After => index + 1,
                    _ => index,
                };
                Some((parent, at))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Insertion driver
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert per-target content at `position` relative to every target
    ///
    /// `content` is called once per applicable target with the target and
    /// its index in `targets`. Every target but the last receives clones of
    /// existing nodes; the last receives the originals. Returns every node
    /// actually inserted, in insertion order.
    pub fn insert_at_with<F>(
        &mut self,
        targets: &[NodeId],
        position: Position,
        mut content: F,
    ) -> GraftResult<Vec<NodeId>>
    where
        F: FnMut(&Tree, NodeId, usize) -> NodeInput,
    {
        let last = targets.len().saturating_sub(1);
        let mut inserted = Vec::new();

        for (i, &target) in targets.iter().enumerate() {
            let Some((owner, at)) = self.locate(target, position) else {
                log::debug!("{}: skipping {target}, no place to insert", position.name());
                continue;
            };
            let input = content(self, target, i);
            let nodes = self.materialize(&input, i < last, Some(owner))?;
            self.splice(owner, at, 0, &nodes);
            inserted.extend(nodes);
        }

        Ok(inserted)
    }

    /// Insert the same content at `position` relative to every target
    pub fn insert_at(
        &mut self,
        targets: &[NodeId],
        position: Position,
        content: impl Into<NodeInput>,
    ) -> GraftResult<Vec<NodeId>> {
        let content = content.into();
        self.insert_at_with(targets, position, |_, _, _| content.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Target-first forms
    // ─────────────────────────────────────────────────────────────────────────

    /// Append content as the last children of each target
    ///
    /// ```
    /// use tola_graft::Tree;
    ///
    /// let mut tree = Tree::parse("<ul><li>A</li></ul>").unwrap();
    /// let ul = tree.select("ul").unwrap();
    /// tree.append(&ul, "<li>B</li>").unwrap();
    /// assert_eq!(tree.text_content(ul[0]), "AB");
    /// ```
    pub fn append(
        &mut self,
        targets: &[NodeId],
        content: impl Into<NodeInput>,
    ) -> GraftResult<Vec<NodeId>> {
        self.insert_at(targets, Position::Append, content)
    }

    /// Append per-target content produced by a closure
    pub fn append_with<F>(&mut self, targets: &[NodeId], content: F) -> GraftResult<Vec<NodeId>>
    where
        F: FnMut(&Tree, NodeId, usize) -> NodeInput,
    {
        self.insert_at_with(targets, Position::Append, content)
    }

    /// Insert content as the first children of each target
    pub fn prepend(
        &mut self,
        targets: &[NodeId],
        content: impl Into<NodeInput>,
    ) -> GraftResult<Vec<NodeId>> {
        self.insert_at(targets, Position::Prepend, content)
    }

    pub fn prepend_with<F>(&mut self, targets: &[NodeId], content: F) -> GraftResult<Vec<NodeId>>
    where
        F: FnMut(&Tree, NodeId, usize) -> NodeInput,
    {
        self.insert_at_with(targets, Position::Prepend, content)
    }

    /// Insert content immediately before each target
    pub fn before(
        &mut self,
        targets: &[NodeId],
        content: impl Into<NodeInput>,
    ) -> GraftResult<Vec<NodeId>> {
        self.insert_at(targets, Position::Before, content)
    }

    pub fn before_with<F>(&mut self, targets: &[NodeId], content: F) -> GraftResult<Vec<NodeId>>
    where
        F: FnMut(&Tree, NodeId, usize) -> NodeInput,
    {
        self.insert_at_with(targets, Position::Before, content)
    }

    /// Insert content immediately after each target
    pub fn after(
        &mut self,
        targets: &[NodeId],
        content: impl Into<NodeInput>,
    ) -> GraftResult<Vec<NodeId>> {
        self.insert_at(targets, Position::After, content)
    }

    pub fn after_with<F>(&mut self, targets: &[NodeId], content: F) -> GraftResult<Vec<NodeId>>
    where
        F: FnMut(&Tree, NodeId, usize) -> NodeInput,
    {
        self.insert_at_with(targets, Position::After, content)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Content-first forms
    // ─────────────────────────────────────────────────────────────────────────

    /// Move content to the end of each target; returns clones plus original
    pub fn append_to(
        &mut self,
        content: impl Into<NodeInput>,
        targets: &[NodeId],
    ) -> GraftResult<Vec<NodeId>> {
        self.insert_at(targets, Position::Append, content)
    }

    /// Move content to the start of each target; returns clones plus original
    pub fn prepend_to(
        &mut self,
        content: impl Into<NodeInput>,
        targets: &[NodeId],
    ) -> GraftResult<Vec<NodeId>> {
        self.insert_at(targets, Position::Prepend, content)
    }

    /// Move content to sit before each target; returns clones plus original
    pub fn insert_before(
        &mut self,
        content: impl Into<NodeInput>,
        targets: &[NodeId],
    ) -> GraftResult<Vec<NodeId>> {
        self.insert_at(targets, Position::Before, content)
    }

    /// Move content to sit after each target; returns clones plus original
    pub fn insert_after(
        &mut self,
        content: impl Into<NodeInput>,
        targets: &[NodeId],
    ) -> GraftResult<Vec<NodeId>> {
        self.insert_at(targets, Position::After, content)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Replacement and removal
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace each target with content; returns the targets taken out
    pub fn replace_with(
        &mut self,
        targets: &[NodeId],
        content: impl Into<NodeInput>,
    ) -> GraftResult<Vec<NodeId>> {
        let content = content.into();
        self.replace_with_fn(targets, |_, _, _| content.clone())
    }

    /// Replace each target with per-target content produced by a closure
    ///
    /// Content nodes are detached from wherever they live before the target
    /// is swapped out, so no node is ever reachable from two places. When the
    /// content includes the target itself, the target keeps its slot.
    pub fn replace_with_fn<F>(&mut self, targets: &[NodeId], mut content: F) -> GraftResult<Vec<NodeId>>
    where
        F: FnMut(&Tree, NodeId, usize) -> NodeInput,
    {
        let last = targets.len().saturating_sub(1);
        let mut replaced = Vec::new();

        for (i, &target) in targets.iter().enumerate() {
            let Some(parent) = self.parent(target) else {
                log::debug!("replace_with: skipping detached {target}");
                continue;
            };
            let Some(mut index) = self.index_in_parent(target) else {
                log::debug!("replace_with: {target} no longer under {parent}");
                continue;
            };

            let input = content(self, target, i);
            let nodes = self.materialize(&input, i < last, Some(parent))?;

            let mut keeps_target = false;
            for &node in &nodes {
                keeps_target |= node == target;
                if let Some((old_parent, old_index)) = self.detach(node) {
                    if old_parent == parent && old_index < index {
                        index -= 1;
                    }
                }
            }

            let remove_count = if keeps_target { 0 } else { 1 };
            replaced.extend(self.splice(parent, index, remove_count, &nodes));
        }

        Ok(replaced)
    }

    /// Detach each target, optionally filtered by a selector first
    ///
    /// Already-detached targets are left alone, so removing twice is the same
    /// as removing once. Returns the (filtered) targets.
    pub fn remove(&mut self, targets: &[NodeId], selector: Option<&str>) -> GraftResult<Vec<NodeId>> {
        let targets = match selector {
            Some(selector) => self.query().filter(self, selector, targets)?,
            None => targets.to_vec(),
        };
        for &target in &targets {
            if self.detach(target).is_none() {
                log::trace!("remove: {target} already detached");
            }
        }
        Ok(targets)
    }

    /// Detach every child of each target
    pub fn empty(&mut self, targets: &[NodeId]) {
        for &target in targets {
            if self.get(target).can_have_children() {
                self.clear_children(target);
            }
        }
    }

    /// Replace each target's children with content
    ///
    /// Markup is parsed with the target as fragment context.
    pub fn set_html(&mut self, targets: &[NodeId], content: impl Into<NodeInput>) -> GraftResult<()> {
        let content = content.into();
        let last = targets.len().saturating_sub(1);
        for (i, &target) in targets.iter().enumerate() {
            if !self.get(target).can_have_children() {
                log::debug!("set_html: skipping leaf {target}");
                continue;
            }
            self.clear_children(target);
            let nodes = self.materialize(&content, i < last, Some(target))?;
            self.splice(target, 0, 0, &nodes);
        }
        Ok(())
    }

    /// Replace each target's children with a single text node
    pub fn set_text(&mut self, targets: &[NodeId], text: &str) {
        for &target in targets {
            if !self.get(target).can_have_children() {
                log::debug!("set_text: skipping leaf {target}");
                continue;
            }
            self.clear_children(target);
            let node = self.create_text(text);
            self.push_child(target, node);
        }
    }
}
