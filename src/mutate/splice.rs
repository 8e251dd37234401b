//! Splice primitive
//!
//! Every structural edit funnels through [`Tree::splice`]. It is the only code
//! that writes `parent`/`prev`/`next`, so the link invariants have exactly one
//! place to be maintained.

use rustc_hash::FxHashSet;

use crate::node::{NodeId, Tree};

impl Tree {
    /// Replace `remove_count` children of `owner` starting at `at` with `insert`
    ///
    /// Nodes in `insert` that are attached elsewhere (including under `owner`
    /// itself) are detached first. When such a node sat under `owner` before
    /// `at`, `at` shifts left by one so that the run lands where the caller
    /// meant it to; when it sat inside the removal window, the window shrinks
    /// by one because the node is being moved, not dropped.
    ///
    /// Returns the removed run. Removed nodes are fully detached: their
    /// `parent`, `prev` and `next` are all cleared.
    ///
    /// # Panics
    ///
    /// Contract violations panic: `owner` is a leaf, `at`/`remove_count` are
    /// out of range, `insert` contains a duplicate, a Document node, or an
    /// inclusive ancestor of `owner`.
    pub fn splice(
        &mut self,
        owner: NodeId,
        at: usize,
        remove_count: usize,
        insert: &[NodeId],
    ) -> Vec<NodeId> {
        assert!(
            self.get(owner).can_have_children(),
            "splice: {owner} cannot own children"
        );
        let len = self.get(owner).children.len();
        assert!(
            at <= len && remove_count <= len - at,
            "splice: range {at}+{remove_count} out of bounds for {owner} with {len} children"
        );

        let mut at = at;
        let mut remove_count = remove_count;

        let mut seen = FxHashSet::default();
        for &node in insert {
            assert!(
                seen.insert(node),
                "splice: {node} appears twice in the inserted run"
            );
            assert!(
                !self.data(node).is_document(),
                "splice: document {node} cannot become a child"
            );
            assert!(
                !self.is_inclusive_ancestor(node, owner),
                "splice: inserting {node} under {owner} would create a cycle"
            );

            if let Some((old_parent, old_index)) = self.detach(node) {
                if old_parent == owner {
                    if old_index < at {
                        at -= 1;
                    } else if old_index < at + remove_count {
                        remove_count -= 1;
                    }
                }
            }
        }

        let removed: Vec<NodeId> = {
            let children = &mut self.nodes[owner.index()].children;
            let removed = children.drain(at..at + remove_count).collect();
            children.insert_many(at, insert.iter().copied());
            removed
        };

        for &node in &removed {
            self.clear_links(node);
        }
        for &node in insert {
            self.nodes[node.index()].parent = Some(owner);
        }
        self.relink(owner, at.saturating_sub(1), at + insert.len() + 1);

        log::trace!(
            "splice {owner}@{at}: removed {}, inserted {}",
            removed.len(),
            insert.len()
        );
        removed
    }

    /// Detach `node` from its parent, returning the former parent and index
    ///
    /// A no-op returning `None` when the node is already detached.
    pub fn detach(&mut self, node: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.get(node).parent?;
        let Some(index) = self.index_in_parent(node) else {
            // Parent link without membership cannot come out of splice; clear it
            // so the node is at least consistently detached.
            log::debug!("detach: {node} not found under its parent {parent}");
            self.clear_links(node);
            return None;
        };
        self.splice(parent, index, 1, &[]);
        Some((parent, index))
    }

    /// Append a freshly created node without any of the move bookkeeping
    ///
    /// Used by builders (parser, deep clone) that only ever attach detached
    /// nodes to the end of a container.
    pub(crate) fn push_child(&mut self, owner: NodeId, child: NodeId) {
        debug_assert!(self.get(owner).can_have_children());
        debug_assert!(self.get(child).is_detached());
        let last = self.last_child(owner);
        self.nodes[owner.index()].children.push(child);
        let slot = &mut self.nodes[child.index()];
        slot.parent = Some(owner);
        slot.prev = last;
        slot.next = None;
        if let Some(last) = last {
            self.nodes[last.index()].next = Some(child);
        }
    }

    /// Detach every child of `owner` at once
    pub(crate) fn clear_children(&mut self, owner: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[owner.index()].children);
        for &child in &children {
            self.clear_links(child);
        }
        children.into_vec()
    }

    fn clear_links(&mut self, node: NodeId) {
        let slot = &mut self.nodes[node.index()];
        slot.parent = None;
        slot.prev = None;
        slot.next = None;
    }

    /// Rewrite prev/next for `owner`'s children in `[from, to)`, clamped
    fn relink(&mut self, owner: NodeId, from: usize, to: usize) {
        let len = self.nodes[owner.index()].children.len();
        for i in from..to.min(len) {
            let children = &self.nodes[owner.index()].children;
            let node = children[i];
            let prev = i.checked_sub(1).map(|p| children[p]);
            let next = children.get(i + 1).copied();
            let slot = &mut self.nodes[node.index()];
            slot.prev = prev;
            slot.next = next;
        }
    }
}
