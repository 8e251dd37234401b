//! Shared trees
//!
//! [`Tree`] has no interior locking. Code that mutates one tree from several
//! threads holds it in a [`SharedTree`], which serializes writers behind a
//! `parking_lot::RwLock`.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::GraftResult;
use crate::node::Tree;

/// Cloneable, thread-safe handle to one tree
///
/// Clones share the same tree.
#[derive(Debug, Default)]
pub struct SharedTree {
    inner: Arc<RwLock<Tree>>,
}

impl Clone for SharedTree {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl From<Tree> for SharedTree {
    fn from(tree: Tree) -> Self {
        Self::new(tree)
    }
}

impl SharedTree {
    pub fn new(tree: Tree) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Parse markup into a new shared tree
    pub fn parse(markup: &str) -> GraftResult<Self> {
        Tree::parse(markup).map(Self::new)
    }

    /// Execute a closure with read access to the tree.
    pub fn with_read<R>(&self, f: impl FnOnce(&Tree) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Execute a closure with exclusive write access to the tree.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut Tree) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Copy the current tree out of the lock
    pub fn snapshot(&self) -> Tree {
        self.with_read(Tree::clone)
    }

    /// Whether two handles point at the same tree
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderConfig, render_children};
    use static_assertions::assert_impl_all;

    assert_impl_all!(Tree: Send, Sync, Clone);
    assert_impl_all!(SharedTree: Send, Sync, Clone);

    #[test]
    fn test_clones_share_the_tree() {
        let shared = SharedTree::parse("<ul></ul>").unwrap();
        let other = shared.clone();
        assert!(shared.ptr_eq(&other));

        other.with_write(|tree| {
            let ul = tree.select("ul").unwrap();
            tree.append(&ul, "<li>x</li>").unwrap();
        });
        let html = shared.with_read(|tree| render_children(tree, tree.root(), &RenderConfig::HTML));
        assert_eq!(html, "<ul><li>x</li></ul>");
    }

    #[test]
    fn test_concurrent_writers() {
        let shared = SharedTree::parse("<ul></ul>").unwrap();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared.with_write(|tree| {
                        let ul = tree.select("ul").unwrap();
                        tree.append(&ul, format!("<li>{i}</li>")).unwrap();
                    })
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        shared.with_read(|tree| {
            let ul = tree.select_first("ul").unwrap().unwrap();
            assert_eq!(tree.children(ul).len(), 4);
            tree.check_invariants().unwrap();
        });
    }

    #[test]
    fn test_snapshot_is_independent() {
        let shared = SharedTree::parse("<p>a</p>").unwrap();
        let snapshot = shared.snapshot();
        shared.with_write(|tree| {
            let root = tree.root();
            tree.empty(&[root]);
        });
        assert_eq!(snapshot.children(snapshot.root()).len(), 1);
        assert!(shared.with_read(|tree| tree.children(tree.root()).is_empty()));
    }
}
