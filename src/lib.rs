//! tola-graft - Mutable markup tree with structural editing
//!
//! ## Core Concepts
//!
//! **Arena tree**: every node lives in a [`Tree`] and is addressed by a
//! [`NodeId`]. A node's `children` sequence is the only ownership relation;
//! `parent`, `prev` and `next` are derived links kept in sync by one splice
//! primitive, so they always agree with the children sequences.
//!
//! **Move vs. clone**: inserting existing nodes moves them. When the same
//! content goes to several targets, all targets but the last get deep clones
//! and the last gets the originals.
//!
//! **Collaborators**: markup parsing ([`MarkupParser`]), selector matching
//! ([`Query`]) and rendering ([`render`]) sit behind small seams with bundled
//! implementations.
//!
//! ## Modules
//! - `node`: `Tree`, `NodeId`, `NodeData` and payload types
//! - `mutate`: structural operations (append, before, replace_with, wrap, ...)
//! - `convert`: `MarkupParser` and the bundled `HtmlParser`
//! - `query`: `Query` and the bundled `SelectorQuery`
//! - `render`: HTML / XML serialization
//! - `hash`: structural fingerprints
//! - `shared`: `SharedTree` for cross-thread use
//!
//! ## Usage
//!
//! ```
//! use tola_graft::prelude::*;
//!
//! let mut tree = Tree::parse(r#"<ul id="f"><li class="a">A</li><li class="c">C</li></ul>"#)?;
//! let a = tree.select("li.a")?;
//! tree.after(&a, r#"<li class="b">B</li>"#)?;
//!
//! let ul = tree.select("#f")?;
//! assert_eq!(
//!     render(&tree, &ul, &RenderConfig::HTML),
//!     r#"<ul id="f"><li class="a">A</li><li class="b">B</li><li class="c">C</li></ul>"#
//! );
//! # Ok::<(), tola_graft::GraftError>(())
//! ```

// =============================================================================
// Modules
// =============================================================================

/// Accessor-generating macros (must come first)
#[macro_use]
mod macros;

/// Attribute list helpers
pub mod attr;

/// Error types
pub mod error;

/// Node types: Tree, NodeId, NodeData, Element, Text
pub mod node;

/// Structural operations on trees
pub mod mutate;

/// Markup parsing collaborators
pub mod convert;

/// Selector matching collaborators
pub mod query;

/// HTML / XML rendering
pub mod render;

/// Structural fingerprints
pub mod hash;

/// Lock-guarded shared trees
pub mod shared;

/// Prelude for common imports
pub mod prelude;

// =============================================================================
// Re-exports
// =============================================================================

// Node types
pub use node::{Children, Comment, Directive, Element, Node, NodeData, NodeId, NodeKind, Text, Tree};

// Mutation
pub use mutate::{NodeInput, Position};

// Collaborators
pub use convert::{HtmlParser, MarkupParser, ParseOptions};
pub use query::{Query, Selector, SelectorQuery};
pub use render::RenderConfig;

// Attribute types
pub use attr::{Attrs, AttrsExt, Name};

// Error types
pub use error::{GraftError, GraftResult};

// Hashing
pub use hash::{StableHasher, fingerprint};

// Sharing
pub use shared::SharedTree;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    const LIST: &str = r#"<ul id="f"><li class="a">A</li><li class="b">B</li><li class="c">C</li></ul>"#;

    fn one(tree: &Tree, selector: &str) -> NodeId {
        tree.select_first(selector).unwrap().unwrap()
    }

    #[test]
    fn test_append_to_list() {
        let mut tree = Tree::parse(LIST).unwrap();
        let (ul, c) = (one(&tree, "ul"), one(&tree, ".c"));

        let added = tree.append(&[ul], r#"<li class="d">D</li>"#).unwrap();
        let d = added[0];
        assert!(
            render_children(&tree, ul, &RenderConfig::HTML)
                .ends_with(r#"<li class="b">B</li><li class="c">C</li><li class="d">D</li>"#)
        );
        assert_eq!(tree.prev(d), Some(c));
        assert_eq!(tree.next(d), None);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_before_two_items() {
        let mut tree = Tree::parse(LIST).unwrap();
        let (a, c) = (one(&tree, ".a"), one(&tree, ".c"));

        let inserted = tree.insert_before(r#"<li class="x">X</li>"#, &[a, c]).unwrap();
        assert_eq!(inserted.len(), 2);
        assert_ne!(inserted[0], inserted[1]);
        assert_eq!(tree.prev(a), Some(inserted[0]));
        assert_eq!(tree.prev(c), Some(inserted[1]));
        for &x in &inserted {
            assert!(tree.element(x).unwrap().has_class("x"));
            assert_eq!(tree.text_content(x), "X");
        }
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_twice() {
        let mut tree = Tree::parse(LIST).unwrap();
        let (ul, a) = (one(&tree, "ul"), one(&tree, ".a"));

        tree.remove(&[a], None).unwrap();
        assert_eq!(tree.children(ul).len(), 2);
        tree.remove(&[a], None).unwrap();
        assert_eq!(tree.children(ul).len(), 2);
        assert_eq!(tree.text_content(ul), "BC");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_wrap_all_non_adjacent() {
        let mut tree = Tree::parse(LIST).unwrap();
        let (ul, a, b, c) = (one(&tree, "ul"), one(&tree, ".a"), one(&tree, ".b"), one(&tree, ".c"));

        tree.wrap_all(&[a, c], r#"<div class="w"></div>"#).unwrap();
        let div = one(&tree, "div.w");
        assert_eq!(tree.children(ul), &[div, b]);
        assert_eq!(tree.children(div), &[a, c]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_clone_is_independent() {
        let mut tree = Tree::parse(LIST).unwrap();
        let a = one(&tree, ".a");

        let copy = tree.deep_clone(a);
        assert_eq!(
            render_node(&tree, copy, &RenderConfig::HTML),
            render_node(&tree, a, &RenderConfig::HTML)
        );
        tree.set_text(&[copy], "changed");
        assert_eq!(tree.text_content(a), "A");
        assert_eq!(render_node(&tree, a, &RenderConfig::HTML), r#"<li class="a">A</li>"#);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_invariants_hold_through_an_edit_session() {
        let mut tree = Tree::parse(LIST).unwrap();
        let items = tree.select("li").unwrap();
        let ul = one(&tree, "ul");

        tree.prepend(&[ul], items[2]).unwrap();
        tree.check_invariants().unwrap();
        tree.wrap(&items, "<span></span>").unwrap();
        tree.check_invariants().unwrap();
        tree.unwrap(&items, Some("span")).unwrap();
        tree.check_invariants().unwrap();
        tree.replace_with(&items[..1], "<li>new</li><li>er</li>").unwrap();
        tree.check_invariants().unwrap();
        tree.append_to(items[1], &items[2..]).unwrap();
        tree.check_invariants().unwrap();
        tree.wrap_inner(&[ul], "<ol></ol>").unwrap();
        tree.check_invariants().unwrap();
        tree.empty(&[ul]);
        tree.check_invariants().unwrap();

        assert!(tree.children(ul).is_empty());
    }

    #[test]
    fn test_deep_nesting_clones_renders_and_fingerprints() {
        const DEPTH: usize = 50_000;
        let markup = format!("{}x{}", "<div>".repeat(DEPTH), "</div>".repeat(DEPTH));
        let mut tree = Tree::parse(&markup).unwrap();
        let root = tree.root();
        let outer = tree.first_child(root).unwrap();

        let copy = tree.deep_clone(outer);
        assert_eq!(tree.descendants(copy).count(), DEPTH);
        assert_eq!(fingerprint(&tree, copy), fingerprint(&tree, outer));
        assert_eq!(render_node(&tree, copy, &RenderConfig::HTML), markup);

        // Fan-out to two targets clones through materialize
        let sections = tree.append(&[root], "<section></section><section></section>").unwrap();
        tree.append(&sections, outer).unwrap();
        let cloned = tree.first_child(sections[0]).unwrap();
        assert_ne!(cloned, outer);
        assert_eq!(tree.first_child(sections[1]), Some(outer));
        assert_eq!(fingerprint(&tree, cloned), fingerprint(&tree, outer));
        tree.check_invariants().unwrap();
    }

    /// Deterministic generator for the randomized edit session
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            self.0 >> 33
        }

        fn below(&mut self, n: usize) -> usize {
            (self.next() % n as u64) as usize
        }
    }

    #[test]
    fn test_invariants_hold_through_random_edits() {
        let mut tree = Tree::parse(LIST).unwrap();
        let root = tree.root();
        let mut rng = Lcg(0x5eed_1234);

        for step in 0..3000 {
            let nodes: Vec<NodeId> = tree.descendants(root).collect();
            if nodes.len() < 3 {
                tree.append(&[root], LIST).unwrap();
                continue;
            }
            if nodes.len() > 120 {
                let ul = tree.children(root).to_vec();
                tree.remove(&ul[..1], None).unwrap();
                tree.check_invariants().unwrap();
                continue;
            }

            // Up to three targets, none nested inside another
            let mut targets: Vec<NodeId> = Vec::new();
            for _ in 0..=rng.below(3) {
                let t = nodes[rng.below(nodes.len())];
                let nested = targets
                    .iter()
                    .any(|&o| tree.is_inclusive_ancestor(o, t) || tree.is_inclusive_ancestor(t, o));
                if !nested {
                    targets.push(t);
                }
            }

            // Existing content must not contain a target
            let existing = nodes[rng.below(nodes.len())];
            let movable = targets.iter().all(|&t| !tree.is_inclusive_ancestor(existing, t));
            let content = if movable && rng.below(2) == 0 {
                NodeInput::from(existing)
            } else {
                NodeInput::from(format!(r#"<li class="n{step}">{step}</li>"#))
            };

            match rng.below(11) {
                0 => {
                    tree.append(&targets, content).unwrap();
                }
                1 => {
                    tree.before(&targets, content).unwrap();
                }
                2 => {
                    tree.after(&targets, content).unwrap();
                }
                3 => {
                    tree.replace_with(&targets, content).unwrap();
                }
                4 => {
                    tree.remove(&targets, None).unwrap();
                }
                5 => tree.empty(&targets),
                6 => {
                    tree.wrap(&targets, "<b><i></i></b>").unwrap();
                }
                7 => {
                    tree.wrap_all(&targets, "<span></span>").unwrap();
                }
                8 => {
                    tree.wrap_inner(&targets, "<em></em>").unwrap();
                }
                9 => {
                    tree.unwrap(&targets, None).unwrap();
                }
                _ => {
                    if movable {
                        tree.insert_after(existing, &targets).unwrap();
                    }
                }
            }
            if let Err(err) = tree.check_invariants() {
                panic!("step {step}: {err}");
            }
        }
    }
}
