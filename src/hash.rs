//! Structural fingerprints
//!
//! A fingerprint digests a subtree's shape and payloads with blake3. It never
//! looks at node ids or at anything outside the subtree, so a deep clone
//! fingerprints the same as its original wherever either one lives.

use crate::node::{NodeData, NodeId, Tree};

// =============================================================================
// StableHasher - Builder Pattern
// =============================================================================

/// A deterministic hasher using blake3
///
/// Unlike `std::hash::Hasher`, this produces the same output across
/// process restarts for the same input.
pub struct StableHasher {
    inner: blake3::Hasher,
}

impl StableHasher {
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    /// Update with raw bytes
    #[inline]
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Update with a length-prefixed string
    ///
    /// The prefix keeps `("ab", "c")` and `("a", "bc")` apart.
    #[inline]
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.update_usize(s.len());
        self.update(s.as_bytes())
    }

    /// Update with a usize value (little-endian, widened to u64)
    #[inline]
    pub fn update_usize(&mut self, v: usize) -> &mut Self {
        self.update(&(v as u64).to_le_bytes())
    }

    /// Finish and return the first 8 bytes of the digest as a u64
    #[inline]
    pub fn finish(&self) -> u64 {
        let hash = self.inner.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Fingerprints
// =============================================================================

/// Fingerprint of the subtree rooted at `node`
///
/// Nodes are digested in document order: payload, child count, then each
/// child's subtree.
pub fn fingerprint(tree: &Tree, node: NodeId) -> u64 {
    let mut hasher = StableHasher::new();
    let mut stack = vec![node];
    while let Some(id) = stack.pop() {
        hash_node(tree, id, &mut hasher);
        let children = tree.children(id);
        hasher.update_usize(children.len());
        stack.extend(children.iter().rev().copied());
    }
    hasher.finish()
}

fn hash_node(tree: &Tree, node: NodeId, hasher: &mut StableHasher) {
    match tree.data(node) {
        NodeData::Element(elem) => {
            hasher.update(b"E").update_str(&elem.tag);
            hasher.update_usize(elem.attrs.len());
            for (name, value) in &elem.attrs {
                hasher.update_str(name).update_str(value);
            }
        }
        NodeData::Text(text) => {
            hasher.update(b"T").update_str(&text.data);
        }
        NodeData::Comment(comment) => {
            hasher.update(b"C").update_str(&comment.data);
        }
        NodeData::Directive(directive) => {
            hasher.update(b"D").update_str(&directive.data);
        }
        NodeData::Document => {
            hasher.update(b"R");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_hasher_deterministic() {
        let a = StableHasher::new().update_str("hello").update_usize(3).finish();
        let b = StableHasher::new().update_str("hello").update_usize(3).finish();
        assert_eq!(a, b);
    }

    #[test]
    fn test_update_str_is_length_prefixed() {
        let a = StableHasher::new().update_str("ab").update_str("c").finish();
        let b = StableHasher::new().update_str("a").update_str("bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_ignores_identity_and_position() {
        let mut tree = Tree::parse("<div><p class=\"x\">hi</p></div>").unwrap();
        let p = tree.select_first("p").unwrap().unwrap();
        let copy = tree.deep_clone(p);
        assert_eq!(fingerprint(&tree, p), fingerprint(&tree, copy));

        let root = tree.root();
        tree.append(&[root], copy).unwrap();
        assert_eq!(fingerprint(&tree, p), fingerprint(&tree, copy));
    }

    #[test]
    fn test_fingerprint_sees_changes() {
        let mut tree = Tree::parse("<p>a</p><p>a</p><p><b>a</b></p>").unwrap();
        let ps = tree.select("p").unwrap();
        assert_eq!(fingerprint(&tree, ps[0]), fingerprint(&tree, ps[1]));
        assert_ne!(fingerprint(&tree, ps[0]), fingerprint(&tree, ps[2]));

        tree.element_mut(ps[1]).unwrap().set_attr("id", "z");
        assert_ne!(fingerprint(&tree, ps[0]), fingerprint(&tree, ps[1]));
    }
}
