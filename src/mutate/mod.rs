//! Tree mutation engine
//!
//! All operations are methods on [`Tree`](crate::node::Tree) and act on a
//! list of target ids. They are layered as:
//!
//! - `splice`: the single primitive that rewrites parent/prev/next links
//! - `content`: normalizes [`NodeInput`] into splice-ready node lists, deep clones
//! - `structural`: append/prepend/before/after, replace, remove, empty, set_html
//! - `wrap`: wrap, wrap_inner, wrap_all, unwrap
//!
//! When one piece of content goes to several targets, every target but the
//! last receives a deep clone and the last receives the original nodes.

mod content;
mod splice;
mod structural;
mod wrap;

pub use content::NodeInput;
pub use structural::Position;
