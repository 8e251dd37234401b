//! Prelude module for common imports.
//!
//! ```
//! use tola_graft::prelude::*;
//! ```

// Node types
pub use crate::node::{Comment, Directive, Element, Node, NodeData, NodeId, NodeKind, Text, Tree};

// Mutation
pub use crate::mutate::{NodeInput, Position};

// Collaborators
pub use crate::convert::{HtmlParser, MarkupParser, ParseOptions};
pub use crate::query::{Query, Selector, SelectorQuery};

// Attributes
pub use crate::attr::{Attrs, AttrsExt};

// Error
pub use crate::error::{GraftError, GraftResult};

// Render
pub use crate::render::{RenderConfig, render, render_children, render_node};

// Hashing
pub use crate::hash::fingerprint;

// Sharing
pub use crate::shared::SharedTree;
