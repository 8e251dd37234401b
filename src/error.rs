//! Error types for tola-graft.
//!
//! Only collaborator failures are recoverable errors. Structural operations
//! themselves cannot fail on a consistent tree; contract violations panic.

use thiserror::Error;

/// Errors surfaced by tree operations.
#[derive(Debug, Error)]
pub enum GraftError {
    /// The parsing collaborator rejected a markup string
    #[error("markup parse error at byte {offset}: {message}")]
    Parse {
        /// Byte offset into the markup where parsing stopped
        offset: usize,
        /// What went wrong
        message: String,
    },

    /// The query collaborator rejected a selector
    #[error("invalid selector `{selector}`: {message}")]
    Selector {
        /// The selector as given by the caller
        selector: String,
        /// What went wrong
        message: String,
    },

    /// A structural invariant does not hold (reported by `Tree::check_invariants`)
    #[error("tree invariant violated: {0}")]
    Invariant(String),
}

/// Result type alias for tree operations.
pub type GraftResult<T> = Result<T, GraftError>;

impl GraftError {
    /// Create a parse error at a byte offset.
    pub fn parse(offset: usize, msg: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            message: msg.into(),
        }
    }

    /// Create a selector error.
    pub fn selector(selector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: msg.into(),
        }
    }

    /// Create an invariant violation report.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}
