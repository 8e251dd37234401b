//! Element payload - tag name plus ordered attributes
//!
//! Children are not stored here: they belong to the arena slot that holds
//! this payload (see [`Node`](super::Node)).

use crate::attr::{Attrs, AttrsExt, Name};

// =============================================================================
// Element
// =============================================================================

/// HTML/XML element payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name
    pub tag: Name,
    /// Element attributes, in source order
    pub attrs: Attrs,
}

impl Element {
    /// Create an element with no attributes
    pub fn new(tag: impl Into<Name>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    /// Create an element with the given attributes
    pub fn with_attrs(tag: impl Into<Name>, attrs: Attrs) -> Self {
        Self {
            tag: tag.into(),
            attrs,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder API
    // ─────────────────────────────────────────────────────────────────────────

    /// Add or replace an attribute (builder style)
    pub fn attr(mut self, name: impl Into<Name>, value: impl Into<String>) -> Self {
        self.attrs.set_attr(name, value);
        self
    }

    /// Set the `id` attribute (builder style)
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Set the `class` attribute (builder style)
    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attribute access
    // ─────────────────────────────────────────────────────────────────────────

    /// Get attribute value by name
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get_attr(name)
    }

    /// Set attribute value (update if exists, add if not)
    pub fn set_attr(&mut self, name: impl Into<Name>, value: impl Into<String>) {
        self.attrs.set_attr(name, value);
    }

    /// Remove attribute by name, returning the old value if it existed
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.remove_attr(name)
    }

    /// Check if attribute exists
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.has_attr(name)
    }

    /// Get the `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.get_attr("id")
    }

    /// Check whether the `class` attribute contains a token
    pub fn has_class(&self, class: &str) -> bool {
        self.attrs.has_class(class)
    }

    /// Case-insensitive tag comparison
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }
}
