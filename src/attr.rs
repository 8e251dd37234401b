//! Attribute system for elements
//!
//! Attributes are an ordered list of name/value pairs. Insertion order is
//! preserved so rendering reproduces the source order.

use compact_str::CompactString;

/// Element tag or attribute name
pub type Name = CompactString;

/// Element attributes as ordered key-value pairs
pub type Attrs = Vec<(Name, String)>;

/// Name-keyed access to an [`Attrs`] list
pub trait AttrsExt {
    /// Slot of the attribute called `name`
    fn attr_index(&self, name: &str) -> Option<usize>;

    /// Value of the attribute called `name`
    fn get_attr(&self, name: &str) -> Option<&str>;

    fn has_attr(&self, name: &str) -> bool {
        self.attr_index(name).is_some()
    }

    /// Overwrite an existing value in its slot, or add the pair last.
    fn set_attr(&mut self, name: impl Into<Name>, value: impl Into<String>);

    /// Drop the attribute, handing back its value.
    fn remove_attr(&mut self, name: &str) -> Option<String>;

    /// Tokens of `class`, empty when absent
    fn classes(&self) -> std::str::SplitAsciiWhitespace<'_> {
        self.get_attr("class").unwrap_or_default().split_ascii_whitespace()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes().any(|token| token == class)
    }
}

impl AttrsExt for Attrs {
    fn attr_index(&self, name: &str) -> Option<usize> {
        self.iter().position(|(key, _)| key.as_str() == name)
    }

    fn get_attr(&self, name: &str) -> Option<&str> {
        let i = self.attr_index(name)?;
        Some(&self[i].1)
    }

    fn set_attr(&mut self, name: impl Into<Name>, value: impl Into<String>) {
        let name = name.into();
        match self.attr_index(&name) {
            Some(i) => self[i].1 = value.into(),
            None => self.push((name, value.into())),
        }
    }

    fn remove_attr(&mut self, name: &str) -> Option<String> {
        let i = self.attr_index(name)?;
        Some(self.remove(i).1)
    }
}

// =============================================================================
// Tests
// =============================================================================
