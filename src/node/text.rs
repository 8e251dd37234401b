//! Leaf payloads: text, comments and directives
//!
//! None of these may own children.

// =============================================================================
// Text
// =============================================================================

/// Text content node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    /// Decoded text content
    pub data: String,
}

impl Text {
    /// Create a new text node
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// Check if text content is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if text is only whitespace
    pub fn is_whitespace(&self) -> bool {
        self.data.trim().is_empty()
    }
}

// =============================================================================
// Comment
// =============================================================================

/// Comment node (`<!--data-->`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub data: String,
}

impl Comment {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

// =============================================================================
// Directive
// =============================================================================

/// Markup directive such as `<!DOCTYPE html>` or `<?xml version="1.0"?>`
///
/// `name` is the lowercased leading word including its sigil (`!doctype`,
/// `?xml`); `data` is everything between `<` and `>`, verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub data: String,
}

impl Directive {
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Build a directive from its raw inner text, deriving the name
    pub fn from_raw(data: impl Into<String>) -> Self {
        let data = data.into();
        let name = data
            .split(|c: char| c.is_ascii_whitespace())
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        Self { name, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_node() {
        let text = Text::new("  \n ");
        assert!(!text.is_empty());
        assert!(text.is_whitespace());
    }

    #[test]
    fn test_directive_from_raw() {
        let doctype = Directive::from_raw("!DOCTYPE html");
        assert_eq!(doctype.name, "!doctype");
        assert_eq!(doctype.data, "!DOCTYPE html");

        let pi = Directive::from_raw("?xml version=\"1.0\"?");
        assert_eq!(pi.name, "?xml");
    }
}
