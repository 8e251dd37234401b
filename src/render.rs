//! Markup rendering
//!
//! Serializes nodes back to HTML or XML text. Rendering is how callers
//! observe the result of mutations; the engine itself never renders.
//! All options travel in an explicit [`RenderConfig`].

use crate::convert::markup::{is_raw_text_element, is_void_element};
use crate::node::{Element, NodeData, NodeId, Tree};

// =============================================================================
// RenderConfig
// =============================================================================

/// Configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// XML serialization: empty elements self-close, no void or raw text rules.
    pub xml_mode: bool,
    /// Write HTML void elements as `<br />` instead of `<br>`.
    pub self_close_void: bool,
}

impl RenderConfig {
    /// HTML output (`<br>`, raw `script`/`style` bodies).
    pub const HTML: Self = Self {
        xml_mode: false,
        self_close_void: false,
    };

    /// XML output (`<empty/>`, everything escaped).
    pub const XML: Self = Self {
        xml_mode: true,
        self_close_void: false,
    };

    /// Switch between HTML and XML rules.
    pub fn with_xml_mode(mut self, xml_mode: bool) -> Self {
        self.xml_mode = xml_mode;
        self
    }

    /// Write void elements with a trailing slash.
    pub fn with_self_close_void(mut self, self_close: bool) -> Self {
        self.self_close_void = self_close;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::HTML
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Render a sequence of nodes, concatenated.
///
/// A Document node renders as its children.
pub fn render(tree: &Tree, nodes: &[NodeId], config: &RenderConfig) -> String {
    let mut output = String::new();
    for &node in nodes {
        write_node(tree, node, config, &mut output);
    }
    output
}

/// Render one node (outer markup).
pub fn render_node(tree: &Tree, node: NodeId, config: &RenderConfig) -> String {
    render(tree, &[node], config)
}

/// Render the children of a node (inner markup).
pub fn render_children(tree: &Tree, node: NodeId, config: &RenderConfig) -> String {
    render(tree, tree.children(node), config)
}

/// Render a node to bytes.
pub fn render_bytes(tree: &Tree, node: NodeId, config: &RenderConfig) -> Vec<u8> {
    render_node(tree, node, config).into_bytes()
}

// =============================================================================
// Writers
// =============================================================================

/// Pending work while walking a subtree
enum Step {
    Enter(NodeId),
    Close(NodeId),
}

fn write_node(tree: &Tree, node: NodeId, config: &RenderConfig, output: &mut String) {
    let mut stack = vec![Step::Enter(node)];
    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Enter(id) => id,
            Step::Close(id) => {
                if let Some(elem) = tree.element(id) {
                    output.push_str("</");
                    output.push_str(&elem.tag);
                    output.push('>');
                }
                continue;
            }
        };

        let children = tree.children(id);
        match tree.data(id) {
            NodeData::Element(elem) => {
                if !write_start_tag(elem, children.is_empty(), config, output) {
                    continue;
                }
                stack.push(Step::Close(id));
            }
            NodeData::Text(text) => {
                let raw = !config.xml_mode
                    && tree
                        .parent(id)
                        .and_then(|p| tree.element(p))
                        .is_some_and(|e| is_raw_text_element(&e.tag));
                if raw {
                    output.push_str(&text.data);
                } else {
                    push_escaped(output, &text.data, false);
                }
            }
            NodeData::Comment(comment) => {
                output.push_str("<!--");
                output.push_str(&comment.data);
                output.push_str("-->");
            }
            NodeData::Directive(directive) => {
                output.push('<');
                output.push_str(&directive.data);
                output.push('>');
            }
            NodeData::Document => {}
        }
        stack.extend(children.iter().rev().map(|&child| Step::Enter(child)));
    }
}

/// Write `<tag attrs...>`, returning whether content and an end tag follow
fn write_start_tag(elem: &Element, empty: bool, config: &RenderConfig, output: &mut String) -> bool {
    output.push('<');
    output.push_str(&elem.tag);
    for (name, value) in &elem.attrs {
        output.push(' ');
        output.push_str(name);
        output.push_str("=\"");
        push_escaped(output, value, true);
        output.push('"');
    }

    if config.xml_mode {
        if empty {
            output.push_str("/>");
            return false;
        }
    } else if is_void_element(&elem.tag) {
        output.push_str(if config.self_close_void { " />" } else { ">" });
        return false;
    }
    output.push('>');
    true
}

/// Append `s` with markup-significant characters escaped
///
/// Attribute values additionally escape `"`.
fn push_escaped(output: &mut String, s: &str, attr: bool) {
    let mut rest = s;
    while let Some(pos) = rest.find(|c| matches!(c, '&' | '<' | '>' | '"')) {
        output.push_str(&rest[..pos]);
        match rest.as_bytes()[pos] {
            b'&' => output.push_str("&amp;"),
            b'<' => output.push_str("&lt;"),
            b'>' => output.push_str("&gt;"),
            _ if attr => output.push_str("&quot;"),
            _ => output.push('"'),
        }
        rest = &rest[pos + 1..];
    }
    output.push_str(rest);
}

// =============================================================================
// Tests
// =============================================================================
