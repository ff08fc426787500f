//! HTML serialization of DOM subtrees.
//!
//! [§ 13.3 Serializing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)

use quill_common::elements::{is_raw_text_element, is_void_element};

use crate::{DomTree, NodeId, NodeType};

/// Serialize `id` itself and its subtree (the node's "outer HTML").
///
/// The Document node serializes as the concatenation of its children.
#[must_use]
pub fn serialize_node(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, &mut out);
    out
}

/// [§ 13.3](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)
///
/// "The algorithm takes as input a DOM Element, Document, or DocumentFragment
/// referred to as the node" and returns the serialization of its children.
#[must_use]
pub fn serialize_children(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    for &child in tree.children(id) {
        write_node(tree, child, &mut out);
    }
    out
}

fn write_node(tree: &DomTree, id: NodeId, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };

    match &node.node_type {
        NodeType::Document => {
            for &child in &node.children {
                write_node(tree, child, out);
            }
        }
        // "If current node is a DocumentType node: Append the literal string
        // "<!DOCTYPE", followed by a space, followed by the value of current
        // node's name, followed by the literal string ">"."
        NodeType::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeType::Element(data) => {
            // "Append a U+003C LESS-THAN SIGN character (<), followed by tagname."
            out.push('<');
            out.push_str(&data.tag_name);
            // "For each attribute that the element has, append a U+0020 SPACE
            // character, the attribute's serialized name, a U+003D EQUALS SIGN
            // character (=), a U+0022 QUOTATION MARK character ("), the
            // attribute's value, escaped as described below in attribute mode,
            // and a second U+0022 QUOTATION MARK character (")."
            // Attributes parsed without a value keep their bare form.
            for attr in &data.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                if !attr.has_value {
                    continue;
                }
                out.push_str("=\"");
                escape_into(&attr.value, true, out);
                out.push('"');
            }
            out.push('>');

            // "If current node serializes as void, then continue on to the next
            // child node at this point."
            if is_void_element(&data.tag_name) {
                return;
            }

            let raw = is_raw_text_element(&data.tag_name);
            for &child in &node.children {
                match tree.get(child).map(|n| &n.node_type) {
                    // "If the parent of current node is a style, script, xmp,
                    // iframe, noembed, noframes, or plaintext element ... then
                    // append the value of current node's data literally."
                    Some(NodeType::Text(text)) if raw => out.push_str(text),
                    _ => write_node(tree, child, out),
                }
            }

            out.push_str("</");
            out.push_str(&data.tag_name);
            out.push('>');
        }
        // "Otherwise, append the value of current node's data, escaped as
        // described below."
        NodeType::Text(text) => escape_into(text, false, out),
        // "Append the literal string "<!--", followed by the value of current
        // node's data, followed by the literal string "-->"."
        NodeType::Comment(data) => {
            out.push_str("<!--");
            out.push_str(data);
            out.push_str("-->");
        }
    }
}

/// [§ 13.3 Escaping a string](https://html.spec.whatwg.org/multipage/parsing.html#escapingString)
///
/// "1. Replace any occurrence of the "&" character by the string "&amp;".
///  2. Replace any occurrences of the U+00A0 NO-BREAK SPACE character by the
///     string "&nbsp;".
///  3. If the algorithm was invoked in the attribute mode, replace any
///     occurrences of the """ character by the string "&quot;".
///  4. If the algorithm was not invoked in the attribute mode, replace any
///     occurrences of the "<" character by the string "&lt;", and any
///     occurrences of the ">" character by the string "&gt;"."
fn escape_into(text: &str, attribute_mode: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            '"' if attribute_mode => out.push_str("&quot;"),
            '<' if !attribute_mode => out.push_str("&lt;"),
            '>' if !attribute_mode => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaping_modes() {
        let mut text = String::new();
        escape_into("a < b & \"c\"", false, &mut text);
        assert_eq!(text, "a &lt; b &amp; \"c\"");

        let mut attr = String::new();
        escape_into("a < b & \"c\"", true, &mut attr);
        assert_eq!(attr, "a < b &amp; &quot;c&quot;");
    }
}
