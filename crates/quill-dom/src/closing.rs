//! Empty-node checks and the legacy closing-tag pass.
//!
//! Older serializers collapse childless elements into a self-closed form
//! (`<div/>`), which HTML parsers read as an unclosed start tag. The legacy
//! pass inserts an empty text child into such elements so every serializer
//! emits an explicit end tag. The canonical serializer in [`crate::serialize`]
//! never self-closes, so new code should not need it.

use quill_common::elements::is_void_element;

use crate::{DomTree, NodeId, NodeType};

/// True iff the node has no children and no text content.
///
/// A text node with empty data counts as empty; a text node with data does not.
#[must_use]
pub fn is_node_empty(tree: &DomTree, id: NodeId) -> bool {
    let Some(node) = tree.get(id) else {
        return true;
    };
    if !node.children.is_empty() {
        return false;
    }
    match &node.node_type {
        NodeType::Text(data) | NodeType::Comment(data) => data.is_empty(),
        _ => true,
    }
}

/// Force explicit closing tags on the subtree rooted at `id`.
///
/// - Void elements lose all their children; they must never carry text.
/// - Empty non-void elements receive a single empty text child.
/// - Other elements are visited child by child in reverse order, over a
///   snapshot of the child list, so mutating a later sibling never shifts a
///   sibling that is still pending.
///
/// Non-element nodes are left untouched.
#[deprecated(note = "the canonical serializer always emits end tags for non-void elements")]
pub fn force_closing_tags(tree: &mut DomTree, id: NodeId) {
    let Some(element) = tree.as_element(id) else {
        return;
    };

    if is_void_element(&element.tag_name) {
        tree.clear_children(id);
        return;
    }

    if is_node_empty(tree, id) {
        let text = tree.create_text("");
        tree.append_child(id, text);
        return;
    }

    let children = tree.children(id).to_vec();
    for &child in children.iter().rev() {
        #[allow(deprecated)]
        force_closing_tags(tree, child);
    }
}
