//! Tests for DOM tree mutation: append, insert_before, remove_child, and the
//! empty-node utilities.

use quill_dom::closing::is_node_empty;
use quill_dom::{DomTree, NodeId, NodeType, serialize_node};

/// Helper to create an element node attached to `parent`.
fn append_element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let id = tree.create_element(tag);
    tree.append_child(parent, id);
    id
}

// ========== remove_child ==========

#[test]
fn test_remove_child_middle_of_three() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "div");
    let a = append_element(&mut tree, parent, "a");
    let b = append_element(&mut tree, parent, "b");
    let c = append_element(&mut tree, parent, "c");

    tree.remove_child(parent, b);

    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
    assert_eq!(tree.parent(b), None);
}

#[test]
fn test_remove_child_ignores_non_children() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "div");
    let other = append_element(&mut tree, NodeId::ROOT, "span");
    let child = append_element(&mut tree, other, "b");

    tree.remove_child(parent, child);

    assert_eq!(tree.parent(child), Some(other));
}

// ========== insert_before / append ==========

#[test]
fn test_insert_before_first_child() {
    let mut tree = DomTree::new();
    let parent = append_element(&mut tree, NodeId::ROOT, "ul");
    let second = append_element(&mut tree, parent, "li");
    let first = tree.create_element("li");

    tree.insert_before(parent, first, second);

    assert_eq!(tree.children(parent), &[first, second]);
    assert_eq!(tree.first_child(parent), Some(first));
    assert_eq!(tree.last_child(parent), Some(second));
    assert_eq!(tree.prev_sibling(second), Some(first));
}

#[test]
fn test_append_moves_node_between_parents() {
    let mut tree = DomTree::new();
    let from = append_element(&mut tree, NodeId::ROOT, "div");
    let to = append_element(&mut tree, NodeId::ROOT, "section");
    let moved = append_element(&mut tree, from, "p");

    tree.append_child(to, moved);

    assert!(tree.children(from).is_empty());
    assert_eq!(tree.children(to), &[moved]);
    assert!(tree.is_descendant_of(moved, to));
}

// ========== traversal ==========

#[test]
fn test_descendants_are_in_tree_order() {
    let mut tree = DomTree::new();
    let html = append_element(&mut tree, NodeId::ROOT, "html");
    let head = append_element(&mut tree, html, "head");
    let body = append_element(&mut tree, html, "body");
    let div = append_element(&mut tree, body, "div");

    let order: Vec<NodeId> = tree.descendants(NodeId::ROOT).collect();
    assert_eq!(order, vec![NodeId::ROOT, html, head, body, div]);
    assert_eq!(tree.head(), Some(head));
    assert_eq!(tree.body(), Some(body));
}

#[test]
fn test_element_index_skips_text() {
    let mut tree = DomTree::new();
    let div = append_element(&mut tree, NodeId::ROOT, "div");
    let text = tree.create_text("x");
    tree.append_child(div, text);
    let p = append_element(&mut tree, div, "p");

    assert_eq!(tree.element_index(p), Some(1));
}

// ========== empty nodes / legacy closing ==========

#[test]
fn test_is_node_empty() {
    let mut tree = DomTree::new();
    let div = append_element(&mut tree, NodeId::ROOT, "div");
    assert!(is_node_empty(&tree, div));

    let text = tree.create_text("hello");
    assert!(!is_node_empty(&tree, text));

    tree.append_child(div, text);
    assert!(!is_node_empty(&tree, div));

    let blank = tree.create_text("");
    assert!(is_node_empty(&tree, blank));
}

#[test]
#[allow(deprecated)]
fn test_force_closing_tags() {
    use quill_dom::closing::force_closing_tags;

    let mut tree = DomTree::new();
    let body = append_element(&mut tree, NodeId::ROOT, "body");
    let empty_div = append_element(&mut tree, body, "div");
    let br = append_element(&mut tree, body, "br");
    let stray = tree.create_text("not allowed");
    tree.append_child(br, stray);
    let p = append_element(&mut tree, body, "p");
    let inner = append_element(&mut tree, p, "span");

    force_closing_tags(&mut tree, body);

    // Empty elements gain exactly one empty text child.
    assert_eq!(tree.children(empty_div).len(), 1);
    assert!(matches!(
        tree.get(tree.children(empty_div)[0]).map(|n| &n.node_type),
        Some(NodeType::Text(t)) if t.is_empty()
    ));
    assert_eq!(tree.children(inner).len(), 1);
    // Void elements lose their text.
    assert!(tree.children(br).is_empty());
    // Sibling order survives the reverse traversal.
    assert_eq!(tree.children(body), &[empty_div, br, p]);

    assert_eq!(
        serialize_node(&tree, body),
        "<body><div></div><br><p><span></span></p></body>"
    );
}

// ========== serialization ==========

#[test]
fn test_serialize_raw_text_and_attributes() {
    let mut tree = DomTree::new();
    let style = append_element(&mut tree, NodeId::ROOT, "style");
    if let Some(data) = tree.as_element_mut(style) {
        let _ = data.attrs.set("amp-custom", "");
    }
    let css = tree.create_text("a > b { color: red }");
    tree.append_child(style, css);

    let p = append_element(&mut tree, NodeId::ROOT, "p");
    if let Some(data) = tree.as_element_mut(p) {
        let _ = data.attrs.set("title", "say \"hi\" & bye");
    }
    let text = tree.create_text("1 < 2");
    tree.append_child(p, text);

    assert_eq!(
        serialize_node(&tree, style),
        "<style amp-custom=\"\">a > b { color: red }</style>"
    );
    assert_eq!(
        serialize_node(&tree, p),
        "<p title=\"say &quot;hi&quot; &amp; bye\">1 &lt; 2</p>"
    );
}

#[test]
fn test_serialize_valueless_attribute_bare() {
    let mut tree = DomTree::new();
    let input = append_element(&mut tree, NodeId::ROOT, "input");
    if let Some(data) = tree.as_element_mut(input) {
        let _ = data.attrs.set_valueless_if_absent("disabled");
        let _ = data.attrs.set("value", "");
    }

    assert_eq!(serialize_node(&tree, input), "<input disabled value=\"\">");
}
