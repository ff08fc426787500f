//! Integration tests for the HTML tree builder.

use quill_dom::{DomTree, NodeId, NodeType, serialize_children, serialize_node};
use quill_html::{HTMLParser, HTMLTokenizer, parse_document};

/// Helper to parse HTML and return the DOM tree
fn parse(html: &str) -> DomTree {
    let mut tokenizer = HTMLTokenizer::new(html.to_string());
    tokenizer.run();
    HTMLParser::new(tokenizer.into_tokens()).run()
}

/// Helper to serialize the body's children
fn body_html(tree: &DomTree) -> String {
    tree.body()
        .map(|body| serialize_children(tree, body))
        .unwrap_or_default()
}

#[test]
fn test_document_structure() {
    let tree = parse("<!DOCTYPE html><html><head></head><body></body></html>");

    let children = tree.children(NodeId::ROOT);
    assert_eq!(children.len(), 2);
    assert!(matches!(
        tree.get(children[0]).map(|n| &n.node_type),
        Some(NodeType::Doctype(name)) if name == "html"
    ));
    assert_eq!(tree.document_element(), Some(children[1]));
    assert!(tree.head().is_some());
    assert!(tree.body().is_some());
}

#[test]
fn test_implied_html_head_and_body() {
    let tree = parse("Hello");
    assert_eq!(
        serialize_node(&tree, NodeId::ROOT),
        "<html><head></head><body>Hello</body></html>"
    );
}

#[test]
fn test_full_document_serializes_back() {
    let html = "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
                <style amp-custom=\"\">a > b {}</style></head>\
                <body><p class=\"x\">hi</p></body></html>";
    let tree = parse(html);
    assert_eq!(serialize_node(&tree, NodeId::ROOT), html);
}

#[test]
fn test_text_is_coalesced() {
    let tree = parse("<p>one two</p>");
    let Some(p) = tree.elements_by_tag_name(NodeId::ROOT, "p").first().copied() else {
        panic!("p not found");
    };
    assert_eq!(tree.children(p).len(), 1);
    assert_eq!(tree.text_content(p), "one two");
}

#[test]
fn test_paragraphs_close_implicitly() {
    let tree = parse("<p>one<p>two<div>three</div>");
    assert_eq!(body_html(&tree), "<p>one</p><p>two</p><div>three</div>");
}

#[test]
fn test_list_items_close_implicitly() {
    let tree = parse("<ul><li>a<li>b</ul><dl><dt>t<dd>d</dl>");
    assert_eq!(
        body_html(&tree),
        "<ul><li>a</li><li>b</li></ul><dl><dt>t</dt><dd>d</dd></dl>"
    );
}

#[test]
fn test_void_end_tags_are_dropped() {
    let tree = parse("<div>a<br></br>b<img src=\"x.png\"></img></div>");
    assert_eq!(body_html(&tree), "<div>a<br>b<img src=\"x.png\"></div>");
}

#[test]
fn test_self_closing_in_svg() {
    let tree = parse("<svg><rect width=\"1\"/><circle/></svg><div/>text");
    assert_eq!(
        body_html(&tree),
        "<svg><rect width=\"1\"></rect><circle></circle></svg><div>text</div>"
    );
}

#[test]
fn test_head_content_after_head_goes_into_head() {
    let tree = parse("<html><head></head><link rel=\"x\"><body></body></html>");
    let Some(head) = tree.head() else {
        panic!("head not found");
    };
    assert_eq!(serialize_children(&tree, head), "<link rel=\"x\">");
}

#[test]
fn test_noscript_in_head_keeps_its_content() {
    let tree = parse(
        "<head><noscript><style amp-boilerplate>body{}</style></noscript></head><body></body>",
    );
    let Some(head) = tree.head() else {
        panic!("head not found");
    };
    assert_eq!(
        serialize_children(&tree, head),
        "<noscript><style amp-boilerplate>body{}</style></noscript>"
    );
}

#[test]
fn test_template_content_is_parsed_in_place() {
    let tree =
        parse("<body><template type=\"amp-mustache\"><p>x</p></template><span>y</span>");
    assert_eq!(
        body_html(&tree),
        "<template type=\"amp-mustache\"><p>x</p></template><span>y</span>"
    );
}

#[test]
fn test_comments_are_kept() {
    let tree = parse("<!-- top --><html><body><!--in--></body></html>");
    assert!(matches!(
        tree.get(tree.children(NodeId::ROOT)[0]).map(|n| &n.node_type),
        Some(NodeType::Comment(data)) if data == " top "
    ));
    assert_eq!(body_html(&tree), "<!--in-->");
}

#[test]
fn test_stray_end_tag_is_reported() {
    let (tree, issues) = parse_document("<div></span>x</div>");
    assert_eq!(body_html(&tree), "<div>x</div>");
    assert!(issues.iter().any(|i| i.message.contains("</span>")));
}
