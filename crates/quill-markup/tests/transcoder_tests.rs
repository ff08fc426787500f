//! Integration tests for the transcoder.

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use quill_markup::{
    Document, PlaceholderRegistry, TEMPLATE_PLACEHOLDER_PREFIX, Transcoder, close_void_elements,
};

/// Helper to build a transcoder with a fixed salt
fn transcoder() -> Transcoder {
    Transcoder::new(PlaceholderRegistry::with_salt("transcoder-tests"))
}

/// Encode a fragment, parse it, serialize the body and decode it again.
fn round_trip(markup: &str) -> String {
    let registry = PlaceholderRegistry::with_salt("round-trip");
    match Document::from_fragment_with_registry(markup, "utf-8", registry) {
        Ok(doc) => doc.body_content(),
        Err(e) => panic!("fragment failed to parse: {e}"),
    }
}

fn substitute(transcoder: &Transcoder, token: &str) -> String {
    transcoder
        .registry()
        .template_placeholders()
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, s)| s.clone())
        .unwrap_or_default()
}

#[test]
fn test_binding_attribute_round_trip() {
    assert_eq!(
        round_trip(r#"<div [text]="foo"></div>"#),
        r#"<div [text]="foo"></div>"#
    );
}

#[test]
fn test_valueless_attributes_round_trip() {
    assert_eq!(round_trip("<div [hidden]></div>"), "<div [hidden]></div>");
    assert_eq!(
        round_trip(r#"<input disabled [disabled]="off" checked="">"#),
        r#"<input disabled [disabled]="off" checked="">"#
    );
}

#[test]
fn test_binding_attributes_mixed_with_plain_ones() {
    let markup = r#"<amp-img src="a.png" [src]="img.url" width="10" [class]="{{c}}"></amp-img>"#;
    assert_eq!(round_trip(markup), markup);
}

#[test]
fn test_template_delimiters_in_text_and_attributes() {
    let markup = r#"<template type="amp-mustache"><a href="{{url}}">{{#items}}{{{html}}}{{/items}}{{^none}}x{{/none}}</a></template>"#;
    assert_eq!(round_trip(markup), markup);
}

#[test]
fn test_triple_braces_leave_no_dangling_delimiters() {
    let transcoder = transcoder();
    let encoded = transcoder.encode("{{{x}}}");
    assert!(!encoded.contains('{') && !encoded.contains('}'));
    assert_eq!(
        encoded,
        format!(
            "{}x{}",
            substitute(&transcoder, "{{{"),
            substitute(&transcoder, "}}}")
        )
    );
}

#[test]
fn test_void_elements_come_back_canonical() {
    assert_eq!(round_trip("<p>a<br>b</p><hr>"), "<p>a<br>b</p><hr>");
    assert_eq!(round_trip("a<br/>b"), "a<br>b");
    assert_eq!(round_trip("a<br></br>b"), "a<br>b");
    assert_eq!(round_trip(r#"<img src="x.png">"#), r#"<img src="x.png">"#);
}

#[test]
fn test_void_tags_inside_text_only_elements_stay_text() {
    assert_eq!(
        round_trip("<textarea>{{x}} <br></textarea>"),
        "<textarea>{{x}} &lt;br&gt;</textarea>"
    );
    assert_eq!(
        round_trip("<script>var s = '<br>';</script><br>"),
        "<script>var s = '<br>';</script><br>"
    );
}

#[test]
fn test_malformed_tag_is_left_alone() {
    let transcoder = transcoder();
    let markup = r##"<svg xlink:href="#a" [class]="c"></svg>"##;
    assert_eq!(transcoder.encode(markup), markup);
}

#[test]
fn test_tag_without_binding_is_untouched() {
    let transcoder = transcoder();
    let markup = r#"<p title="[not] a binding" data-x=[y]>x</p>"#;
    assert_eq!(transcoder.encode(markup), markup);
}

#[test]
fn test_self_closing_slash_and_whitespace_are_kept() {
    let transcoder = transcoder();
    let prefix = transcoder.registry().binding_prefix().to_string();
    let encoded = transcoder.encode("<amp-state [src]='s' />");
    assert_eq!(encoded, format!("<amp-state {prefix}src='s' />"));
    assert_eq!(transcoder.decode(&encoded), "<amp-state [src]='s' />");
}

#[test]
fn test_rewritten_attribute_keeps_its_leading_whitespace() {
    let transcoder = transcoder();
    let prefix = transcoder.registry().binding_prefix().to_string();
    assert_eq!(
        transcoder.encode("<p\n\t[text]=x>"),
        format!("<p\n\t{prefix}text=x>")
    );
}

#[test]
fn test_registries_do_not_decode_each_other() {
    let a = Transcoder::new(PlaceholderRegistry::with_salt("a"));
    let b = Transcoder::new(PlaceholderRegistry::with_salt("b"));
    let encoded = a.encode(r#"<p [text]="x">{{y}}</p>"#);
    assert_eq!(b.decode(&encoded), encoded);
}

#[test]
fn test_concurrent_documents_use_their_own_registry() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let markup = format!(r#"<div [text]="v{i}">{{{{n{i}}}}}</div>"#);
                let doc = Document::from_fragment(&markup).map_err(|e| e.to_string())?;
                Ok::<_, String>((markup, doc.body_content()))
            })
        })
        .collect();
    for handle in handles {
        match handle.join() {
            Ok(Ok((markup, output))) => assert_eq!(output, markup),
            Ok(Err(e)) => panic!("parse failed: {e}"),
            Err(_) => panic!("thread panicked"),
        }
    }
}

/// Markup built from pieces the parser serializes back verbatim.
#[derive(Debug, Clone)]
struct Markup(String);

const TAGS: &[&str] = &["div", "span", "section", "amp-list"];
const ATTRIBUTES: &[&str] = &["class", "[class]", "id", "[text]", "data-x", "[hidden]", "on"];
const VALUES: &[&str] = &["a", "b c", "{{x}}", "{{{y}}}", "'q' + r", "1 - 2", ""];
const TEXT: &[&str] = &["a", "Hello", " ", "{{", "}}", "{{{", "}}}", "{{#", "{{^", "{{/", "-"];

fn pick<'a>(g: &mut Gen, from: &[&'a str]) -> &'a str {
    g.choose(from).copied().unwrap_or_default()
}

fn attributes(g: &mut Gen) -> String {
    let mut out = String::new();
    for name in ATTRIBUTES {
        match u8::arbitrary(g) % 3 {
            0 => {}
            1 => out.push_str(&format!(" {name}")),
            _ => out.push_str(&format!(" {name}=\"{}\"", pick(g, VALUES))),
        }
    }
    out
}

impl Arbitrary for Markup {
    fn arbitrary(g: &mut Gen) -> Self {
        let count = usize::arbitrary(g) % 5;
        let mut out = String::new();
        for _ in 0..count {
            if u8::arbitrary(g) % 4 == 0 {
                out.push_str(&format!("<img{}>", attributes(g)));
                continue;
            }
            let tag = pick(g, TAGS);
            let attrs = attributes(g);
            let text: String = (0..usize::arbitrary(g) % 4).map(|_| pick(g, TEXT)).collect();
            out.push_str(&format!("<{tag}{attrs}>{text}</{tag}>"));
        }
        Self(out)
    }
}

#[quickcheck]
fn fragments_round_trip(markup: Markup) -> bool {
    round_trip(&markup.0) == markup.0
}

#[quickcheck]
fn void_normalization_is_idempotent(input: String) -> bool {
    let once = close_void_elements(&input);
    close_void_elements(&once) == once
}

#[quickcheck]
fn triple_braces_are_replaced_whole(inner: String) -> bool {
    let inner: String = inner.chars().filter(|c| !matches!(c, '{' | '}')).collect();
    let encoded = transcoder().encode(&format!("{{{{{{{inner}}}}}}}"));
    !encoded.contains('{') && !encoded.contains('}')
}

#[quickcheck]
fn encode_never_leaks_placeholders_for_plain_text(text: String) -> bool {
    let transcoder = transcoder();
    let text: String = text
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '<' | '_'))
        .collect();
    !transcoder.encode(&text).contains(TEMPLATE_PLACEHOLDER_PREFIX)
        && transcoder.decode(&transcoder.encode(&text)) == text
}
