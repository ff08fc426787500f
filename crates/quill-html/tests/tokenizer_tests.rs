//! Integration tests for the HTML tokenizer.

use quill_html::{HTMLTokenizer, Token};

/// Helper to tokenize a string and return the tokens
fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = HTMLTokenizer::new(input.to_string());
    tokenizer.run();
    tokenizer.into_tokens()
}

/// Helper to collect the character tokens into a string
fn characters(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::Character { data } => Some(*data),
            _ => None,
        })
        .collect()
}

/// Helper to get `(name, value)` pairs of the first start tag
fn first_start_tag_attributes(tokens: &[Token]) -> Vec<(String, String)> {
    tokens
        .iter()
        .find_map(|t| match t {
            Token::StartTag { attributes, .. } => Some(
                attributes
                    .iter()
                    .map(|a| (a.name.clone(), a.value.clone()))
                    .collect(),
            ),
            _ => None,
        })
        .unwrap_or_default()
}

#[test]
fn test_plain_text() {
    let tokens = tokenize("Hello");
    assert_eq!(tokens.len(), 6); // 5 chars + EOF
    assert!(matches!(tokens[0], Token::Character { data: 'H' }));
    assert!(matches!(tokens[5], Token::EndOfFile));
}

#[test]
fn test_doctype() {
    let tokens = tokenize("<!DOCTYPE HTML>");
    assert_eq!(tokens.len(), 2);
    assert_eq!(
        tokens[0],
        Token::Doctype {
            name: Some("html".to_string())
        }
    );
}

#[test]
fn test_doctype_identifiers_are_skipped() {
    let tokens = tokenize(r#"<!doctype html PUBLIC "-//W3C//DTD HTML 4.01//EN">x"#);
    assert_eq!(
        tokens[0],
        Token::Doctype {
            name: Some("html".to_string())
        }
    );
    assert_eq!(characters(&tokens), "x");
}

#[test]
fn test_tag_and_attribute_names_are_lowercased() {
    let tokens = tokenize(r#"<DIV Class=A data-X='y' hidden>"#);
    match &tokens[0] {
        Token::StartTag {
            name, self_closing, ..
        } => {
            assert_eq!(name, "div");
            assert!(!self_closing);
        }
        other => panic!("expected start tag, got {other}"),
    }
    assert_eq!(
        first_start_tag_attributes(&tokens),
        vec![
            ("class".to_string(), "A".to_string()),
            ("data-x".to_string(), "y".to_string()),
            ("hidden".to_string(), String::new()),
        ]
    );
}

#[test]
fn test_bracketed_attribute_names_are_plain_characters() {
    let tokens = tokenize(r#"<p [text]="foo" [class]='bar'>"#);
    assert_eq!(
        first_start_tag_attributes(&tokens),
        vec![
            ("[text]".to_string(), "foo".to_string()),
            ("[class]".to_string(), "bar".to_string()),
        ]
    );
}

#[test]
fn test_duplicate_attributes_keep_the_first() {
    let tokens = tokenize(r#"<p id="a" ID="b">"#);
    assert_eq!(
        first_start_tag_attributes(&tokens),
        vec![("id".to_string(), "a".to_string())]
    );
}

#[test]
fn test_self_closing_flag() {
    let tokens = tokenize("<rect/>");
    assert!(matches!(
        &tokens[0],
        Token::StartTag { name, self_closing: true, .. } if name == "rect"
    ));
}

#[test]
fn test_comment() {
    let tokens = tokenize("<!-- a -- b -->");
    assert_eq!(
        tokens[0],
        Token::Comment {
            data: " a -- b ".to_string()
        }
    );
}

#[test]
fn test_bogus_comment() {
    let tokens = tokenize("<?xml version=\"1.0\"?>");
    assert_eq!(
        tokens[0],
        Token::Comment {
            data: "?xml version=\"1.0\"?".to_string()
        }
    );
}

#[test]
fn test_character_references_in_data() {
    let tokens = tokenize("&lt;b&gt; &#65;&#x42; &copy &unknown;");
    assert_eq!(characters(&tokens), "<b> AB \u{00A9} &unknown;");
}

#[test]
fn test_legacy_reference_in_attribute_followed_by_equals() {
    let tokens = tokenize(r#"<a href="?x=1&copy=2&amp;y">"#);
    assert_eq!(
        first_start_tag_attributes(&tokens),
        vec![("href".to_string(), "?x=1&copy=2&y".to_string())]
    );
}

#[test]
fn test_title_is_rcdata() {
    let tokens = tokenize("<title><b>&amp;</b></title>");
    assert_eq!(characters(&tokens), "<b>&</b>");
    assert!(tokens.contains(&Token::EndTag {
        name: "title".to_string()
    }));
}

#[test]
fn test_script_is_raw_text() {
    let tokens = tokenize("<script>if (a < b && c) {}</script>");
    assert_eq!(characters(&tokens), "if (a < b && c) {}");
}

#[test]
fn test_raw_text_ignores_other_end_tags() {
    let tokens = tokenize("<style>a</div>b</STYLE>");
    assert_eq!(characters(&tokens), "a</div>b");
    assert!(tokens.contains(&Token::EndTag {
        name: "style".to_string()
    }));
}
