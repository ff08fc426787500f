//! HTML tokenizer and parser for Quill.
//!
//! # Scope
//!
//! This crate implements:
//! - **HTML Tokenizer** ([WHATWG § 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization))
//!   - Data, RCDATA and RAWTEXT states (script data is tokenized as RAWTEXT)
//!   - Tag, attribute, comment and DOCTYPE states
//!   - Numeric and common named character references
//!
//! - **Tree Builder** ([WHATWG § 13.2.6](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction))
//!   - Insertion modes: Initial, BeforeHtml, BeforeHead, InHead, AfterHead, InBody, Text, AfterBody, AfterAfterBody
//!   - Implied `html`/`head`/`body`, implicit paragraph and list item closing
//!   - Self-closing elements inside `svg` and `math`
//!
//! # Deliberate deviations
//!
//! - End tags of void elements (`</br>`, `</img>`) are ignored instead of being
//!   turned into start tags, so markup normalized to `<br></br>` parses to a
//!   single element.
//! - No table insertion modes, foster parenting or adoption agency: table and
//!   formatting elements nest as written.

/// HTML parser and tree construction.
pub mod parser;
/// HTML tokenizer for converting input into tokens.
pub mod tokenizer;

pub use parser::{HTMLParser, InsertionMode, ParseIssue};
pub use tokenizer::{Attribute, HTMLTokenizer, Token};

use quill_dom::DomTree;

/// Tokenize and tree-build `html` in one call.
#[must_use]
pub fn parse_document(html: &str) -> (DomTree, Vec<ParseIssue>) {
    let mut tokenizer = HTMLTokenizer::new(html.to_string());
    tokenizer.run();
    HTMLParser::new(tokenizer.into_tokens()).run_with_issues()
}
