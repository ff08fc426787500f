//! CSS tokenizer and at-rule scanner for Quill.
//!
//! The validator only needs to know which at-rules a stylesheet uses and how
//! large it is, so this crate stops at tokenization: there is no rule parser,
//! cascade or selector matching.

/// Tokenizer per [CSS Syntax Module Level 3 § 4](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod tokenizer;

pub use tokenizer::{CSSToken, CSSTokenizer};

/// An at-rule keyword found in a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    /// The keyword as written, lowercased, without the `@` (`-webkit-keyframes`).
    pub name: String,
    /// The keyword with any vendor prefix removed (`keyframes`).
    pub unprefixed: String,
}

/// Tokenize `css` and return the at-rule keywords in source order.
///
/// Keywords inside comments, strings and `url()` tokens are not reported.
#[must_use]
pub fn at_rules(css: &str) -> Vec<AtRule> {
    let mut tokenizer = CSSTokenizer::new(css);
    tokenizer.run();
    tokenizer
        .into_tokens()
        .into_iter()
        .filter_map(|token| match token {
            CSSToken::AtKeyword(name) => {
                let name = name.to_ascii_lowercase();
                let unprefixed = strip_vendor_prefix(&name).to_string();
                Some(AtRule { name, unprefixed })
            }
            _ => None,
        })
        .collect()
}

/// Remove a `-vendor-` prefix: `-webkit-keyframes` becomes `keyframes`.
///
/// Names that do not start with `-`, or have no second `-`, are returned as is.
#[must_use]
pub fn strip_vendor_prefix(name: &str) -> &str {
    name.strip_prefix('-')
        .and_then(|rest| rest.split_once('-'))
        .map_or(name, |(_, unprefixed)| unprefixed)
}
