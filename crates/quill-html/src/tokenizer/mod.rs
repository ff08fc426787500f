//! HTML tokenizer module.
//!
//! Implements the subset of [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//! that the markup pipeline relies on.

/// Character reference decoding per § 13.2.5.72.
mod character_reference;
/// Helper methods for tokenizer state transitions.
mod helpers;
/// HTML tokenizer state machine implementation.
mod machine;
/// Token types produced by the tokenizer.
pub mod token;

pub use machine::{HTMLTokenizer, TokenizerState};
pub use token::{Attribute, Token};
