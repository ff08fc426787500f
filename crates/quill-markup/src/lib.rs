//! Reversible markup transcoding for Quill.
//!
//! Source markup may use syntax the HTML tokenizer cannot carry through a
//! parse/serialize round trip:
//!
//! - **Binding attributes** such as `[text]="expr"`, whose brackets are not
//!   valid in attribute names
//! - **Template delimiters** (`{{`, `{{{`, `{{#` and the rest), which must
//!   survive attribute values and raw text untouched
//! - **Void elements** written as `<br>`, `<br/>` or `<br></br>`
//!
//! A [`Transcoder`] rewrites these into parser-safe text before parsing and
//! restores them afterwards. [`Document`] wraps the parsed tree together with
//! its transcoder so serialized output is always decoded with the same
//! registry that encoded it.
//!
//! ```
//! use quill_markup::{Document, PlaceholderRegistry};
//!
//! let doc = Document::from_fragment_with_registry(
//!     r#"<div [text]="foo"></div>"#,
//!     "utf-8",
//!     PlaceholderRegistry::with_salt("example"),
//! )
//! .unwrap();
//! assert_eq!(doc.body_content(), r#"<div [text]="foo"></div>"#);
//! ```

mod binding;
mod document;
mod error;
mod placeholder;
mod scan;
mod transcoder;
mod void_elements;

pub use binding::{decode_binding_attributes, encode_binding_attributes};
pub use document::{DEFAULT_CHARSET, Document};
pub use error::ParseError;
pub use placeholder::{
    BINDING_PREFIX_START, PlaceholderRegistry, TEMPLATE_PLACEHOLDER_PREFIX, TEMPLATE_TOKENS,
};
pub use transcoder::Transcoder;
pub use void_elements::{close_void_elements, strip_void_end_tags};
