//! Encode markup for the HTML parser and decode serialized output.

use crate::binding::{decode_binding_attributes, encode_binding_attributes};
use crate::placeholder::PlaceholderRegistry;
use crate::void_elements::{close_void_elements, strip_void_end_tags};

/// Reversible rewrite of binding attributes, template delimiters and void
/// elements.
///
/// A transcoder owns its [`PlaceholderRegistry`]; [`decode`](Self::decode)
/// only undoes what [`encode`](Self::encode) on the same transcoder did.
///
/// ```
/// use quill_markup::{PlaceholderRegistry, Transcoder};
///
/// let transcoder = Transcoder::new(PlaceholderRegistry::with_salt("doc"));
/// let encoded = transcoder.encode(r#"<p [text]="x">{{y}}</p>"#);
/// assert!(!encoded.contains('[') && !encoded.contains("{{"));
/// assert_eq!(transcoder.decode(&encoded), r#"<p [text]="x">{{y}}</p>"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Transcoder {
    registry: PlaceholderRegistry,
}

impl Transcoder {
    /// Transcoder using `registry` for both directions.
    #[must_use]
    pub const fn new(registry: PlaceholderRegistry) -> Self {
        Self { registry }
    }

    /// The registry holding this transcoder's salted substitutes.
    #[must_use]
    pub const fn registry(&self) -> &PlaceholderRegistry {
        &self.registry
    }

    /// Rewrite `markup` into something the HTML parser carries through
    /// unchanged: binding attributes first, then template delimiters, then
    /// void element end tags. Never fails; a tag that cannot be rewritten is
    /// passed on as written.
    #[must_use]
    pub fn encode(&self, markup: &str) -> String {
        let markup = encode_binding_attributes(markup, &self.registry);
        let markup = self.registry.substitute_templates(&markup);
        let markup = close_void_elements(&markup);
        tracing::debug!(bytes = markup.len(), "markup encoded");
        markup
    }

    /// Undo [`encode`](Self::encode) on serialized output: template
    /// delimiters, then binding attributes, then redundant void end tags.
    #[must_use]
    pub fn decode(&self, markup: &str) -> String {
        let markup = self.registry.restore_templates(markup);
        let markup = decode_binding_attributes(&markup, &self.registry);
        strip_void_end_tags(&markup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcoder() -> Transcoder {
        Transcoder::new(PlaceholderRegistry::with_salt("test"))
    }

    #[test]
    fn test_encode_order() {
        let transcoder = transcoder();
        let prefix = transcoder.registry().binding_prefix().to_string();
        let encoded = transcoder.encode(r#"<input [value]="{{v}}">"#);
        assert!(encoded.starts_with(&format!("<input {prefix}value=\"")));
        assert!(encoded.ends_with("\"></input>"));
        assert!(!encoded.contains("{{"));
    }

    #[test]
    fn test_binding_value_with_template_round_trips() {
        let transcoder = transcoder();
        let markup = r#"<a [href]="'/x/' + {{id}}" class="c">"#;
        let encoded = transcoder.encode(markup);
        assert!(!encoded.contains("[href]"));
        assert_eq!(transcoder.decode(&encoded), markup);
    }
}
