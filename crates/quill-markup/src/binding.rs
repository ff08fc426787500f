//! Binding attribute rewrite.
//!
//! `[text]="foo"` is not a valid attribute name for the HTML tokenizer, so
//! every bracketed attribute in a start tag is renamed to
//! `<prefix>text="foo"` before parsing and renamed back afterwards.
//!
//! The attribute span of a tag is split by a small state machine into
//! `whitespace+ name (= value)?` runs. If the machine cannot consume the whole
//! span the tag is left exactly as written; a half-rewritten tag is never
//! emitted.

use core::ops::Range;

use strum_macros::Display;

use crate::placeholder::PlaceholderRegistry;
use crate::scan::{StartTags, is_name_byte, is_space_byte};

/// One attribute as written in the source, borrowed from the span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawAttribute<'a> {
    /// Whitespace preceding the name.
    pub leading: &'a str,
    /// Name including brackets, if any.
    pub name: &'a str,
    /// `=value` including the `=` and any quotes.
    pub value: Option<&'a str>,
}

impl RawAttribute<'_> {
    /// Name without brackets when the attribute is a binding attribute.
    pub(crate) fn binding_name(&self) -> Option<&str> {
        self.name
            .starts_with('[')
            .then(|| self.name.trim_matches(|c| c == '[' || c == ']'))
    }
}

/// States of the attribute span scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
enum SpanState {
    /// Expecting at least one whitespace character before a name.
    BeforeAttribute,
    /// Optional `[`, name characters, optional `]`.
    AttributeName,
    /// A name has ended; `=` starts a value, anything else a new attribute.
    AfterAttributeName,
    /// Right after `=`.
    BeforeAttributeValue,
    /// Inside `"`…`"` or `'`…`'`.
    AttributeValueQuoted(u8),
    /// A run of characters other than quotes and whitespace.
    AttributeValueUnquoted,
}

/// Split an attribute span into attributes.
///
/// Returns `None` if the span is malformed, i.e. the machine stops before the
/// end of the input.
pub(crate) fn split_attributes(span: &str) -> Option<Vec<RawAttribute<'_>>> {
    let bytes = span.as_bytes();
    let mut attributes = Vec::new();
    let mut state = SpanState::BeforeAttribute;
    let mut leading_start = 0;
    let mut name: Range<usize> = 0..0;
    let mut value_start = 0;
    let mut pos = 0;

    let mut finish = |leading: Range<usize>, name: Range<usize>, value: Option<Range<usize>>| {
        attributes.push(RawAttribute {
            leading: &span[leading],
            name: &span[name],
            value: value.map(|v| &span[v]),
        });
    };

    while pos < bytes.len() {
        let byte = bytes[pos];
        match state {
            SpanState::BeforeAttribute => {
                if is_space_byte(byte) {
                    pos += 1;
                    continue;
                }
                if pos == leading_start {
                    return None;
                }
                name = pos..pos;
                state = SpanState::AttributeName;
            }
            SpanState::AttributeName => {
                let mut end = pos;
                if bytes[end] == b'[' {
                    end += 1;
                }
                let chars_start = end;
                while end < bytes.len() && is_name_byte(bytes[end]) {
                    end += 1;
                }
                if end == chars_start {
                    return None;
                }
                if end < bytes.len() && bytes[end] == b']' {
                    end += 1;
                }
                name.end = end;
                pos = end;
                state = SpanState::AfterAttributeName;
            }
            SpanState::AfterAttributeName => {
                if byte == b'=' {
                    value_start = pos;
                    pos += 1;
                    state = SpanState::BeforeAttributeValue;
                } else {
                    finish(leading_start..name.start, name.clone(), None);
                    leading_start = pos;
                    state = SpanState::BeforeAttribute;
                }
            }
            SpanState::BeforeAttributeValue => match byte {
                b'"' | b'\'' => {
                    pos += 1;
                    state = SpanState::AttributeValueQuoted(byte);
                }
                b if is_space_byte(b) => return None,
                _ => state = SpanState::AttributeValueUnquoted,
            },
            SpanState::AttributeValueQuoted(quote) => {
                let close = bytes[pos..].iter().position(|&b| b == quote)?;
                pos += close + 1;
                finish(leading_start..name.start, name.clone(), Some(value_start..pos));
                leading_start = pos;
                state = SpanState::BeforeAttribute;
            }
            SpanState::AttributeValueUnquoted => {
                while pos < bytes.len()
                    && !matches!(bytes[pos], b'"' | b'\'')
                    && !is_space_byte(bytes[pos])
                {
                    pos += 1;
                }
                finish(leading_start..name.start, name.clone(), Some(value_start..pos));
                leading_start = pos;
                state = SpanState::BeforeAttribute;
            }
        }
    }

    match state {
        SpanState::AfterAttributeName => {
            finish(leading_start..name.start, name, None);
            Some(attributes)
        }
        SpanState::BeforeAttribute => Some(attributes),
        state => {
            tracing::trace!(%state, "attribute span ended inside an attribute");
            None
        }
    }
}

/// Rewrite every start tag in `markup` that carries a binding attribute.
#[must_use]
pub fn encode_binding_attributes(markup: &str, registry: &PlaceholderRegistry) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut copied = 0;
    let mut rewritten = 0usize;

    for tag in StartTags::new(markup) {
        let span = &markup[tag.attributes.clone()];
        if !span.contains('[') {
            continue;
        }
        let (body, suffix) = split_self_closing_suffix(span);
        let Some(attributes) = split_attributes(body) else {
            tracing::debug!(
                tag = &markup[tag.name.clone()],
                offset = tag.start,
                "malformed attribute span, tag left as written"
            );
            continue;
        };
        if !attributes.iter().any(|attr| attr.binding_name().is_some()) {
            continue;
        }

        out.push_str(&markup[copied..tag.attributes.start]);
        for attr in &attributes {
            out.push_str(attr.leading);
            match attr.binding_name() {
                Some(name) => out.push_str(&registry.encode_binding_name(name)),
                None => out.push_str(attr.name),
            }
            if let Some(value) = attr.value {
                out.push_str(value);
            }
        }
        out.push_str(suffix);
        copied = tag.attributes.end;
        rewritten += 1;
    }

    if rewritten == 0 {
        return markup.to_string();
    }
    out.push_str(&markup[copied..]);
    tracing::debug!(rewritten, "binding attributes encoded");
    out
}

/// Separate trailing whitespace and a self-closing `/` from the attributes.
fn split_self_closing_suffix(span: &str) -> (&str, &str) {
    let trim = |s: &str| {
        s.trim_end_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r'))
            .len()
    };
    let mut end = trim(span);
    if span[..end].ends_with('/') {
        end = trim(&span[..end - 1]);
    }
    span.split_at(end)
}

/// Put `[name]` back in place of every prefixed attribute name.
///
/// Only names preceded by whitespace are touched, which is where the
/// serializer puts attribute names.
#[must_use]
pub fn decode_binding_attributes(markup: &str, registry: &PlaceholderRegistry) -> String {
    let prefix = registry.binding_prefix();
    if !markup.contains(prefix) {
        return markup.to_string();
    }

    let bytes = markup.as_bytes();
    let mut out = String::with_capacity(markup.len());
    let mut copied = 0;
    for (index, _) in markup.match_indices(prefix) {
        if index == 0 || index < copied || !is_space_byte(bytes[index - 1]) {
            continue;
        }
        let name_start = index + prefix.len();
        let name_len = bytes[name_start..]
            .iter()
            .take_while(|&&b| is_name_byte(b))
            .count();
        if name_len == 0 {
            continue;
        }
        out.push_str(&markup[copied..index]);
        out.push('[');
        out.push_str(&markup[name_start..name_start + name_len]);
        out.push(']');
        copied = name_start + name_len;
    }
    out.push_str(&markup[copied..]);
    out
}
