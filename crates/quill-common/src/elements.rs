//! Element name tables shared by the tokenizer, serializer, transcoder and
//! validator.

/// [§ 13.3 Serializing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)
///
/// "If current node is an area, base, basefont, bgsound, br, col, embed,
/// frame, hr, img, input, keygen, link, meta, param, source, track or wbr
/// element, then continue on to the next child node at this point."
///
/// These elements never carry an end tag in canonical output.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#elements-2)
///
/// "Raw text elements: script, style". The remaining entries are parsed with
/// the generic raw text algorithm by the tree builder.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script", "xmp", "iframe", "noembed", "noframes"];

/// "Escapable raw text elements: textarea, title"
pub const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

/// Attributes every element may carry regardless of its rule set.
///
/// `data-*` and `aria-*` are handled by [`is_global_attribute`] as prefixes.
pub const GLOBAL_ATTRIBUTES: &[&str] = &[
    "about",
    "accesskey",
    "class",
    "content",
    "datatype",
    "dir",
    "draggable",
    "hidden",
    "id",
    "inlist",
    "itemid",
    "itemprop",
    "itemref",
    "itemscope",
    "itemtype",
    "lang",
    "on",
    "prefix",
    "property",
    "rel",
    "resource",
    "rev",
    "role",
    "style",
    "tabindex",
    "title",
    "translate",
    "typeof",
    "vocab",
];

/// Returns true if `tag_name` is a void element (ASCII case-insensitive).
#[must_use]
pub fn is_void_element(tag_name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(tag_name))
}

/// Returns true if text inside `tag_name` is serialized without escaping.
#[must_use]
pub fn is_raw_text_element(tag_name: &str) -> bool {
    RAW_TEXT_ELEMENTS
        .iter()
        .any(|raw| raw.eq_ignore_ascii_case(tag_name))
        || tag_name.eq_ignore_ascii_case("plaintext")
}

/// Returns true if `tag_name` is an escapable raw text (RCDATA) element.
#[must_use]
pub fn is_escapable_raw_text_element(tag_name: &str) -> bool {
    ESCAPABLE_RAW_TEXT_ELEMENTS
        .iter()
        .any(|rcdata| rcdata.eq_ignore_ascii_case(tag_name))
}

/// Returns true if the tokenizer reads the content of `tag_name` as text
/// up to the matching end tag, never as markup.
#[must_use]
pub fn is_text_only_element(tag_name: &str) -> bool {
    is_raw_text_element(tag_name) || is_escapable_raw_text_element(tag_name)
}

/// Returns true if the attribute is allowed on every element.
#[must_use]
pub fn is_global_attribute(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("data-")
        || lower.starts_with("aria-")
        || GLOBAL_ATTRIBUTES.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_lookup_is_case_insensitive() {
        assert!(is_void_element("br"));
        assert!(is_void_element("IMG"));
        assert!(!is_void_element("div"));
        assert!(!is_void_element("bread"));
    }

    #[test]
    fn test_text_only_elements() {
        assert!(is_text_only_element("TEXTAREA"));
        assert!(is_text_only_element("title"));
        assert!(is_text_only_element("script"));
        assert!(!is_escapable_raw_text_element("style"));
        assert!(!is_text_only_element("template"));
    }

    #[test]
    fn test_global_attribute_prefixes() {
        assert!(is_global_attribute("data-foo"));
        assert!(is_global_attribute("ARIA-label"));
        assert!(is_global_attribute("class"));
        assert!(!is_global_attribute("src"));
    }
}
