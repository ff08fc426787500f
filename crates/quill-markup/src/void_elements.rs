//! Void element normalization.
//!
//! Source markup writes void elements as `<br>`, `<br/>` or `<br></br>`.
//! Before parsing, every void start tag not already followed by its end tag
//! gets one, so the parser always sees the same shape. After serialization
//! the redundant end tags are stripped again.

use std::sync::LazyLock;

use quill_common::elements::{VOID_ELEMENTS, is_void_element};
use regex::Regex;

use crate::scan::StartTags;

/// `</br>`, `</IMG>` and friends.
static VOID_END_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i)</(?:{})>", VOID_ELEMENTS.join("|"))).expect("valid regex")
});

/// Append `</name>` to every void start tag lacking one.
///
/// Applying this twice gives the same result as applying it once.
#[must_use]
pub fn close_void_elements(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut copied = 0;
    let mut closed = 0usize;

    for tag in StartTags::new(markup) {
        let name = &markup[tag.name.clone()];
        if !is_void_element(name) || is_followed_by_end_tag(&markup[tag.end..], name) {
            continue;
        }
        out.push_str(&markup[copied..tag.end]);
        out.push_str("</");
        out.push_str(name);
        out.push('>');
        copied = tag.end;
        closed += 1;
    }

    if closed == 0 {
        return markup.to_string();
    }
    out.push_str(&markup[copied..]);
    tracing::debug!(closed, "void elements closed");
    out
}

/// True if `rest` starts with `</name>` (ASCII case-insensitive).
fn is_followed_by_end_tag(rest: &str, name: &str) -> bool {
    let Some(after_slash) = rest.strip_prefix("</") else {
        return false;
    };
    after_slash
        .get(..name.len())
        .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
        && after_slash[name.len()..].starts_with('>')
}

/// Remove end tags of void elements, which the serializer never needs.
#[must_use]
pub fn strip_void_end_tags(markup: &str) -> String {
    VOID_END_TAG.replace_all(markup, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closes_each_form() {
        assert_eq!(close_void_elements("a<br>b"), "a<br></br>b");
        assert_eq!(close_void_elements("<br/>"), "<br/></br>");
        assert_eq!(close_void_elements("<BR>"), "<BR></BR>");
        assert_eq!(
            close_void_elements(r#"<img src="a>b.png" alt=x>"#),
            r#"<img src="a>b.png" alt=x></img>"#
        );
    }

    #[test]
    fn test_existing_end_tag_is_kept() {
        assert_eq!(close_void_elements("<br></br>"), "<br></br>");
        assert_eq!(close_void_elements("<hr></HR>"), "<hr></HR>");
    }

    #[test]
    fn test_text_only_content_is_left_alone() {
        assert_eq!(
            close_void_elements("<textarea>a <br></textarea><br>"),
            "<textarea>a <br></textarea><br></br>"
        );
        assert_eq!(
            close_void_elements("<title><img></title><script>'<hr>'</script>"),
            "<title><img></title><script>'<hr>'</script>"
        );
    }

    #[test]
    fn test_name_boundary() {
        assert_eq!(close_void_elements("<bread>"), "<bread>");
        assert_eq!(close_void_elements("<basefont>"), "<basefont></basefont>");
        assert_eq!(close_void_elements("<br-x>"), "<br-x>");
    }

    #[test]
    fn test_strip_is_case_insensitive() {
        assert_eq!(strip_void_end_tags("<br></BR><p></p></img>"), "<br><p></p>");
        assert_eq!(strip_void_end_tags("</bread>"), "</bread>");
    }
}
