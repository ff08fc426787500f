//! Quote-aware start tag scanner over raw markup.
//!
//! Both the binding attribute rewrite and void element normalization need to
//! find start tags in text that has not been parsed yet. A start tag here is
//! `<`, an ASCII letter, more name characters, then whitespace, `/` or `>`,
//! and runs to the first `>` that is not inside a quoted attribute value.
//!
//! The content of `title`, `textarea`, `script`, `style` and the other
//! elements the tokenizer reads as plain text is skipped up to the matching
//! end tag: a `<br>` in there is text, not a tag.

use core::ops::Range;

use quill_common::elements::is_text_only_element;

/// A start tag located in the source text. All offsets are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StartTag {
    /// Offset of the `<`.
    pub start: usize,
    /// Span of the tag name.
    pub name: Range<usize>,
    /// Everything between the name and the closing `>`.
    pub attributes: Range<usize>,
    /// Offset just past the closing `>`.
    pub end: usize,
}

/// `[A-Za-z0-9_-]`, the characters accepted in tag and attribute names.
pub(crate) const fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

/// ASCII whitespace as the HTML tokenizer sees it.
pub(crate) const fn is_space_byte(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\x0C' | b'\r')
}

/// Iterator over the start tags of `markup`, in source order.
pub(crate) struct StartTags<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> StartTags<'a> {
    pub(crate) const fn new(markup: &'a str) -> Self {
        Self {
            bytes: markup.as_bytes(),
            pos: 0,
        }
    }

    /// Try to read a start tag whose `<` is at `start`.
    fn tag_at(&self, start: usize) -> Option<StartTag> {
        let bytes = self.bytes;
        let name_start = start + 1;
        if !bytes.get(name_start)?.is_ascii_alphabetic() {
            return None;
        }
        let mut name_end = name_start;
        while bytes.get(name_end).copied().is_some_and(is_name_byte) {
            name_end += 1;
        }
        let next = *bytes.get(name_end)?;
        if !(is_space_byte(next) || next == b'/' || next == b'>') {
            return None;
        }

        let close = find_tag_close(bytes, name_end)?;
        Some(StartTag {
            start,
            name: name_start..name_end,
            attributes: name_end..close,
            end: close + 1,
        })
    }
}

impl Iterator for StartTags<'_> {
    type Item = StartTag;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.bytes.len() {
            let offset = self.bytes[self.pos..].iter().position(|&b| b == b'<')?;
            let start = self.pos + offset;
            if let Some(tag) = self.tag_at(start) {
                self.pos = tag.end;
                let name = &self.bytes[tag.name.clone()];
                if core::str::from_utf8(name).is_ok_and(is_text_only_element) {
                    self.pos = text_content_end(self.bytes, tag.end, name);
                }
                return Some(tag);
            }
            self.pos = start + 1;
        }
        None
    }
}

/// Offset of the end tag closing a text-only element named `name`, searching
/// from `from`. Without one the content runs to the end of input.
fn text_content_end(bytes: &[u8], from: usize, name: &[u8]) -> usize {
    let mut pos = from;
    while let Some(offset) = bytes
        .get(pos..)
        .and_then(|rest| rest.windows(2).position(|w| w == b"</"))
    {
        let start = pos + offset;
        let name_end = start + 2 + name.len();
        let matches_name = bytes
            .get(start + 2..name_end)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name));
        let at_boundary = bytes
            .get(name_end)
            .is_none_or(|&b| is_space_byte(b) || b == b'/' || b == b'>');
        if matches_name && at_boundary {
            return start;
        }
        pos = start + 2;
    }
    bytes.len()
}

/// Offset of the `>` closing a tag whose attribute span starts at `from`.
///
/// A quote only opens a value when it follows `=` (whitespace allowed in
/// between); elsewhere it is an ordinary character, as in the tokenizer's
/// attribute name state. An unterminated quote means there is no tag.
fn find_tag_close(bytes: &[u8], from: usize) -> Option<usize> {
    let mut after_equals = false;
    let mut pos = from;
    while let Some(&byte) = bytes.get(pos) {
        match byte {
            b'>' => return Some(pos),
            b'=' => after_equals = true,
            b'"' | b'\'' if after_equals => {
                let close = bytes[pos + 1..].iter().position(|&b| b == byte)?;
                pos += close + 1;
                after_equals = false;
            }
            b if is_space_byte(b) => {}
            _ => after_equals = false,
        }
        pos += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_texts(markup: &str) -> Vec<&str> {
        StartTags::new(markup)
            .map(|tag| &markup[tag.start..tag.end])
            .collect()
    }

    #[test]
    fn test_finds_start_tags_only() {
        assert_eq!(
            tag_texts("<p>a</p><!-- x --><br/><img src=x>"),
            vec!["<p>", "<br/>", "<img src=x>"]
        );
    }

    #[test]
    fn test_gt_inside_quotes_does_not_close() {
        assert_eq!(
            tag_texts(r#"<a title="a > b" href='>'>x"#),
            vec![r#"<a title="a > b" href='>'>"#]
        );
    }

    #[test]
    fn test_quote_outside_value_is_plain() {
        assert_eq!(tag_texts("<p don't>x</p>"), vec!["<p don't>"]);
    }

    #[test]
    fn test_unterminated_quote_skips_tag() {
        assert_eq!(tag_texts(r#"<a title="x <b>"#), vec!["<b>"]);
    }

    #[test]
    fn test_text_only_content_is_skipped() {
        assert_eq!(
            tag_texts("<textarea><br></textarea><br><TITLE>a<b></titles></Title ><hr>"),
            vec!["<textarea>", "<br>", "<TITLE>", "<hr>"]
        );
        assert_eq!(
            tag_texts("<script>if (a<b) x = '<br>';</script><p>"),
            vec!["<script>", "<p>"]
        );
        assert_eq!(tag_texts("<style>a<b>"), vec!["<style>"]);
    }

    #[test]
    fn test_name_must_end_at_boundary() {
        assert!(tag_texts("<a:b> <1> < p>").is_empty());
        let markup = "<br\n>";
        let tags: Vec<StartTag> = StartTags::new(markup).collect();
        assert_eq!(&markup[tags[0].name.clone()], "br");
        assert_eq!(&markup[tags[0].attributes.clone()], "\n");
    }
}
