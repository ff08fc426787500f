//! [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
//!
//! Character references are resolved by lookahead on the unconsumed input
//! instead of through the dedicated sub-states.

use super::machine::HTMLTokenizer;

/// Named references recognized by the tokenizer, with whether they may appear
/// without a trailing semicolon (the legacy set).
///
/// [§ 13.5 Named character references](https://html.spec.whatwg.org/multipage/named-characters.html)
const NAMED_CHARACTER_REFERENCES: &[(&str, &str, bool)] = &[
    ("amp", "&", true),
    ("lt", "<", true),
    ("gt", ">", true),
    ("quot", "\"", true),
    ("apos", "'", false),
    ("nbsp", "\u{00A0}", true),
    ("copy", "\u{00A9}", true),
    ("reg", "\u{00AE}", true),
    ("deg", "\u{00B0}", true),
    ("middot", "\u{00B7}", true),
    ("laquo", "\u{00AB}", true),
    ("raquo", "\u{00BB}", true),
    ("times", "\u{00D7}", true),
    ("ndash", "\u{2013}", false),
    ("mdash", "\u{2014}", false),
    ("lsquo", "\u{2018}", false),
    ("rsquo", "\u{2019}", false),
    ("ldquo", "\u{201C}", false),
    ("rdquo", "\u{201D}", false),
    ("bull", "\u{2022}", false),
    ("hellip", "\u{2026}", false),
    ("euro", "\u{20AC}", false),
    ("trade", "\u{2122}", false),
];

fn lookup_named(name: &str) -> Option<(&'static str, bool)> {
    NAMED_CHARACTER_REFERENCES
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, value, legacy)| (*value, *legacy))
}

/// [§ 13.2.5.80 Numeric character reference end state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
///
/// "If the number is 0x00 ... If the number is greater than 0x10FFFF ...
/// If the number is a surrogate ... set the character reference code to
/// 0xFFFD."
fn numeric_reference_char(code: u32) -> char {
    if code == 0 {
        return '\u{FFFD}';
    }
    char::from_u32(code).unwrap_or('\u{FFFD}')
}

impl HTMLTokenizer {
    /// Try to consume a character reference following a `&` that was just
    /// consumed.
    ///
    /// Returns the decoded text, or `None` when the `&` does not start a
    /// reference; the caller then emits the `&` literally and nothing beyond
    /// it has been consumed.
    ///
    /// [§ 13.2.5.73 Named character reference state](https://html.spec.whatwg.org/multipage/parsing.html#named-character-reference-state):
    /// "If the character reference was consumed as part of an attribute, and
    /// the last character matched is not a U+003B SEMICOLON character (;), and
    /// the next input character is either a U+003D EQUALS SIGN character (=)
    /// or an ASCII alphanumeric, then, for historical reasons, flush code
    /// points consumed as a character reference and switch to the return state."
    pub(super) fn consume_character_reference(&mut self, in_attribute: bool) -> Option<String> {
        let rest = self.remaining_input();

        if let Some(after_hash) = rest.strip_prefix('#') {
            let hex = after_hash.starts_with(['x', 'X']);
            let prefix_len = if hex { 2 } else { 1 };
            let body = &rest[prefix_len..];
            let digits_len = body
                .bytes()
                .take_while(|b| {
                    if hex {
                        b.is_ascii_hexdigit()
                    } else {
                        b.is_ascii_digit()
                    }
                })
                .count();
            if digits_len == 0 {
                self.log_parse_error("absence-of-digits-in-numeric-character-reference");
                return None;
            }
            let terminated = body[digits_len..].starts_with(';');
            let code = u32::from_str_radix(&body[..digits_len], if hex { 16 } else { 10 })
                .unwrap_or(u32::MAX);
            if !terminated {
                self.log_parse_error("missing-semicolon-after-character-reference");
            }
            self.current_pos += prefix_len + digits_len + usize::from(terminated);
            return Some(numeric_reference_char(code).to_string());
        }

        let name_len = rest.bytes().take_while(u8::is_ascii_alphanumeric).count();
        for len in (1..=name_len).rev() {
            let Some((value, legacy)) = lookup_named(&rest[..len]) else {
                continue;
            };
            let after = &rest[len..];
            let terminated = after.starts_with(';');
            if !terminated {
                if !legacy {
                    continue;
                }
                let next = after.chars().next();
                if in_attribute && next.is_some_and(|c| c == '=' || c.is_ascii_alphanumeric()) {
                    return None;
                }
                self.log_parse_error("missing-semicolon-after-character-reference");
            }
            self.current_pos += len + usize::from(terminated);
            return Some(value.to_string());
        }
        None
    }
}
