//! Helper functions for the HTML tokenizer.
//!
//! [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//!
//! State transitions, input lookahead, token emission and the raw text end
//! tag helpers shared by the RCDATA and RAWTEXT states.

use quill_common::elements::{is_escapable_raw_text_element, is_raw_text_element};

use super::machine::{HTMLTokenizer, TokenizerState};
use super::token::Token;

// =============================================================================
// State Transition Helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Switch to the X state"
    ///
    /// The next character will be consumed on the next iteration of the main loop.
    pub(super) const fn switch_to(&mut self, new_state: TokenizerState) {
        self.state = new_state;
    }

    /// "Reconsume in the X state"
    ///
    /// The current character will be processed again in the new state.
    pub(super) const fn reconsume_in(&mut self, new_state: TokenizerState) {
        self.reconsume = true;
        self.state = new_state;
    }
}

// =============================================================================
// Input/Character Helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Consume the next input character"
    pub(super) fn consume(&mut self) -> Option<char> {
        let c = self.input[self.current_pos..].chars().next()?;
        self.current_pos += c.len_utf8();
        Some(c)
    }

    /// Unconsumed input, starting right after the current input character.
    pub(super) fn remaining_input(&self) -> &str {
        &self.input[self.current_pos..]
    }

    /// "If the next few characters are..."
    pub(super) fn next_few_characters_are(&self, target: &str) -> bool {
        self.remaining_input().starts_with(target)
    }

    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    ///
    /// "ASCII case-insensitive match for the word 'DOCTYPE'"
    pub(super) fn next_few_characters_are_case_insensitive(&self, target: &str) -> bool {
        self.remaining_input()
            .get(..target.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(target))
    }

    /// Consume the given ASCII string from the input. The caller has already
    /// checked that it is present.
    pub(super) const fn consume_string(&mut self, target: &str) {
        self.current_pos += target.len();
    }

    /// [§ 12.1.4 ASCII whitespace](https://infra.spec.whatwg.org/#ascii-whitespace)
    ///
    /// "U+0009 TAB, U+000A LF, U+000C FF, U+000D CR, or U+0020 SPACE."
    pub(super) const fn is_whitespace_char(input_char: char) -> bool {
        matches!(input_char, ' ' | '\t' | '\n' | '\x0C' | '\r')
    }
}

// =============================================================================
// Token Emission Helpers
// =============================================================================

impl HTMLTokenizer {
    /// "Emit the current token"
    ///
    /// The tree builder never drives the tokenizer directly, so the
    /// RCDATA/RAWTEXT switch the "in head" and "in body" modes would request
    /// happens here, keyed on the emitted start tag name.
    pub(super) fn emit_token(&mut self) {
        self.discard_duplicate_attribute();
        let Some(token) = self.current_token.take() else {
            return;
        };

        if let Token::StartTag { ref name, .. } = token {
            self.last_start_tag_name = Some(name.clone());
            match name.as_str() {
                // "Follow the generic RCDATA element parsing algorithm."
                tag if is_escapable_raw_text_element(tag) => {
                    self.text_state = TokenizerState::RCDATA;
                    self.switch_to(TokenizerState::RCDATA);
                }
                // "Follow the generic raw text element parsing algorithm."
                // Script data is treated as raw text; its escape states are
                // not needed to find the end tag in well-formed documents.
                tag if is_raw_text_element(tag) => {
                    self.text_state = TokenizerState::RAWTEXT;
                    self.switch_to(TokenizerState::RAWTEXT);
                }
                _ => {}
            }
        }
        self.token_stream.push(token);
    }

    /// "Emit the current input character as a character token."
    pub(super) fn emit_character_token(&mut self, c: char) {
        self.token_stream.push(Token::Character { data: c });
    }

    /// "Emit an end-of-file token."
    pub(super) fn emit_eof_token(&mut self) {
        self.token_stream.push(Token::EndOfFile);
        self.at_eof = true;
    }

    /// Emit the current comment or DOCTYPE token and then end of file.
    pub(super) fn emit_token_then_eof(&mut self) {
        self.emit_token();
        self.emit_eof_token();
    }
}

// =============================================================================
// RCDATA/RAWTEXT Helpers
// =============================================================================

impl HTMLTokenizer {
    /// [§ 13.2.5.11 RCDATA end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-end-tag-name-state)
    ///
    /// "An appropriate end tag token is an end tag token whose tag name matches
    /// the tag name of the last start tag to have been emitted from this
    /// tokenizer, if any."
    pub(super) fn is_appropriate_end_tag_token(&self) -> bool {
        match (&self.last_start_tag_name, &self.current_token) {
            (Some(last), Some(Token::EndTag { name })) => name == last,
            _ => false,
        }
    }

    /// "Anything else": "Emit a U+003C LESS-THAN SIGN character token, a U+002F
    /// SOLIDUS character token, and a character token for each of the characters
    /// in the temporary buffer (in the order they were added to the buffer).
    /// Reconsume in the RCDATA state." (Likewise for RAWTEXT.)
    pub(super) fn emit_raw_end_tag_name_anything_else(&mut self) {
        self.emit_character_token('<');
        self.emit_character_token('/');
        let buffer = std::mem::take(&mut self.temporary_buffer);
        for c in buffer.chars() {
            self.emit_character_token(c);
        }
        self.current_token = None;
        self.reconsume_in(self.text_state);
    }
}

// =============================================================================
// Attribute Helpers
// =============================================================================

impl HTMLTokenizer {
    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    ///
    /// "When the user agent leaves the attribute name state ... if there is
    /// already an attribute on the token with the exact same name, then this
    /// is a duplicate-attribute parse error and the new attribute must be
    /// removed from the token."
    ///
    /// Removal is deferred until the attribute's value has been read, so the
    /// value cannot leak into the earlier attribute of the same name.
    pub(super) fn check_duplicate_attribute(&mut self) {
        let is_duplicate = self
            .current_token
            .as_ref()
            .is_some_and(Token::current_attribute_name_is_duplicate);
        if is_duplicate {
            self.log_parse_error("duplicate-attribute");
            self.pending_duplicate = true;
        }
    }

    /// Drop the current attribute if it was flagged as a duplicate.
    pub(super) fn discard_duplicate_attribute(&mut self) {
        if std::mem::take(&mut self.pending_duplicate)
            && let Some(token) = self.current_token.as_mut()
        {
            token.remove_current_attribute();
        }
    }

    /// "Start a new attribute in the current tag token."
    pub(super) fn start_new_attribute(&mut self) {
        self.discard_duplicate_attribute();
        if let Some(token) = self.current_token.as_mut() {
            token.start_new_attribute();
        }
    }
}

// =============================================================================
// Error Handling
// =============================================================================

impl HTMLTokenizer {
    /// [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
    ///
    /// Parse errors are not fatal; the tokenizer recovers and continues.
    pub(super) fn log_parse_error(&self, code: &str) {
        tracing::trace!(position = self.current_pos, code, "html tokenizer parse error");
    }
}
