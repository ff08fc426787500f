//! CSS Token types per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
//!
//! Numeric tokens keep only their value; the integer/number type flag is not
//! needed by anything that consumes this stream.

use core::fmt;

/// [§ 4.2 Definitions](https://www.w3.org/TR/css-syntax-3/#token-diagrams)
///
/// CSS tokens as defined by the CSS Syntax Module Level 3 specification.
#[derive(Debug, Clone, PartialEq)]
pub enum CSSToken {
    /// "`<ident-token>`"
    Ident(String),
    /// "`<function-token>`", the name without the opening parenthesis.
    Function(String),
    /// "`<at-keyword-token>`", the name without the `@`.
    AtKeyword(String),
    /// "`<hash-token>`", the value without the `#`.
    Hash(String),
    /// "`<string-token>`"
    String(String),
    /// "`<bad-string-token>`" "represents a parsing error"
    BadString,
    /// "`<url-token>`"
    Url(String),
    /// "`<bad-url-token>`" "represents a parsing error"
    BadUrl,
    /// "`<delim-token>`"
    Delim(char),
    /// "`<number-token>`"
    Number(f64),
    /// "`<percentage-token>`"
    Percentage(f64),
    /// "`<dimension-token>`"
    Dimension {
        /// "a numeric value"
        value: f64,
        /// "a unit"
        unit: String,
    },
    /// "`<whitespace-token>`"
    Whitespace,
    /// "`<CDO-token>`" (`<!--`)
    CDO,
    /// "`<CDC-token>`" (`-->`)
    CDC,
    /// "`<colon-token>`"
    Colon,
    /// "`<semicolon-token>`"
    Semicolon,
    /// "`<comma-token>`"
    Comma,
    /// `<[-token>`
    LeftBracket,
    /// `<]-token>`
    RightBracket,
    /// `<(-token>`
    LeftParen,
    /// `<)-token>`
    RightParen,
    /// `<{-token>`
    LeftBrace,
    /// `<}-token>`
    RightBrace,
    /// End of file - signals end of input
    EOF,
}

impl CSSToken {
    /// Returns true if this is the EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::EOF)
    }
}

impl fmt::Display for CSSToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(s) => write!(f, "{s}"),
            Self::Function(s) => write!(f, "{s}("),
            Self::AtKeyword(s) => write!(f, "@{s}"),
            Self::Hash(s) => write!(f, "#{s}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::BadString => write!(f, "<bad-string>"),
            Self::Url(s) => write!(f, "url({s})"),
            Self::BadUrl => write!(f, "<bad-url>"),
            Self::Delim(c) => write!(f, "{c}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Percentage(v) => write!(f, "{v}%"),
            Self::Dimension { value, unit } => write!(f, "{value}{unit}"),
            Self::Whitespace => write!(f, " "),
            Self::CDO => write!(f, "<!--"),
            Self::CDC => write!(f, "-->"),
            Self::Colon => write!(f, ":"),
            Self::Semicolon => write!(f, ";"),
            Self::Comma => write!(f, ","),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::EOF => write!(f, "<EOF>"),
        }
    }
}
