//! URL classification utilities.
//!
//! [URL Standard](https://url.spec.whatwg.org/)
//!
//! Attribute rules only need to know three things about a URL value: whether
//! it is empty, whether it is relative, and which scheme an absolute URL uses.

use url::{ParseError, Url};

/// The shape of an attribute value interpreted as a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlKind {
    /// The value is empty after trimming ASCII whitespace.
    Empty,
    /// [URL Standard § 4.3](https://url.spec.whatwg.org/#url-parsing)
    ///
    /// "A relative-URL string" - includes path-absolute and scheme-relative
    /// (`//host/path`) references.
    Relative,
    /// "An absolute-URL string is a URL-scheme string, followed by U+003A (:),
    /// followed by a scheme-specific part." The scheme is lowercased.
    Absolute {
        /// Lowercase scheme without the trailing colon.
        scheme: String,
    },
    /// The value could not be parsed as an absolute or relative URL.
    Invalid(String),
}

/// Classify an attribute value as a URL.
///
/// Leading and trailing ASCII whitespace is stripped first, as browsers do
/// for URL-valued attributes.
#[must_use]
pub fn classify_url(value: &str) -> UrlKind {
    let trimmed = value.trim_matches(|c: char| c.is_ascii_whitespace());
    if trimmed.is_empty() {
        return UrlKind::Empty;
    }

    match Url::parse(trimmed) {
        Ok(url) => UrlKind::Absolute {
            scheme: url.scheme().to_ascii_lowercase(),
        },
        Err(ParseError::RelativeUrlWithoutBase) => UrlKind::Relative,
        Err(e) => UrlKind::Invalid(e.to_string()),
    }
}
