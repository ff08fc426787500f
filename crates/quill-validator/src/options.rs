//! Validation settings.

use crate::model::Format;

/// Default budget for stylesheet bytes across the document.
pub const DEFAULT_MAX_DOCUMENT_CSS_BYTES: usize = 75_000;

/// Settings for one validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Only apply specs for this format. With `None` every spec applies and
    /// mandatory tags are not enforced.
    pub format: Option<Format>,
    /// Accept global attributes (`class`, `data-*`, `aria-*` and the rest) on
    /// every element.
    pub allow_global_attributes: bool,
    /// Check extension loader scripts against the extensions in use.
    pub check_extensions: bool,
    /// Budget for `doc_css_bytes` content across the document.
    pub max_document_css_bytes: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            format: None,
            allow_global_attributes: true,
            check_extensions: true,
            max_document_css_bytes: DEFAULT_MAX_DOCUMENT_CSS_BYTES,
        }
    }
}

impl ValidationOptions {
    /// Restrict validation to one format.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Only accept attributes the matched spec declares.
    #[must_use]
    pub const fn with_strict_attributes(mut self) -> Self {
        self.allow_global_attributes = false;
        self
    }

    /// Skip the extension loader checks.
    #[must_use]
    pub const fn without_extension_checks(mut self) -> Self {
        self.check_extensions = false;
        self
    }

    /// Set the document-wide stylesheet budget.
    #[must_use]
    pub const fn with_max_document_css_bytes(mut self, bytes: usize) -> Self {
        self.max_document_css_bytes = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ValidationOptions::default();
        assert_eq!(options.format, None);
        assert!(options.allow_global_attributes);
        assert!(options.check_extensions);
        assert_eq!(options.max_document_css_bytes, 75_000);
    }

    #[test]
    fn test_builders_chain() {
        let options = ValidationOptions::default()
            .with_format(Format::Amp4email)
            .with_strict_attributes()
            .without_extension_checks()
            .with_max_document_css_bytes(10);
        assert_eq!(options.format, Some(Format::Amp4email));
        assert!(!options.allow_global_attributes);
        assert!(!options.check_extensions);
        assert_eq!(options.max_document_css_bytes, 10);
    }
}
