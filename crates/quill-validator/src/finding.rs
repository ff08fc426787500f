//! Validation findings and the report that collects them.

use quill_dom::NodeId;
use serde::Serialize;
use strum_macros::Display;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// The document breaks a rule.
    Error,
    /// The document is valid but something is likely a mistake.
    Warning,
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    /// No spec exists for the element in the configured format.
    DisallowedTag,
    /// The parent is not the required one.
    WrongParentTag,
    /// No ancestor has the required tag name.
    MandatoryAncestorMissing,
    /// A unique spec matched more than once.
    DuplicateUniqueTag,
    /// A mandatory spec matched no element.
    MandatoryTagMissing,
    /// A mandatory attribute is absent.
    MandatoryAttributeMissing,
    /// The attribute is not allowed on this element.
    DisallowedAttribute,
    /// The value is not one of the allowed values.
    InvalidAttributeValue,
    /// The URL uses a scheme that is not allowed.
    DisallowedProtocol,
    /// The URL is empty.
    MissingUrl,
    /// The URL is relative.
    DisallowedRelativeUrl,
    /// The URL cannot be parsed.
    InvalidUrl,
    /// The character data is longer than allowed.
    CdataTooLong,
    /// The character data contains a disallowed pattern.
    DisallowedCdata,
    /// The character data does not match the required pattern.
    CdataMismatch,
    /// The stylesheet uses an at-rule that is not allowed.
    DisallowedAtRule,
    /// The `layout` value is not supported by the element.
    UnsupportedLayout,
    /// The `layout` value is not a layout at all.
    InvalidLayout,
    /// An element needs an extension whose loader script is absent.
    MissingExtension,
    /// An extension loader script appears more than once.
    DuplicateExtension,
    /// An extension is loaded but nothing uses it.
    UnusedExtension,
    /// Stylesheets across the document exceed the budget.
    DocumentCssTooLarge,
}

impl FindingCode {
    /// Severity this code is reported with.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::UnusedExtension => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// One rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFinding {
    /// Error or warning.
    pub severity: Severity,
    /// Machine-readable kind.
    pub code: FindingCode,
    /// Name of the spec the finding refers to; the tag name for
    /// [`FindingCode::DisallowedTag`].
    pub spec_name: String,
    /// The attribute involved, as written in the source (`[text]`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// The element involved; `None` for document-level findings.
    #[serde(skip)]
    pub node: Option<NodeId>,
    /// Element path such as `html > body > div:nth-child(2)`; empty for
    /// document-level findings.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationFinding {
    /// A finding with the severity of its code.
    pub fn new(code: FindingCode, spec_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: code.severity(),
            code,
            spec_name: spec_name.into(),
            attribute: None,
            node: None,
            path: String::new(),
            message: message.into(),
        }
    }

    /// Attach the attribute involved.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Attach the element involved and its path.
    #[must_use]
    pub fn at(mut self, node: NodeId, path: impl Into<String>) -> Self {
        self.node = Some(node);
        self.path = path.into();
        self
    }

    /// True for [`Severity::Error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// All findings for one document, in document order followed by
/// document-level findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Every finding, errors and warnings.
    pub findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    /// True if there are no errors. Warnings do not count.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.findings.iter().any(ValidationFinding::is_error)
    }

    /// Findings with [`Severity::Error`].
    pub fn errors(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    /// Findings with [`Severity::Warning`].
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }

    /// Findings with the given code.
    pub fn with_code(&self, code: FindingCode) -> impl Iterator<Item = &ValidationFinding> {
        self.findings.iter().filter(move |f| f.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_code() {
        let warning = ValidationFinding::new(FindingCode::UnusedExtension, "amp-bind", "unused");
        let error = ValidationFinding::new(FindingCode::DisallowedTag, "blink", "no spec");
        assert_eq!(warning.severity, Severity::Warning);
        assert!(error.is_error());

        let report = ValidationReport {
            findings: vec![warning.clone()],
        };
        assert!(report.is_valid());
        assert_eq!(report.warnings().count(), 1);

        let report = ValidationReport {
            findings: vec![warning, error],
        };
        assert!(!report.is_valid());
        assert_eq!(report.errors().count(), 1);
    }

    #[test]
    fn test_finding_serializes_without_node() {
        let finding = ValidationFinding::new(FindingCode::MissingUrl, "amp-img", "empty src")
            .with_attribute("src")
            .at(NodeId(7), "html > body > amp-img");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["code"], "MISSING_URL");
        assert_eq!(json["severity"], "ERROR");
        assert_eq!(json["attribute"], "src");
        assert!(json.get("node").is_none());
        assert_eq!(FindingCode::MissingUrl.to_string(), "MISSING_URL");
    }
}
