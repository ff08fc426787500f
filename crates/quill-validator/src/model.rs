//! Rule schema.
//!
//! These types are the persisted form of a rule set: a JSON document with
//! shared attribute lists and tag specifications, produced by an external
//! generator and only ever read here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Document profile a tag spec applies to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Format {
    /// Regular pages.
    Amp,
    /// Ads.
    Amp4ads,
    /// Email.
    Amp4email,
}

/// Value of the `layout` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Layout {
    /// `nodisplay`
    Nodisplay,
    /// `fixed`
    Fixed,
    /// `fixed-height`
    FixedHeight,
    /// `responsive`
    Responsive,
    /// `container`
    Container,
    /// `fill`
    Fill,
    /// `flex-item`
    FlexItem,
    /// `fluid`
    Fluid,
    /// `intrinsic`
    Intrinsic,
}

/// How a tag spec is picked among others sharing its tag name.
///
/// Attached to one attribute of the spec. A more specific key outranks a
/// less specific one when several candidates are satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum DispatchKey {
    /// The attribute is present.
    #[serde(rename = "NAME_DISPATCH")]
    Name,
    /// The attribute is present with one of the allowed values.
    #[serde(rename = "NAME_VALUE_DISPATCH")]
    NameValue,
    /// As [`DispatchKey::NameValue`], and the parent is the spec's
    /// mandatory parent.
    #[serde(rename = "NAME_VALUE_PARENT_DISPATCH")]
    NameValueParent,
}

impl DispatchKey {
    /// Specificity used to rank satisfied candidates.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Name => 1,
            Self::NameValue => 2,
            Self::NameValueParent => 3,
        }
    }
}

/// Constraint on a URL-valued attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlSpec {
    /// Allowed schemes, lowercase and without the colon.
    #[serde(default, alias = "protocol")]
    pub protocols: Vec<String>,
    /// Accept relative references.
    #[serde(default)]
    pub allow_relative: bool,
    /// Accept an empty value.
    #[serde(default)]
    pub allow_empty: bool,
}

/// Allowed values of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueConstraint {
    /// One of these values, compared exactly.
    Exact(Vec<String>),
    /// One of these values, compared ASCII case-insensitively.
    ExactCasei(Vec<String>),
    /// A URL meeting the [`UrlSpec`].
    Url(UrlSpec),
}

impl ValueConstraint {
    /// True if `value` is in an exact value set. URL constraints never
    /// match, since they describe a shape rather than a set.
    #[must_use]
    pub fn matches_exact(&self, value: &str) -> bool {
        match self {
            Self::Exact(values) => values.iter().any(|v| v == value),
            Self::ExactCasei(values) => values.iter().any(|v| v.eq_ignore_ascii_case(value)),
            Self::Url(_) => false,
        }
    }
}

/// Rule for one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrSpec {
    /// Attribute name, lowercase; binding attributes are written `[name]`.
    pub name: String,
    /// The attribute must be present.
    #[serde(default)]
    pub mandatory: bool,
    /// Allowed values; any value when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueConstraint>,
    /// Marks this attribute as the spec's dispatch key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_key: Option<DispatchKey>,
}

/// A pattern the character data must not match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisallowedCdataRegex {
    /// The pattern, in `regex` crate syntax.
    pub regex: String,
    /// What the pattern catches, used in findings ("html comments").
    pub error_message: String,
}

/// An at-rule a stylesheet may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtRuleSpec {
    /// Keyword without the `@`.
    pub name: String,
}

/// Stylesheet constraints for character data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssSpec {
    /// Allowed at-rules; vendor prefixes are ignored when comparing.
    #[serde(default)]
    pub at_rule_spec: Vec<AtRuleSpec>,
}

/// Constraints on an element's character data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdataSpec {
    /// Upper bound on the content length in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<usize>,
    /// Patterns that must not occur.
    #[serde(default)]
    pub disallowed_cdata_regex: Vec<DisallowedCdataRegex>,
    /// Pattern the whole content must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdata_regex: Option<String>,
    /// The content is a stylesheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_spec: Option<CssSpec>,
    /// Count the content towards the document-wide stylesheet budget.
    #[serde(default)]
    pub doc_css_bytes: bool,
}

/// Layouts an element supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmpLayout {
    /// Accepted values of the `layout` attribute.
    pub supported_layouts: Vec<Layout>,
}

/// Rule for one kind of element usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSpec {
    /// Element name, lowercase. Names starting with `$` are reference points
    /// and never match an element.
    pub tag_name: String,
    /// Distinguishes specs sharing a tag name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_name: Option<String>,
    /// Name used in messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptive_name: Option<String>,
    /// At least one element must match this spec.
    #[serde(default)]
    pub mandatory: bool,
    /// At most one element may match this spec.
    #[serde(default)]
    pub unique: bool,
    /// Tag name, or spec name, the parent must have.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory_parent: Option<String>,
    /// Tag name some ancestor must have.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory_ancestor: Option<String>,
    /// Attributes declared on this spec.
    #[serde(default)]
    pub attrs: Vec<AttrSpec>,
    /// Names of shared attribute lists this spec includes.
    #[serde(default)]
    pub attr_lists: Vec<String>,
    /// Character data constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdata: Option<CdataSpec>,
    /// Formats this spec applies to; all formats when empty.
    #[serde(default)]
    pub html_format: Vec<Format>,
    /// Extensions whose loader script must be present.
    #[serde(default)]
    pub requires_extension: Vec<String>,
    /// Supported layouts; enables the layout attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amp_layout: Option<AmpLayout>,
    /// Documentation link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_url: Option<String>,
    /// Stable identifier for tooling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_id: Option<String>,
}

impl TagSpec {
    /// The spec name, falling back to the tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.spec_name.as_deref().unwrap_or(&self.tag_name)
    }

    /// The descriptive name, falling back to [`TagSpec::name`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.descriptive_name.as_deref().unwrap_or_else(|| self.name())
    }

    /// `$REFERENCE_POINT` style pseudo tags.
    #[must_use]
    pub fn is_reference_point(&self) -> bool {
        self.tag_name.starts_with('$')
    }

    /// True if the spec applies to `format`; `None` means any format.
    #[must_use]
    pub fn applies_to(&self, format: Option<Format>) -> bool {
        match format {
            Some(format) => self.html_format.is_empty() || self.html_format.contains(&format),
            None => true,
        }
    }

    /// The attribute carrying this spec's dispatch key, if any.
    #[must_use]
    pub fn dispatch_attr(&self) -> Option<(&AttrSpec, DispatchKey)> {
        self.attrs
            .iter()
            .find_map(|attr| attr.dispatch_key.map(|key| (attr, key)))
    }
}

/// A complete rule set as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Shared attribute lists by name.
    #[serde(default)]
    pub attr_lists: BTreeMap<String, Vec<AttrSpec>>,
    /// Tag specs in declaration order.
    pub tags: Vec<TagSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_spec_json_shape() {
        let json = r#"{
            "name": "data-dismiss-href",
            "value": { "url": { "protocols": ["https"] } }
        }"#;
        let spec: AttrSpec = match serde_json::from_str(json) {
            Ok(spec) => spec,
            Err(e) => panic!("attr spec did not deserialize: {e}"),
        };
        assert!(!spec.mandatory);
        assert_eq!(
            spec.value,
            Some(ValueConstraint::Url(UrlSpec {
                protocols: vec!["https".to_string()],
                allow_relative: false,
                allow_empty: false,
            }))
        );
    }

    #[test]
    fn test_dispatch_key_names() {
        let key: DispatchKey = match serde_json::from_str("\"NAME_VALUE_PARENT_DISPATCH\"") {
            Ok(key) => key,
            Err(e) => panic!("dispatch key did not deserialize: {e}"),
        };
        assert_eq!(key, DispatchKey::NameValueParent);
        assert!(DispatchKey::NameValueParent.rank() > DispatchKey::NameValue.rank());
        assert!(DispatchKey::NameValue.rank() > DispatchKey::Name.rank());
    }

    #[test]
    fn test_format_and_layout_parse_from_attribute_text() {
        assert_eq!("amp4ads".parse::<Format>().ok(), Some(Format::Amp4ads));
        assert_eq!("AMP".parse::<Format>().ok(), Some(Format::Amp));
        assert_eq!("fixed-height".parse::<Layout>().ok(), Some(Layout::FixedHeight));
        assert_eq!("NoDisplay".parse::<Layout>().ok(), Some(Layout::Nodisplay));
        assert!("sideways".parse::<Layout>().is_err());
        assert_eq!(Layout::FlexItem.to_string(), "flex-item");
    }

    #[test]
    fn test_applies_to() {
        let spec = TagSpec {
            tag_name: "style".to_string(),
            spec_name: None,
            descriptive_name: None,
            mandatory: false,
            unique: false,
            mandatory_parent: None,
            mandatory_ancestor: None,
            attrs: Vec::new(),
            attr_lists: Vec::new(),
            cdata: None,
            html_format: vec![Format::Amp4ads],
            requires_extension: Vec::new(),
            amp_layout: None,
            spec_url: None,
            named_id: None,
        };
        assert!(spec.applies_to(None));
        assert!(spec.applies_to(Some(Format::Amp4ads)));
        assert!(!spec.applies_to(Some(Format::Amp)));
        assert_eq!(spec.name(), "style");
    }
}
