//! Loaded rule sets.
//!
//! A [`SpecRepository`] is built once from a [`RuleSet`], checked for
//! integrity, and never mutated afterwards. Attribute lists are merged into
//! each spec and content patterns are compiled at load time so validation only
//! does lookups.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::RepositoryError;
use crate::model::{AttrSpec, RuleSet, TagSpec};

/// The rule set compiled into the crate.
const BUILTIN_RULES: &str = include_str!("../data/rules.json");

static BUILTIN: LazyLock<Result<SpecRepository, RepositoryError>> =
    LazyLock::new(|| SpecRepository::from_json(BUILTIN_RULES));

/// Index of a tag spec in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecId(pub usize);

/// A tag spec with its attribute lists merged and its patterns compiled.
#[derive(Debug)]
pub struct CompiledSpec {
    spec: TagSpec,
    attrs: Vec<AttrSpec>,
    disallowed_cdata: Vec<(Regex, String)>,
    cdata_regex: Option<Regex>,
}

impl CompiledSpec {
    fn compile(spec: TagSpec, attr_lists: &BTreeMap<String, Vec<AttrSpec>>) -> Result<Self, RepositoryError> {
        // Inline attributes win over list entries with the same name.
        let mut attrs = spec.attrs.clone();
        for list in &spec.attr_lists {
            let entries = attr_lists
                .get(list)
                .ok_or_else(|| RepositoryError::UnknownAttrList {
                    spec: spec.name().to_string(),
                    list: list.clone(),
                })?;
            for entry in entries {
                if !attrs.iter().any(|a| a.name == entry.name) {
                    attrs.push(entry.clone());
                }
            }
        }

        let compile = |pattern: &str, anchored: bool| {
            let source = if anchored {
                format!("^(?:{pattern})$")
            } else {
                pattern.to_string()
            };
            Regex::new(&source).map_err(|source| RepositoryError::InvalidRegex {
                spec: spec.name().to_string(),
                pattern: pattern.to_string(),
                source,
            })
        };

        let mut disallowed_cdata = Vec::new();
        let mut cdata_regex = None;
        if let Some(cdata) = &spec.cdata {
            for rule in &cdata.disallowed_cdata_regex {
                disallowed_cdata.push((compile(&rule.regex, false)?, rule.error_message.clone()));
            }
            if let Some(pattern) = &cdata.cdata_regex {
                cdata_regex = Some(compile(pattern, true)?);
            }
        }

        Ok(Self {
            spec,
            attrs,
            disallowed_cdata,
            cdata_regex,
        })
    }

    /// The spec as declared.
    #[must_use]
    pub const fn spec(&self) -> &TagSpec {
        &self.spec
    }

    /// Inline attributes followed by those of the referenced lists.
    #[must_use]
    pub fn attrs(&self) -> &[AttrSpec] {
        &self.attrs
    }

    /// Attribute spec by lowercase name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttrSpec> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// Compiled disallowed patterns with their labels.
    #[must_use]
    pub fn disallowed_cdata(&self) -> &[(Regex, String)] {
        &self.disallowed_cdata
    }

    /// The anchored pattern the whole content must match.
    #[must_use]
    pub const fn cdata_regex(&self) -> Option<&Regex> {
        self.cdata_regex.as_ref()
    }
}

/// Immutable, indexed collection of tag specs.
///
/// `Send + Sync`; one repository can serve any number of threads.
#[derive(Debug)]
pub struct SpecRepository {
    attr_lists: BTreeMap<String, Vec<AttrSpec>>,
    specs: Vec<CompiledSpec>,
    by_tag: HashMap<String, Vec<SpecId>>,
    by_name: HashMap<String, SpecId>,
}

impl SpecRepository {
    /// Parse and load a JSON rule set.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the JSON is malformed or the rules fail
    /// the integrity checks of [`SpecRepository::from_rules`].
    pub fn from_json(json: &str) -> Result<Self, RepositoryError> {
        let rules: RuleSet = serde_json::from_str(json)?;
        Self::from_rules(rules)
    }

    /// Load a rule set.
    ///
    /// # Errors
    ///
    /// Fails on a reference to an unknown attribute list, a pattern that does
    /// not compile, or two specs with the same name.
    pub fn from_rules(rules: RuleSet) -> Result<Self, RepositoryError> {
        let RuleSet { attr_lists, tags } = rules;
        let mut specs = Vec::with_capacity(tags.len());
        let mut by_tag: HashMap<String, Vec<SpecId>> = HashMap::new();
        let mut by_name = HashMap::new();

        for (index, spec) in tags.into_iter().enumerate() {
            let id = SpecId(index);
            if by_name.insert(spec.name().to_string(), id).is_some() {
                return Err(RepositoryError::DuplicateSpecName(spec.name().to_string()));
            }
            if !spec.is_reference_point() {
                by_tag
                    .entry(spec.tag_name.to_ascii_lowercase())
                    .or_default()
                    .push(id);
            }
            specs.push(CompiledSpec::compile(spec, &attr_lists)?);
        }

        tracing::debug!(
            specs = specs.len(),
            attr_lists = attr_lists.len(),
            tags = by_tag.len(),
            "loaded rule set"
        );

        Ok(Self {
            attr_lists,
            specs,
            by_tag,
            by_name,
        })
    }

    /// The built-in rule set, loaded on first use.
    ///
    /// # Errors
    ///
    /// Returns the load error if the embedded rules are broken.
    pub fn builtin() -> Result<&'static Self, &'static RepositoryError> {
        BUILTIN.as_ref()
    }

    /// Specs for an element name, in declaration order. Case-insensitive.
    #[must_use]
    pub fn tag_specs_for(&self, tag_name: &str) -> &[SpecId] {
        self.by_tag
            .get(&tag_name.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// A shared attribute list by name.
    #[must_use]
    pub fn resolve_attr_list(&self, name: &str) -> Option<&[AttrSpec]> {
        self.attr_lists.get(name).map(Vec::as_slice)
    }

    /// A compiled spec by id.
    #[must_use]
    pub fn spec(&self, id: SpecId) -> Option<&CompiledSpec> {
        self.specs.get(id.0)
    }

    /// A compiled spec by spec name (or tag name for unnamed specs).
    #[must_use]
    pub fn spec_named(&self, name: &str) -> Option<(SpecId, &CompiledSpec)> {
        let id = *self.by_name.get(name)?;
        self.spec(id).map(|spec| (id, spec))
    }

    /// Number of tag specs, reference points included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// True if the rule set has no tag specs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// All specs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (SpecId, &CompiledSpec)> {
        self.specs
            .iter()
            .enumerate()
            .map(|(index, spec)| (SpecId(index), spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(json: &str) -> SpecRepository {
        match SpecRepository::from_json(json) {
            Ok(repository) => repository,
            Err(e) => panic!("rules failed to load: {e}"),
        }
    }

    #[test]
    fn test_inline_attrs_win_over_lists() {
        let repository = load(
            r#"{
                "attr_lists": {
                    "shared": [
                        { "name": "nonce" },
                        { "name": "type", "mandatory": true }
                    ]
                },
                "tags": [
                    {
                        "tag_name": "script",
                        "attrs": [{ "name": "type" }],
                        "attr_lists": ["shared"]
                    }
                ]
            }"#,
        );
        let Some(spec) = repository.spec(SpecId(0)) else {
            panic!("spec missing");
        };
        let names: Vec<&str> = spec.attrs().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["type", "nonce"]);
        assert!(spec.attr("type").is_some_and(|a| !a.mandatory));
    }

    #[test]
    fn test_reference_points_are_not_indexed_by_tag() {
        let repository = load(
            r#"{ "tags": [
                { "tag_name": "$REFERENCE_POINT", "spec_name": "item" },
                { "tag_name": "DIV" }
            ] }"#,
        );
        assert_eq!(repository.len(), 2);
        assert!(repository.tag_specs_for("$REFERENCE_POINT").is_empty());
        assert_eq!(repository.tag_specs_for("div"), [SpecId(1)]);
        assert!(repository.spec_named("item").is_some());
    }

    #[test]
    fn test_cdata_regex_is_anchored() {
        let repository = load(
            r#"{ "tags": [
                { "tag_name": "style", "cdata": { "cdata_regex": "a+" } }
            ] }"#,
        );
        let Some(regex) = repository.spec(SpecId(0)).and_then(CompiledSpec::cdata_regex) else {
            panic!("pattern missing");
        };
        assert!(regex.is_match("aaa"));
        assert!(!regex.is_match("baaa"));
    }
}
