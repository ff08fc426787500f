//! The validation walk.
//!
//! Elements are visited in document order. For each one the engine picks the
//! tag spec that fits best, checks the element against it, and records what
//! the document-level pass needs: match counts, required extensions, loader
//! scripts and stylesheet bytes.

use std::collections::{BTreeMap, HashMap};
use std::iter;

use quill_common::elements::is_global_attribute;
use quill_common::url::{UrlKind, classify_url};
use quill_css::at_rules;
use quill_dom::{DomTree, NodeId};
use quill_markup::Document;

use crate::error::RepositoryError;
use crate::finding::{FindingCode, ValidationFinding, ValidationReport};
use crate::model::{DispatchKey, Layout, TagSpec, UrlSpec, ValueConstraint};
use crate::options::ValidationOptions;
use crate::repository::{CompiledSpec, SpecId, SpecRepository};

/// Attributes every spec with an `amp_layout` accepts.
const LAYOUT_ATTRIBUTES: &[&str] = &["layout", "width", "height", "heights", "sizes"];

/// Extension that provides binding attributes.
const BIND_EXTENSION: &str = "amp-bind";

/// Bindings every element accepts alongside the globals.
const GLOBAL_BINDINGS: &[&str] = &["text"];

/// Attributes that name the extension a loader script provides.
const LOADER_ATTRIBUTES: &[&str] = &["custom-element", "custom-template"];

/// An element attribute the way rules refer to it.
#[derive(Debug)]
struct ElementAttr {
    /// Lowercase, with binding attributes spelled `[name]`.
    name: String,
    /// Template placeholders restored.
    value: String,
}

impl ElementAttr {
    fn is_binding(&self) -> bool {
        self.name.starts_with('[') && self.name.ends_with(']')
    }

    /// Values with template syntax are resolved at render time.
    fn is_templated(&self) -> bool {
        self.value.contains("{{")
    }
}

fn find_attr<'a>(attrs: &'a [ElementAttr], name: &str) -> Option<&'a ElementAttr> {
    attrs.iter().find(|attr| attr.name == name)
}

/// What the walk has seen so far.
#[derive(Debug, Default)]
struct WalkState {
    matched: HashMap<NodeId, SpecId>,
    match_counts: HashMap<SpecId, usize>,
    /// Extension name to the first spec that required it.
    required_extensions: BTreeMap<String, String>,
    /// Extension name to its loader scripts, in document order.
    loaders: BTreeMap<String, Vec<NodeId>>,
    css_bytes: usize,
    findings: Vec<ValidationFinding>,
}

/// Findings for one element against one candidate spec.
struct ElementFindings<'a> {
    spec_name: &'a str,
    node: NodeId,
    path: &'a str,
    findings: Vec<ValidationFinding>,
}

impl ElementFindings<'_> {
    fn report(&mut self, code: FindingCode, attribute: Option<&str>, message: String) {
        let mut finding =
            ValidationFinding::new(code, self.spec_name, message).at(self.node, self.path);
        if let Some(attribute) = attribute {
            finding = finding.with_attribute(attribute);
        }
        self.findings.push(finding);
    }
}

/// Checks documents against a [`SpecRepository`].
///
/// A validator holds no per-document state; one instance can validate any
/// number of documents, from any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    repository: &'r SpecRepository,
    options: ValidationOptions,
}

impl<'r> Validator<'r> {
    /// A validator over `repository`.
    #[must_use]
    pub const fn new(repository: &'r SpecRepository, options: ValidationOptions) -> Self {
        Self {
            repository,
            options,
        }
    }

    /// The rules in use.
    #[must_use]
    pub const fn repository(&self) -> &'r SpecRepository {
        self.repository
    }

    /// The settings in use.
    #[must_use]
    pub const fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate `document`. Never fails; problems are findings.
    #[must_use]
    pub fn validate(&self, document: &Document) -> ValidationReport {
        let tree = document.tree();
        let mut state = WalkState::default();

        for node in tree.descendants(NodeId::ROOT) {
            if tree.as_element(node).is_some() {
                self.validate_element(document, node, &mut state);
            }
        }
        self.check_document(document, &mut state);

        tracing::debug!(
            elements = state.matched.len(),
            findings = state.findings.len(),
            css_bytes = state.css_bytes,
            "validated document"
        );
        ValidationReport {
            findings: state.findings,
        }
    }

    fn validate_element(&self, document: &Document, node: NodeId, state: &mut WalkState) {
        let tree = document.tree();
        let Some(tag) = tree.tag_name(node).map(str::to_ascii_lowercase) else {
            return;
        };
        let attrs = element_attributes(document, node);
        let path = element_path(tree, node);
        record_loader(&tag, &attrs, node, state);

        let candidates: Vec<SpecId> = self
            .repository
            .tag_specs_for(&tag)
            .iter()
            .copied()
            .filter(|&id| {
                self.repository
                    .spec(id)
                    .is_some_and(|spec| spec.spec().applies_to(self.options.format))
            })
            .collect();
        if candidates.is_empty() {
            let finding = ValidationFinding::new(
                FindingCode::DisallowedTag,
                tag.as_str(),
                format!("the tag '{tag}' is disallowed"),
            );
            state.findings.push(finding.at(node, path));
            return;
        }

        let pool = self.dispatch_pool(tree, node, &attrs, &candidates, state);

        // Fewest findings wins; on a tie the spec declared first is kept.
        let mut best: Option<(SpecId, Vec<ValidationFinding>)> = None;
        for id in pool {
            let Some(spec) = self.repository.spec(id) else {
                continue;
            };
            let findings = self.evaluate(document, node, &attrs, id, spec, &path, state);
            tracing::trace!(
                tag = %tag,
                spec = spec.spec().name(),
                findings = findings.len(),
                "evaluated candidate"
            );
            if best.as_ref().is_none_or(|(_, kept)| findings.len() < kept.len()) {
                best = Some((id, findings));
            }
        }

        let Some((id, findings)) = best else {
            return;
        };
        self.record_match(document, node, id, &attrs, state);
        state.findings.extend(findings);
    }

    /// Candidates with the most specific satisfied dispatch key, or all
    /// candidates when no key is satisfied.
    fn dispatch_pool(
        &self,
        tree: &DomTree,
        node: NodeId,
        attrs: &[ElementAttr],
        candidates: &[SpecId],
        state: &WalkState,
    ) -> Vec<SpecId> {
        let ranked: Vec<(SpecId, u8)> = candidates
            .iter()
            .filter_map(|&id| {
                let spec = self.repository.spec(id)?;
                let rank = self.dispatch_rank(tree, node, attrs, spec.spec(), state)?;
                Some((id, rank))
            })
            .collect();

        let Some(top) = ranked.iter().map(|&(_, rank)| rank).max() else {
            tracing::trace!(candidates = candidates.len(), "no dispatch key satisfied");
            return candidates.to_vec();
        };
        let pool: Vec<SpecId> = ranked
            .into_iter()
            .filter(|&(_, rank)| rank == top)
            .map(|(id, _)| id)
            .collect();
        tracing::trace!(rank = top, pool = pool.len(), "dispatched");
        pool
    }

    fn dispatch_rank(
        &self,
        tree: &DomTree,
        node: NodeId,
        attrs: &[ElementAttr],
        spec: &TagSpec,
        state: &WalkState,
    ) -> Option<u8> {
        let (attr_spec, key) = spec.dispatch_attr()?;
        let attr = find_attr(attrs, &attr_spec.name)?;
        let value_matches = attr_spec
            .value
            .as_ref()
            .is_none_or(|constraint| constraint.matches_exact(&attr.value));
        let satisfied = match key {
            DispatchKey::Name => true,
            DispatchKey::NameValue => value_matches,
            DispatchKey::NameValueParent => {
                value_matches
                    && spec
                        .mandatory_parent
                        .as_deref()
                        .is_none_or(|parent| self.parent_matches(tree, node, parent, state))
            }
        };
        satisfied.then_some(key.rank())
    }

    /// The parent's tag name, or the name of the spec it matched, is `required`.
    fn parent_matches(&self, tree: &DomTree, node: NodeId, required: &str, state: &WalkState) -> bool {
        let Some(parent) = tree.parent(node) else {
            return false;
        };
        if tree
            .tag_name(parent)
            .is_some_and(|tag| tag.eq_ignore_ascii_case(required))
        {
            return true;
        }
        state
            .matched
            .get(&parent)
            .and_then(|&id| self.repository.spec(id))
            .is_some_and(|spec| spec.spec().name() == required)
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        document: &Document,
        node: NodeId,
        attrs: &[ElementAttr],
        id: SpecId,
        compiled: &CompiledSpec,
        path: &str,
        state: &WalkState,
    ) -> Vec<ValidationFinding> {
        let tree = document.tree();
        let spec = compiled.spec();
        let mut out = ElementFindings {
            spec_name: spec.name(),
            node,
            path,
            findings: Vec::new(),
        };

        if let Some(parent) = spec.mandatory_parent.as_deref()
            && !self.parent_matches(tree, node, parent, state)
        {
            let actual = tree
                .parent(node)
                .and_then(|p| tree.tag_name(p))
                .unwrap_or("#document");
            out.report(
                FindingCode::WrongParentTag,
                None,
                format!(
                    "the parent tag of tag '{}' is '{actual}', but it can only be '{parent}'",
                    spec.display_name()
                ),
            );
        }

        if let Some(ancestor) = spec.mandatory_ancestor.as_deref()
            && !tree.ancestors(node).any(|a| {
                tree.tag_name(a)
                    .is_some_and(|tag| tag.eq_ignore_ascii_case(ancestor))
            })
        {
            out.report(
                FindingCode::MandatoryAncestorMissing,
                None,
                format!(
                    "the tag '{}' may only appear as a descendant of tag '{ancestor}'",
                    spec.display_name()
                ),
            );
        }

        if spec.unique && state.match_counts.get(&id).is_some_and(|&count| count > 0) {
            out.report(
                FindingCode::DuplicateUniqueTag,
                None,
                format!("the tag '{}' appears more than once in the document", spec.display_name()),
            );
        }

        self.check_attributes(compiled, attrs, &mut out);
        check_cdata(document, node, compiled, &mut out);
        check_layout(spec, attrs, &mut out);
        out.findings
    }

    fn check_attributes(&self, compiled: &CompiledSpec, attrs: &[ElementAttr], out: &mut ElementFindings<'_>) {
        let spec = compiled.spec();

        for attr_spec in compiled.attrs().iter().filter(|a| a.mandatory) {
            if find_attr(attrs, &attr_spec.name).is_none() {
                out.report(
                    FindingCode::MandatoryAttributeMissing,
                    Some(&attr_spec.name),
                    format!(
                        "the mandatory attribute '{}' is missing in tag '{}'",
                        attr_spec.name,
                        spec.display_name()
                    ),
                );
            }
        }

        for attr in attrs {
            if let Some(attr_spec) = compiled.attr(&attr.name) {
                if let Some(constraint) = &attr_spec.value
                    && !attr.is_templated()
                {
                    check_value(constraint, attr, spec, out);
                }
                continue;
            }
            if self.is_implicitly_allowed(compiled, &attr.name) {
                continue;
            }
            out.report(
                FindingCode::DisallowedAttribute,
                Some(&attr.name),
                format!(
                    "the attribute '{}' may not appear in tag '{}'",
                    attr.name,
                    spec.display_name()
                ),
            );
        }
    }

    /// Attributes allowed without being declared on the spec: layout
    /// attributes, globals, and bindings of anything allowed plus `[text]`.
    fn is_implicitly_allowed(&self, compiled: &CompiledSpec, name: &str) -> bool {
        let has_layout = compiled.spec().amp_layout.is_some();
        let allowed = |name: &str| {
            (has_layout && LAYOUT_ATTRIBUTES.contains(&name))
                || (self.options.allow_global_attributes && is_global_attribute(name))
        };
        if let Some(bound) = name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
            return compiled.attr(bound).is_some()
                || allowed(bound)
                || (self.options.allow_global_attributes && GLOBAL_BINDINGS.contains(&bound));
        }
        allowed(name)
    }

    fn record_match(
        &self,
        document: &Document,
        node: NodeId,
        id: SpecId,
        attrs: &[ElementAttr],
        state: &mut WalkState,
    ) {
        let _ = state.matched.insert(node, id);
        *state.match_counts.entry(id).or_default() += 1;

        let Some(compiled) = self.repository.spec(id) else {
            return;
        };
        let spec = compiled.spec();
        let bind = attrs
            .iter()
            .any(ElementAttr::is_binding)
            .then_some(BIND_EXTENSION);
        for extension in spec.requires_extension.iter().map(String::as_str).chain(bind) {
            let _ = state
                .required_extensions
                .entry(extension.to_string())
                .or_insert_with(|| spec.name().to_string());
        }

        if spec.cdata.as_ref().is_some_and(|cdata| cdata.doc_css_bytes) {
            state.css_bytes += character_data(document, node).len();
        }
    }

    fn check_document(&self, document: &Document, state: &mut WalkState) {
        let tree = document.tree();

        if self.options.check_extensions {
            for (extension, spec_name) in &state.required_extensions {
                if !state.loaders.contains_key(extension) {
                    state.findings.push(ValidationFinding::new(
                        FindingCode::MissingExtension,
                        spec_name.as_str(),
                        format!(
                            "the tag '{spec_name}' requires including the '{extension}' extension script"
                        ),
                    ));
                }
            }
            for (extension, loaders) in &state.loaders {
                for &duplicate in loaders.iter().skip(1) {
                    let finding = ValidationFinding::new(
                        FindingCode::DuplicateExtension,
                        extension.as_str(),
                        format!("the extension '{extension}' is included more than once"),
                    );
                    state.findings.push(finding.at(duplicate, element_path(tree, duplicate)));
                }
                if !state.required_extensions.contains_key(extension)
                    && let Some(&first) = loaders.first()
                {
                    let finding = ValidationFinding::new(
                        FindingCode::UnusedExtension,
                        extension.as_str(),
                        format!("the extension '{extension}' was found on this page, but is unused"),
                    );
                    state.findings.push(finding.at(first, element_path(tree, first)));
                }
            }
        }

        if let Some(format) = self.options.format {
            for (id, compiled) in self.repository.iter() {
                let spec = compiled.spec();
                if spec.mandatory
                    && !spec.is_reference_point()
                    && spec.applies_to(Some(format))
                    && !state.match_counts.contains_key(&id)
                {
                    state.findings.push(ValidationFinding::new(
                        FindingCode::MandatoryTagMissing,
                        spec.name(),
                        format!("the mandatory tag '{}' is missing or incorrect", spec.display_name()),
                    ));
                }
            }
        }

        if state.css_bytes > self.options.max_document_css_bytes {
            state.findings.push(ValidationFinding::new(
                FindingCode::DocumentCssTooLarge,
                "style amp-custom",
                format!(
                    "the author stylesheets are {} bytes, the limit is {} bytes",
                    state.css_bytes, self.options.max_document_css_bytes
                ),
            ));
        }
    }
}

impl Validator<'static> {
    /// A validator over the built-in rule set.
    ///
    /// # Errors
    ///
    /// Returns the load error if the embedded rules are broken.
    pub fn builtin(options: ValidationOptions) -> Result<Self, &'static RepositoryError> {
        SpecRepository::builtin().map(|repository| Self::new(repository, options))
    }
}

fn check_value(constraint: &ValueConstraint, attr: &ElementAttr, spec: &TagSpec, out: &mut ElementFindings<'_>) {
    match constraint {
        ValueConstraint::Exact(_) | ValueConstraint::ExactCasei(_) => {
            if !constraint.matches_exact(&attr.value) {
                out.report(
                    FindingCode::InvalidAttributeValue,
                    Some(&attr.name),
                    format!(
                        "the attribute '{}' in tag '{}' is set to the invalid value '{}'",
                        attr.name,
                        spec.display_name(),
                        attr.value
                    ),
                );
            }
        }
        ValueConstraint::Url(url) => check_url(url, attr, spec, out),
    }
}

fn check_url(url: &UrlSpec, attr: &ElementAttr, spec: &TagSpec, out: &mut ElementFindings<'_>) {
    let tag = spec.display_name();
    let name = attr.name.as_str();
    match classify_url(&attr.value) {
        UrlKind::Empty if !url.allow_empty => out.report(
            FindingCode::MissingUrl,
            Some(name),
            format!("missing URL for attribute '{name}' in tag '{tag}'"),
        ),
        UrlKind::Relative if !url.allow_relative => out.report(
            FindingCode::DisallowedRelativeUrl,
            Some(name),
            format!(
                "the relative URL '{}' for attribute '{name}' in tag '{tag}' is disallowed",
                attr.value
            ),
        ),
        UrlKind::Absolute { scheme }
            if !url.protocols.is_empty()
                && !url.protocols.iter().any(|p| p.eq_ignore_ascii_case(&scheme)) =>
        {
            out.report(
                FindingCode::DisallowedProtocol,
                Some(name),
                format!("invalid URL protocol '{scheme}:' for attribute '{name}' in tag '{tag}'"),
            );
        }
        UrlKind::Invalid(reason) => out.report(
            FindingCode::InvalidUrl,
            Some(name),
            format!(
                "malformed URL '{}' for attribute '{name}' in tag '{tag}': {reason}",
                attr.value
            ),
        ),
        _ => {}
    }
}

fn check_cdata(document: &Document, node: NodeId, compiled: &CompiledSpec, out: &mut ElementFindings<'_>) {
    let spec = compiled.spec();
    let Some(cdata) = &spec.cdata else {
        return;
    };
    let text = character_data(document, node);
    let tag = spec.display_name();

    if let Some(max) = cdata.max_bytes
        && text.len() > max
    {
        out.report(
            FindingCode::CdataTooLong,
            None,
            format!(
                "the text inside tag '{tag}' is {} bytes, the limit is {max} bytes",
                text.len()
            ),
        );
    }

    for (regex, label) in compiled.disallowed_cdata() {
        if regex.is_match(&text) {
            out.report(
                FindingCode::DisallowedCdata,
                None,
                format!("the text inside tag '{tag}' contains '{label}', which is disallowed"),
            );
        }
    }

    if let Some(regex) = compiled.cdata_regex()
        && !regex.is_match(&text)
    {
        out.report(
            FindingCode::CdataMismatch,
            None,
            format!("the text inside tag '{tag}' does not match the required pattern"),
        );
    }

    if let Some(css) = &cdata.css_spec {
        for rule in at_rules(&text) {
            let allowed = css
                .at_rule_spec
                .iter()
                .any(|allowed| allowed.name.eq_ignore_ascii_case(&rule.unprefixed));
            if !allowed {
                out.report(
                    FindingCode::DisallowedAtRule,
                    None,
                    format!("CSS syntax error in tag '{tag}' - saw invalid at rule '@{}'", rule.name),
                );
            }
        }
    }
}

fn check_layout(spec: &TagSpec, attrs: &[ElementAttr], out: &mut ElementFindings<'_>) {
    let Some(layout) = &spec.amp_layout else {
        return;
    };
    let Some(attr) = find_attr(attrs, "layout") else {
        return;
    };
    if attr.is_templated() {
        return;
    }
    match attr.value.trim().parse::<Layout>() {
        Ok(value) if !layout.supported_layouts.contains(&value) => out.report(
            FindingCode::UnsupportedLayout,
            Some("layout"),
            format!(
                "the specified layout '{value}' is not supported by tag '{}'",
                spec.display_name()
            ),
        ),
        Err(_) => out.report(
            FindingCode::InvalidLayout,
            Some("layout"),
            format!(
                "invalid value '{}' for attribute 'layout' in tag '{}'",
                attr.value,
                spec.display_name()
            ),
        ),
        Ok(_) => {}
    }
}

/// Loader scripts are recorded whether or not they match a spec.
fn record_loader(tag: &str, attrs: &[ElementAttr], node: NodeId, state: &mut WalkState) {
    if tag != "script" {
        return;
    }
    let extension = LOADER_ATTRIBUTES
        .iter()
        .find_map(|&name| find_attr(attrs, name));
    if let Some(extension) = extension {
        state
            .loaders
            .entry(extension.value.trim().to_ascii_lowercase())
            .or_default()
            .push(node);
    }
}

fn element_attributes(document: &Document, node: NodeId) -> Vec<ElementAttr> {
    let registry = document.transcoder().registry();
    document
        .attributes(node)
        .iter()
        .map(|attr| ElementAttr {
            name: document
                .binding_attribute_name(&attr.name)
                .to_ascii_lowercase(),
            value: registry.restore_templates(&attr.value),
        })
        .collect()
}

/// Direct text children with template placeholders restored.
fn character_data(document: &Document, node: NodeId) -> String {
    document
        .transcoder()
        .registry()
        .restore_templates(&document.tree().child_text(node))
}

/// `html > body > div:nth-child(2)`. The position is added when the parent
/// has more than one child element with the same tag name.
#[must_use]
pub fn element_path(tree: &DomTree, node: NodeId) -> String {
    let mut chain: Vec<NodeId> = tree.ancestors(node).collect();
    chain.reverse();
    chain
        .into_iter()
        .chain(iter::once(node))
        .filter_map(|id| path_segment(tree, id))
        .collect::<Vec<_>>()
        .join(" > ")
}

fn path_segment(tree: &DomTree, id: NodeId) -> Option<String> {
    let tag = tree.tag_name(id)?;
    let parent = tree.parent(id)?;
    let same_tag = tree
        .children(parent)
        .iter()
        .filter(|&&child| tree.tag_name(child) == Some(tag))
        .count();
    if same_tag > 1 {
        let index = tree.element_index(id)?;
        return Some(format!("{tag}:nth-child({index})"));
    }
    Some(tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_markup::PlaceholderRegistry;

    fn fragment(content: &str) -> Document {
        match Document::from_fragment_with_registry(
            content,
            "utf-8",
            PlaceholderRegistry::with_salt("engine-tests"),
        ) {
            Ok(doc) => doc,
            Err(e) => panic!("fragment failed to parse: {e}"),
        }
    }

    #[test]
    fn test_element_path() {
        let doc = fragment("<p>a</p><div><span>x</span></div><div></div>");
        let tree = doc.tree();
        let Some(&span) = tree.elements_by_tag_name(NodeId::ROOT, "span").first() else {
            panic!("no span");
        };
        assert_eq!(element_path(tree, span), "html > body > div:nth-child(2) > span");
        let Some(&p) = tree.elements_by_tag_name(NodeId::ROOT, "p").first() else {
            panic!("no p");
        };
        assert_eq!(element_path(tree, p), "html > body > p");
    }

    #[test]
    fn test_element_attributes_are_decoded() {
        let doc = fragment(r#"<amp-img [src]="u" ALT="{{a}}"></amp-img>"#);
        let Some(&img) = doc.tree().elements_by_tag_name(NodeId::ROOT, "amp-img").first() else {
            panic!("no amp-img");
        };
        let attrs = element_attributes(&doc, img);
        assert_eq!(attrs[0].name, "[src]");
        assert!(attrs[0].is_binding());
        assert_eq!(attrs[1].name, "alt");
        assert_eq!(attrs[1].value, "{{a}}");
        assert!(attrs[1].is_templated());
    }
}
