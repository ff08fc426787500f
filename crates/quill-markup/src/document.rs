//! Parsed document wrapper.
//!
//! A [`Document`] ties a [`DomTree`] to the [`Transcoder`] that prepared its
//! source, so that anything serialized from the tree comes back out with the
//! original binding attributes and template delimiters.

use std::borrow::Cow;

use quill_dom::{Attributes, DomTree, NodeId, serialize_node};
use quill_html::{ParseIssue, parse_document};

use crate::error::ParseError;
use crate::placeholder::PlaceholderRegistry;
use crate::transcoder::Transcoder;

/// Character encoding declared by [`Document::from_fragment`].
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Returned by [`Document::attributes`] for nodes without attributes.
static NO_ATTRIBUTES: Attributes = Attributes::new();

/// An HTML document parsed from transcoded markup.
#[derive(Debug, Clone)]
pub struct Document {
    tree: DomTree,
    transcoder: Transcoder,
    parse_issues: Vec<ParseIssue>,
}

impl Document {
    /// Parse a complete HTML document with a freshly salted registry.
    ///
    /// # Errors
    ///
    /// [`ParseError::EmptyInput`] for empty or whitespace-only input,
    /// [`ParseError::NoDocumentElement`] if no `html` element was built.
    pub fn parse(html: &str) -> Result<Self, ParseError> {
        Self::parse_with_registry(html, PlaceholderRegistry::new())
    }

    /// Parse a complete HTML document, transcoding with `registry`.
    ///
    /// # Errors
    ///
    /// See [`Document::parse`].
    pub fn parse_with_registry(
        html: &str,
        registry: PlaceholderRegistry,
    ) -> Result<Self, ParseError> {
        if html.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let transcoder = Transcoder::new(registry);
        let encoded = transcoder.encode(html);
        let (tree, parse_issues) = parse_document(&encoded);
        if tree.document_element().is_none() {
            return Err(ParseError::NoDocumentElement);
        }

        tracing::debug!(
            nodes = tree.len(),
            issues = parse_issues.len(),
            "document parsed"
        );
        Ok(Self {
            tree,
            transcoder,
            parse_issues,
        })
    }

    /// Parse a body fragment, declaring [`DEFAULT_CHARSET`].
    ///
    /// # Errors
    ///
    /// [`ParseError::NoDocumentElement`] if no `html` element was built.
    pub fn from_fragment(content: &str) -> Result<Self, ParseError> {
        Self::from_fragment_with_charset(content, DEFAULT_CHARSET)
    }

    /// Parse a body fragment inside a minimal document declaring `charset`.
    ///
    /// # Errors
    ///
    /// See [`Document::from_fragment`].
    pub fn from_fragment_with_charset(content: &str, charset: &str) -> Result<Self, ParseError> {
        Self::from_fragment_with_registry(content, charset, PlaceholderRegistry::new())
    }

    /// Parse a body fragment with an explicit charset and registry.
    ///
    /// # Errors
    ///
    /// See [`Document::from_fragment`].
    pub fn from_fragment_with_registry(
        content: &str,
        charset: &str,
        registry: PlaceholderRegistry,
    ) -> Result<Self, ParseError> {
        Self::parse_with_registry(&wrap_fragment(content, charset), registry)
    }

    /// The parsed tree.
    #[must_use]
    pub const fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// The parsed tree, for mutation.
    pub const fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// The transcoder that prepared this document's source.
    #[must_use]
    pub const fn transcoder(&self) -> &Transcoder {
        &self.transcoder
    }

    /// Recoverable problems the tree builder reported.
    #[must_use]
    pub fn parse_issues(&self) -> &[ParseIssue] {
        &self.parse_issues
    }

    /// Create a detached element owned by this document.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.tree.create_element(tag_name)
    }

    /// Create a detached element and give it `attributes`.
    pub fn create_element_with_attributes<I, N, V>(&mut self, tag_name: &str, attributes: I) -> NodeId
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let node = self.create_element(tag_name);
        self.set_attributes(node, attributes);
        node
    }

    /// Set each `(name, value)` pair on `node`, replacing existing values.
    ///
    /// Non-element nodes are left alone.
    pub fn set_attributes<I, N, V>(&mut self, node: NodeId, attributes: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let Some(element) = self.tree.as_element_mut(node) else {
            tracing::debug!(?node, "set_attributes on a non-element node ignored");
            return;
        };
        for (name, value) in attributes {
            let _ = element.attrs.set(name, value);
        }
    }

    /// Attributes of `node`; empty for non-elements and unknown ids.
    #[must_use]
    pub fn attributes(&self, node: NodeId) -> &Attributes {
        self.tree
            .as_element(node)
            .map_or(&NO_ATTRIBUTES, |element| &element.attrs)
    }

    /// `[name]` for an attribute stored under the binding prefix, the name
    /// unchanged otherwise.
    #[must_use]
    pub fn binding_attribute_name<'a>(&self, attribute: &'a str) -> Cow<'a, str> {
        self.transcoder
            .registry()
            .binding_attribute_name(attribute)
            .map_or(Cow::Borrowed(attribute), Cow::Owned)
    }

    /// Serialize `node` with its subtree and decode the result.
    ///
    /// Whitespace-only output comes back as an empty string.
    ///
    /// Attribute values, binding expressions included, are written the way
    /// the HTML serializer writes them: always double-quoted, with `&` as
    /// `&amp;` and `"` as `&quot;`. `[text]="a && b"` therefore comes back
    /// as `[text]="a &amp;&amp; b"`, and `[class]='"x"'` as
    /// `[class]="&quot;x&quot;"`. Both parse to the same value.
    #[must_use]
    pub fn serialize_node(&self, node: NodeId) -> String {
        let html = serialize_node(&self.tree, node);
        if html.trim().is_empty() {
            return String::new();
        }
        self.transcoder.decode(&html)
    }

    /// Decoded serialization of every direct child of `body`, concatenated.
    ///
    /// Empty if the document has no body.
    #[must_use]
    pub fn body_content(&self) -> String {
        let Some(body) = self.tree.body() else {
            return String::new();
        };
        self.tree
            .children(body)
            .iter()
            .map(|&child| self.serialize_node(child))
            .collect()
    }

    /// Decoded serialization of the whole document.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.serialize_node(NodeId::ROOT)
    }
}

/// Minimal document around a body fragment.
fn wrap_fragment(content: &str, charset: &str) -> String {
    format!(
        "<html><head><meta http-equiv=\"content-type\" content=\"text/html; charset={charset}\"></head><body>{content}</body></html>"
    )
}
