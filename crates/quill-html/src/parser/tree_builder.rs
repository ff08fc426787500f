use strum_macros::Display;

use quill_common::elements::is_void_element;
use quill_dom::{Attributes, DomTree, NodeId, NodeType};

use crate::tokenizer::{Attribute, Token};

/// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
///
/// "The insertion mode is a state variable that controls the primary operation
/// of the tree construction stage."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InsertionMode {
    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    Initial,
    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    BeforeHtml,
    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    BeforeHead,
    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    InHead,
    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    AfterHead,
    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    InBody,
    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    Text,
    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    AfterBody,
    /// [§ 13.2.6.4.22 The "after after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    AfterAfterBody,
}

/// [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
///
/// A recoverable problem met while building the tree.
#[derive(Debug, Clone)]
pub struct ParseIssue {
    /// What went wrong.
    pub message: String,
    /// Index into the token stream where this error was encountered.
    pub token_index: usize,
}

/// Elements that close an open `p` when they start.
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "details", "dialog", "dir", "div",
    "dl", "fieldset", "figcaption", "figure", "footer", "header", "hgroup", "main", "menu", "nav",
    "ol", "p", "search", "section", "summary", "ul", "pre", "listing", "form", "table", "hr",
    "xmp", "plaintext",
];

/// End tags that close a block when one is in scope.
const BLOCK_END_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "button", "center", "details", "dialog", "dir",
    "div", "dl", "fieldset", "figcaption", "figure", "footer", "form", "header", "hgroup",
    "listing", "main", "menu", "nav", "ol", "pre", "search", "section", "select", "summary",
    "table", "ul",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Start tags the "in head" mode owns, also honored after the head closed.
const HEAD_CONTENT: &[&str] = &[
    "base", "basefont", "bgsound", "link", "meta", "noframes", "script", "style", "template",
    "title",
];

/// [§ 13.2.4.2 Has an element in scope](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-the-specific-scope)
const SCOPE_MARKERS: &[&str] = &[
    "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template", "mi", "mo",
    "mn", "ms", "mtext", "annotation-xml", "foreignobject", "desc", "title",
];

/// [§ 13.2.6.3 Closing elements that have implied end tags](https://html.spec.whatwg.org/multipage/parsing.html#closing-elements-that-have-implied-end-tags)
const IMPLIED_END_TAGS: &[&str] = &[
    "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc",
];

/// [§ 13.2.4.3 Special](https://html.spec.whatwg.org/multipage/parsing.html#special)
const SPECIAL_ELEMENTS: &[&str] = &[
    "address", "applet", "area", "article", "aside", "base", "basefont", "bgsound",
    "blockquote", "body", "br", "button", "caption", "center", "col", "colgroup", "dd",
    "details", "dir", "div", "dl", "dt", "embed", "fieldset", "figcaption", "figure", "footer",
    "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup",
    "hr", "html", "iframe", "img", "input", "keygen", "li", "link", "listing", "main", "marquee",
    "menu", "meta", "nav", "noembed", "noframes", "noscript", "object", "ol", "p", "param",
    "plaintext", "pre", "script", "search", "section", "select", "source", "style", "summary",
    "table", "tbody", "td", "template", "textarea", "tfoot", "th", "thead", "title", "tr",
    "track", "ul", "wbr", "xmp",
];

/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
///
/// The HTML parser builds a DOM tree from a stream of tokens.
pub struct HTMLParser {
    /// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
    insertion_mode: InsertionMode,

    /// [§ 13.2.4.1](https://html.spec.whatwg.org/multipage/parsing.html#original-insertion-mode)
    original_insertion_mode: Option<InsertionMode>,

    /// [§ 13.2.4.3 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    stack_of_open_elements: Vec<NodeId>,

    /// [§ 13.2.4.4 The element pointers](https://html.spec.whatwg.org/multipage/parsing.html#the-element-pointers)
    head_element_pointer: Option<NodeId>,

    /// `NodeId::ROOT` is the Document node.
    tree: DomTree,

    tokens: Vec<Token>,
    token_index: usize,
    stopped: bool,
    issues: Vec<ParseIssue>,
}

impl HTMLParser {
    /// Create a new parser from a token stream.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            insertion_mode: InsertionMode::Initial,
            original_insertion_mode: None,
            stack_of_open_elements: Vec::new(),
            head_element_pointer: None,
            tree: DomTree::new(),
            tokens,
            token_index: 0,
            stopped: false,
            issues: Vec::new(),
        }
    }

    /// Run the parser and return the DOM tree.
    #[must_use]
    pub fn run(self) -> DomTree {
        self.run_with_issues().0
    }

    /// Run the parser and return both the `DomTree` and any parse issues.
    #[must_use]
    pub fn run_with_issues(mut self) -> (DomTree, Vec<ParseIssue>) {
        let tokens = std::mem::take(&mut self.tokens);
        while !self.stopped && self.token_index < tokens.len() {
            self.process_token(&tokens[self.token_index]);
            self.token_index += 1;
        }
        tracing::debug!(
            nodes = self.tree.len(),
            issues = self.issues.len(),
            "tree construction finished"
        );
        (self.tree, self.issues)
    }

    fn parse_error(&mut self, message: &str) {
        tracing::trace!(token_index = self.token_index, message, "html parse error");
        self.issues.push(ParseIssue {
            message: message.to_string(),
            token_index: self.token_index,
        });
    }

    /// [§ 13.2.6 Tree construction dispatcher](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction-dispatcher)
    fn process_token(&mut self, token: &Token) {
        match self.insertion_mode {
            InsertionMode::Initial => self.handle_initial_mode(token),
            InsertionMode::BeforeHtml => self.handle_before_html_mode(token),
            InsertionMode::BeforeHead => self.handle_before_head_mode(token),
            InsertionMode::InHead => self.handle_in_head_mode(token),
            InsertionMode::AfterHead => self.handle_after_head_mode(token),
            InsertionMode::InBody => self.handle_in_body_mode(token),
            InsertionMode::Text => self.handle_text_mode(token),
            InsertionMode::AfterBody => self.handle_after_body_mode(token),
            InsertionMode::AfterAfterBody => self.handle_after_after_body_mode(token),
        }
    }

    /// "Reprocess the token" in the (new) current insertion mode.
    fn reprocess_token(&mut self, token: &Token) {
        self.process_token(token);
    }

    const fn is_whitespace(c: char) -> bool {
        matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' ')
    }

    fn is_whitespace_token(token: &Token) -> bool {
        matches!(token, Token::Character { data } if Self::is_whitespace(*data))
    }

    // =========================================================================
    // Insertion helpers
    // =========================================================================

    /// "The current node is the bottommost node in this stack of open elements."
    fn current_node(&self) -> NodeId {
        self.stack_of_open_elements
            .last()
            .copied()
            .unwrap_or(NodeId::ROOT)
    }

    fn current_tag(&self) -> Option<&str> {
        self.stack_of_open_elements
            .last()
            .and_then(|&id| self.tree.tag_name(id))
    }

    /// Attributes of a start tag in source order. The tokenizer already
    /// dropped duplicates.
    fn attributes_of(attributes: &[Attribute]) -> Attributes {
        let mut attrs = Attributes::new();
        for attr in attributes {
            let _ = Self::add_attribute(&mut attrs, attr);
        }
        attrs
    }

    /// Add a token attribute unless its name is taken, keeping whether the
    /// source gave it a value.
    fn add_attribute(attrs: &mut Attributes, attr: &Attribute) -> bool {
        if attr.has_value {
            attrs.set_if_absent(&attr.name, &attr.value)
        } else {
            attrs.set_valueless_if_absent(&attr.name)
        }
    }

    /// [§ 13.2.6.1 Creating and inserting nodes](https://html.spec.whatwg.org/multipage/parsing.html#insert-an-html-element)
    ///
    /// "Insert an HTML element for the token" and push it onto the stack of
    /// open elements.
    fn insert_html_element(&mut self, name: &str, attributes: &[Attribute]) -> NodeId {
        let id = self.tree.create_element(name);
        if let Some(element) = self.tree.as_element_mut(id) {
            element.attrs = Self::attributes_of(attributes);
        }
        let parent = self.current_node();
        self.tree.append_child(parent, id);
        self.stack_of_open_elements.push(id);
        id
    }

    /// Insert an element that is popped immediately (void elements, and
    /// self-closing elements in foreign content).
    fn insert_and_pop(&mut self, name: &str, attributes: &[Attribute]) {
        let _ = self.insert_html_element(name, attributes);
        let _ = self.stack_of_open_elements.pop();
    }

    /// [§ 13.2.6.1 Insert a character](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-character)
    ///
    /// "If there is a Text node immediately before the adjusted insertion
    /// location, then append data to that Text node's data. Otherwise, create
    /// a new Text node whose data is data."
    fn insert_character(&mut self, c: char) {
        let parent = self.current_node();
        if parent == NodeId::ROOT {
            return;
        }
        if let Some(last) = self.tree.last_child(parent)
            && let Some(node) = self.tree.get_mut(last)
            && let NodeType::Text(data) = &mut node.node_type
        {
            data.push(c);
            return;
        }
        let text = self.tree.create_text(c.to_string());
        self.tree.append_child(parent, text);
    }

    /// "Insert a comment" at the adjusted insertion location.
    fn insert_comment(&mut self, data: &str) {
        let parent = self.current_node();
        self.insert_comment_into(parent, data);
    }

    fn insert_comment_into(&mut self, parent: NodeId, data: &str) {
        let comment = self.tree.create_comment(data);
        self.tree.append_child(parent, comment);
    }

    /// Merge attributes of a stray `<html>` or `<body>` start tag onto the
    /// existing element: "add the attribute ... if the attribute is not
    /// already present on the element".
    fn merge_attributes(&mut self, target: NodeId, attributes: &[Attribute]) {
        if let Some(element) = self.tree.as_element_mut(target) {
            for attr in attributes {
                let _ = Self::add_attribute(&mut element.attrs, attr);
            }
        }
    }

    /// Pop elements until an element with `tag_name` has been popped.
    fn pop_until_tag(&mut self, tag_name: &str) {
        while let Some(id) = self.stack_of_open_elements.pop() {
            if self.tree.tag_name(id) == Some(tag_name) {
                break;
            }
        }
    }

    fn pop_until_one_of(&mut self, tag_names: &[&str]) {
        while let Some(id) = self.stack_of_open_elements.pop() {
            if self.tree.tag_name(id).is_some_and(|t| tag_names.contains(&t)) {
                break;
            }
        }
    }

    fn stack_contains(&self, tag_name: &str) -> bool {
        self.stack_of_open_elements
            .iter()
            .any(|&id| self.tree.tag_name(id) == Some(tag_name))
    }

    /// [§ 13.2.4.3 Has an element in the specific scope](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-the-specific-scope)
    fn has_element_in_specific_scope(&self, tag_name: &str, extra_markers: &[&str]) -> bool {
        for &id in self.stack_of_open_elements.iter().rev() {
            let Some(tag) = self.tree.tag_name(id) else {
                continue;
            };
            if tag == tag_name {
                return true;
            }
            if SCOPE_MARKERS.contains(&tag) || extra_markers.contains(&tag) {
                return false;
            }
        }
        false
    }

    fn has_element_in_scope(&self, tag_name: &str) -> bool {
        self.has_element_in_specific_scope(tag_name, &[])
    }

    /// "in button scope": the scope markers plus `button`.
    fn has_element_in_button_scope(&self, tag_name: &str) -> bool {
        self.has_element_in_specific_scope(tag_name, &["button"])
    }

    /// "in list item scope": the scope markers plus `ol` and `ul`.
    fn has_element_in_list_item_scope(&self, tag_name: &str) -> bool {
        self.has_element_in_specific_scope(tag_name, &["ol", "ul"])
    }

    /// [§ 13.2.6.3](https://html.spec.whatwg.org/multipage/parsing.html#generate-implied-end-tags)
    ///
    /// "while the current node is ... the UA must pop the current node off the
    /// stack of open elements."
    fn generate_implied_end_tags_excluding(&mut self, exclude: Option<&str>) {
        while let Some(tag) = self.current_tag() {
            if !IMPLIED_END_TAGS.contains(&tag) || Some(tag) == exclude {
                break;
            }
            let _ = self.stack_of_open_elements.pop();
        }
    }

    /// "close a p element"
    fn close_p_element(&mut self) {
        self.generate_implied_end_tags_excluding(Some("p"));
        if self.current_tag() != Some("p") {
            self.parse_error("unexpected open element while closing p");
        }
        self.pop_until_tag("p");
    }

    fn close_p_if_in_button_scope(&mut self) {
        if self.has_element_in_button_scope("p") {
            self.close_p_element();
        }
    }

    /// Inside `svg` or `math`, where the self-closing flag is honored.
    fn in_foreign_content(&self) -> bool {
        self.stack_of_open_elements
            .iter()
            .any(|&id| matches!(self.tree.tag_name(id), Some("svg" | "math")))
    }

    /// [§ 13.2.6.4.7 "Any other end tag"](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    fn any_other_end_tag(&mut self, tag_name: &str) {
        let mut i = self.stack_of_open_elements.len();
        while i > 0 {
            i -= 1;
            let node_id = self.stack_of_open_elements[i];
            let Some(node_tag) = self.tree.tag_name(node_id) else {
                continue;
            };
            // "If node is an HTML element with the same tag name as the token"
            if node_tag == tag_name {
                self.generate_implied_end_tags_excluding(Some(tag_name));
                self.stack_of_open_elements.truncate(i);
                return;
            }
            // "Otherwise, if node is in the special category, then this is a
            // parse error; ignore the token, and return."
            if SPECIAL_ELEMENTS.contains(&node_tag) {
                self.parse_error(&format!("stray end tag </{tag_name}>"));
                return;
            }
        }
    }

    /// Switch to the "text" mode for an element whose content the tokenizer
    /// reads as RCDATA or RAWTEXT.
    fn enter_text_mode(&mut self) {
        self.original_insertion_mode = Some(self.insertion_mode);
        self.insertion_mode = InsertionMode::Text;
    }

    // =========================================================================
    // Insertion modes
    // =========================================================================

    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    fn handle_initial_mode(&mut self, token: &Token) {
        match token {
            // "Ignore the token."
            t if Self::is_whitespace_token(t) => {}
            // "Insert a comment as the last child of the Document object."
            Token::Comment { data } => self.insert_comment_into(NodeId::ROOT, data),
            // "Append a DocumentType node to the Document node"
            Token::Doctype { name } => {
                let doctype = self
                    .tree
                    .alloc(NodeType::Doctype(name.clone().unwrap_or_default()));
                self.tree.append_child(NodeId::ROOT, doctype);
                self.insertion_mode = InsertionMode::BeforeHtml;
            }
            _ => {
                self.insertion_mode = InsertionMode::BeforeHtml;
                self.reprocess_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    fn handle_before_html_mode(&mut self, token: &Token) {
        match token {
            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),
            Token::Comment { data } => self.insert_comment_into(NodeId::ROOT, data),
            t if Self::is_whitespace_token(t) => {}
            Token::StartTag {
                name, attributes, ..
            } if name == "html" => {
                let _ = self.insert_html_element("html", attributes);
                self.insertion_mode = InsertionMode::BeforeHead;
            }
            Token::EndTag { name } if !matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.parse_error(&format!("stray end tag </{name}>"));
            }
            _ => {
                let _ = self.insert_html_element("html", &[]);
                self.insertion_mode = InsertionMode::BeforeHead;
                self.reprocess_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    fn handle_before_head_mode(&mut self, token: &Token) {
        match token {
            t if Self::is_whitespace_token(t) => {}
            Token::Comment { data } => self.insert_comment(data),
            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),
            Token::StartTag {
                name, attributes, ..
            } if name == "head" => {
                let head = self.insert_html_element("head", attributes);
                self.head_element_pointer = Some(head);
                self.insertion_mode = InsertionMode::InHead;
            }
            Token::EndTag { name } if !matches!(name.as_str(), "head" | "body" | "html" | "br") => {
                self.parse_error(&format!("stray end tag </{name}>"));
            }
            _ => {
                let head = self.insert_html_element("head", &[]);
                self.head_element_pointer = Some(head);
                self.insertion_mode = InsertionMode::InHead;
                self.reprocess_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    ///
    /// `noscript` and `template` are plain containers here; their content is
    /// processed with these same rules.
    fn handle_in_head_mode(&mut self, token: &Token) {
        match token {
            t if Self::is_whitespace_token(t) => {
                if let Token::Character { data } = t {
                    self.insert_character(*data);
                }
            }
            Token::Comment { data } => self.insert_comment(data),
            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),
            Token::StartTag {
                name, attributes, ..
            } => match name.as_str() {
                "html" => self.handle_in_body_mode(token),
                "base" | "basefont" | "bgsound" | "link" | "meta" => {
                    self.insert_and_pop(name, attributes);
                }
                "title" | "noframes" | "style" | "script" => {
                    let _ = self.insert_html_element(name, attributes);
                    self.enter_text_mode();
                }
                "noscript" | "template" => {
                    let _ = self.insert_html_element(name, attributes);
                }
                "head" => self.parse_error("unexpected <head>"),
                _ => self.handle_in_head_anything_else(token),
            },
            Token::EndTag { name } => match name.as_str() {
                "head" => {
                    self.pop_until_tag("head");
                    self.insertion_mode = InsertionMode::AfterHead;
                }
                "noscript" | "template" if self.stack_contains(name) => {
                    self.pop_until_tag(name);
                }
                "body" | "html" | "br" => self.handle_in_head_anything_else(token),
                // Normalized `<meta></meta>` and friends.
                tag if is_void_element(tag) => {}
                _ => self.parse_error(&format!("stray end tag </{name}> in head")),
            },
            _ => self.handle_in_head_anything_else(token),
        }
    }

    /// "Pop the current node (which will be the head element) off the stack of
    /// open elements. Switch the insertion mode to "after head". Reprocess the
    /// token."
    fn handle_in_head_anything_else(&mut self, token: &Token) {
        self.pop_until_tag("head");
        self.insertion_mode = InsertionMode::AfterHead;
        self.reprocess_token(token);
    }

    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    fn handle_after_head_mode(&mut self, token: &Token) {
        match token {
            t if Self::is_whitespace_token(t) => {
                if let Token::Character { data } = t {
                    self.insert_character(*data);
                }
            }
            Token::Comment { data } => self.insert_comment(data),
            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),
            Token::StartTag {
                name, attributes, ..
            } => match name.as_str() {
                "html" => self.handle_in_body_mode(token),
                "body" => {
                    let _ = self.insert_html_element("body", attributes);
                    self.insertion_mode = InsertionMode::InBody;
                }
                // "Push the node pointed to by the head element pointer onto the
                // stack of open elements. Process the token using the rules for
                // the "in head" insertion mode. Remove the node pointed to by the
                // head element pointer from the stack of open elements."
                tag if HEAD_CONTENT.contains(&tag) => {
                    self.parse_error(&format!("<{tag}> after </head>"));
                    let Some(head) = self.head_element_pointer else {
                        return;
                    };
                    self.stack_of_open_elements.push(head);
                    self.handle_in_head_mode(token);
                    self.stack_of_open_elements.retain(|&id| id != head);
                }
                "head" => self.parse_error("unexpected <head>"),
                _ => self.handle_after_head_anything_else(token),
            },
            Token::EndTag { name } if !matches!(name.as_str(), "body" | "html" | "br") => {
                self.parse_error(&format!("stray end tag </{name}>"));
            }
            _ => self.handle_after_head_anything_else(token),
        }
    }

    /// "Insert an HTML element for a "body" start tag token with no attributes.
    /// Switch the insertion mode to "in body". Reprocess the current token."
    fn handle_after_head_anything_else(&mut self, token: &Token) {
        let _ = self.insert_html_element("body", &[]);
        self.insertion_mode = InsertionMode::InBody;
        self.reprocess_token(token);
    }

    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    fn handle_in_body_mode(&mut self, token: &Token) {
        match token {
            Token::Character { data: '\0' } => self.parse_error("unexpected null character"),
            Token::Character { data } => self.insert_character(*data),
            Token::Comment { data } => self.insert_comment(data),
            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),
            Token::StartTag {
                name,
                self_closing,
                attributes,
            } => self.handle_in_body_start_tag(token, name, *self_closing, attributes),
            Token::EndTag { name } => self.handle_in_body_end_tag(token, name),
            Token::EndOfFile => self.stopped = true,
        }
    }

    fn handle_in_body_start_tag(
        &mut self,
        token: &Token,
        name: &str,
        self_closing: bool,
        attributes: &[Attribute],
    ) {
        match name {
            // "add the attribute and its corresponding value to that element"
            "html" => {
                self.parse_error("unexpected <html>");
                if let Some(&html) = self.stack_of_open_elements.first() {
                    self.merge_attributes(html, attributes);
                }
            }
            tag if HEAD_CONTENT.contains(&tag) => self.handle_in_head_mode(token),
            "body" => {
                self.parse_error("unexpected <body>");
                let body = self
                    .stack_of_open_elements
                    .get(1)
                    .copied()
                    .filter(|&id| self.tree.tag_name(id) == Some("body"));
                if let Some(body) = body {
                    self.merge_attributes(body, attributes);
                }
            }
            tag if HEADINGS.contains(&tag) => {
                self.close_p_if_in_button_scope();
                if self.current_tag().is_some_and(|t| HEADINGS.contains(&t)) {
                    self.parse_error("nested heading");
                    let _ = self.stack_of_open_elements.pop();
                }
                let _ = self.insert_html_element(name, attributes);
            }
            "li" => {
                self.close_list_item(&["li"]);
                let _ = self.insert_html_element(name, attributes);
            }
            "dd" | "dt" => {
                self.close_list_item(&["dd", "dt"]);
                let _ = self.insert_html_element(name, attributes);
            }
            "button" => {
                if self.has_element_in_scope("button") {
                    self.parse_error("nested <button>");
                    self.generate_implied_end_tags_excluding(None);
                    self.pop_until_tag("button");
                }
                let _ = self.insert_html_element(name, attributes);
            }
            "option" => {
                if self.current_tag() == Some("option") {
                    let _ = self.stack_of_open_elements.pop();
                }
                let _ = self.insert_html_element(name, attributes);
            }
            "hr" => {
                self.close_p_if_in_button_scope();
                self.insert_and_pop(name, attributes);
            }
            "image" => {
                self.parse_error("<image> treated as <img>");
                self.insert_and_pop("img", attributes);
            }
            tag if is_void_element(tag) => self.insert_and_pop(name, attributes),
            "textarea" | "iframe" | "noembed" => {
                let _ = self.insert_html_element(name, attributes);
                self.enter_text_mode();
            }
            "xmp" => {
                self.close_p_if_in_button_scope();
                let _ = self.insert_html_element(name, attributes);
                self.enter_text_mode();
            }
            tag if CLOSES_P.contains(&tag) => {
                self.close_p_if_in_button_scope();
                let _ = self.insert_html_element(name, attributes);
                if tag == "plaintext" {
                    self.enter_text_mode();
                }
            }
            // "If the token has its self-closing flag set, pop the current node
            // off the stack of open elements and acknowledge the token's
            // self-closing flag."
            "svg" | "math" => {
                let _ = self.insert_html_element(name, attributes);
                if self_closing {
                    let _ = self.stack_of_open_elements.pop();
                }
            }
            _ => {
                let _ = self.insert_html_element(name, attributes);
                if self_closing && self.in_foreign_content() {
                    let _ = self.stack_of_open_elements.pop();
                }
            }
        }
    }

    /// Start tag `li`, `dd` or `dt`: close an open item of the same family
    /// unless a special element other than `address`, `div` or `p` intervenes,
    /// then close any open `p`.
    fn close_list_item(&mut self, family: &[&str]) {
        let mut open_item = None;
        for &id in self.stack_of_open_elements.iter().rev() {
            let Some(tag) = self.tree.tag_name(id) else {
                continue;
            };
            if let Some(&item) = family.iter().find(|&&f| f == tag) {
                open_item = Some(item);
                break;
            }
            if SPECIAL_ELEMENTS.contains(&tag) && !matches!(tag, "address" | "div" | "p") {
                break;
            }
        }
        if let Some(item) = open_item {
            self.generate_implied_end_tags_excluding(Some(item));
            self.pop_until_tag(item);
        }
        self.close_p_if_in_button_scope();
    }

    fn handle_in_body_end_tag(&mut self, token: &Token, name: &str) {
        match name {
            "body" => {
                if self.has_element_in_scope("body") {
                    self.insertion_mode = InsertionMode::AfterBody;
                } else {
                    self.parse_error("</body> without open body");
                }
            }
            "html" => {
                if self.has_element_in_scope("body") {
                    self.insertion_mode = InsertionMode::AfterBody;
                    self.reprocess_token(token);
                } else {
                    self.parse_error("</html> without open body");
                }
            }
            // "If there is no p element in button scope, then this is a parse
            // error; insert an HTML element for a "p" start tag token with no
            // attributes."
            "p" => {
                if !self.has_element_in_button_scope("p") {
                    self.parse_error("</p> without open p");
                    let _ = self.insert_html_element("p", &[]);
                }
                self.close_p_element();
            }
            "li" => {
                if self.has_element_in_list_item_scope("li") {
                    self.generate_implied_end_tags_excluding(Some("li"));
                    self.pop_until_tag("li");
                } else {
                    self.parse_error("</li> without open li");
                }
            }
            "dd" | "dt" => {
                if self.has_element_in_scope(name) {
                    self.generate_implied_end_tags_excluding(Some(name));
                    self.pop_until_tag(name);
                } else {
                    self.parse_error(&format!("</{name}> without open element"));
                }
            }
            tag if HEADINGS.contains(&tag) => {
                if HEADINGS.iter().any(|h| self.has_element_in_scope(h)) {
                    self.generate_implied_end_tags_excluding(None);
                    self.pop_until_one_of(HEADINGS);
                } else {
                    self.parse_error(&format!("</{name}> without open heading"));
                }
            }
            tag if BLOCK_END_TAGS.contains(&tag) => {
                if self.has_element_in_scope(tag) {
                    self.generate_implied_end_tags_excluding(None);
                    self.pop_until_tag(tag);
                } else {
                    self.parse_error(&format!("</{name}> without open element"));
                }
            }
            // Void end tags never open a new element; they are dropped.
            tag if is_void_element(tag) => {}
            _ => self.any_other_end_tag(name),
        }
    }

    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    fn handle_text_mode(&mut self, token: &Token) {
        match token {
            // "Insert the token's character."
            Token::Character { data } => self.insert_character(*data),
            // "Pop the current node off the stack of open elements. Switch the
            // insertion mode to the original insertion mode and reprocess the
            // token."
            Token::EndOfFile => {
                self.parse_error("end of file in raw text element");
                let _ = self.stack_of_open_elements.pop();
                self.insertion_mode = self
                    .original_insertion_mode
                    .take()
                    .unwrap_or(InsertionMode::InBody);
                self.reprocess_token(token);
            }
            // "Pop the current node off the stack of open elements. Switch the
            // insertion mode to the original insertion mode."
            _ => {
                let _ = self.stack_of_open_elements.pop();
                self.insertion_mode = self
                    .original_insertion_mode
                    .take()
                    .unwrap_or(InsertionMode::InBody);
            }
        }
    }

    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    fn handle_after_body_mode(&mut self, token: &Token) {
        match token {
            t if Self::is_whitespace_token(t) => self.handle_in_body_mode(token),
            // "Insert a comment as the last child of the first element in the
            // stack of open elements (the html element)."
            Token::Comment { data } => {
                let html = self
                    .stack_of_open_elements
                    .first()
                    .copied()
                    .unwrap_or(NodeId::ROOT);
                self.insert_comment_into(html, data);
            }
            Token::Doctype { .. } => self.parse_error("unexpected DOCTYPE"),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),
            Token::EndTag { name } if name == "html" => {
                self.insertion_mode = InsertionMode::AfterAfterBody;
            }
            Token::EndOfFile => self.stopped = true,
            _ => {
                self.parse_error("content after </body>");
                self.insertion_mode = InsertionMode::InBody;
                self.reprocess_token(token);
            }
        }
    }

    /// [§ 13.2.6.4.22 The "after after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    fn handle_after_after_body_mode(&mut self, token: &Token) {
        match token {
            Token::Comment { data } => self.insert_comment_into(NodeId::ROOT, data),
            Token::Doctype { .. } => self.handle_in_body_mode(token),
            t if Self::is_whitespace_token(t) => self.handle_in_body_mode(token),
            Token::StartTag { name, .. } if name == "html" => self.handle_in_body_mode(token),
            Token::EndOfFile => self.stopped = true,
            _ => {
                self.parse_error("content after </html>");
                self.insertion_mode = InsertionMode::InBody;
                self.reprocess_token(token);
            }
        }
    }
}
