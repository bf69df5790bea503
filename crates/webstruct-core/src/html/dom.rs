//! # Arena DOM
//!
//! A small mutable HTML tree with the "text + tail" text model: every node
//! owns the text before its first child (`text`) and the text after its own
//! end tag up to the next sibling (`tail`). Token positions are character
//! offsets into exactly one of these strings, identified by a [`TextSlot`].
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]; cloning a
//! [`Dom`] is a deep copy.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use scraper::{ElementRef, Html};

/// Index of a node in its [`Dom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One block of text in the tree: a node's own text or its tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextSlot {
    /// Text before the node's first child.
    Text(NodeId),
    /// Text after the node's end tag, inside its parent.
    Tail(NodeId),
}

impl TextSlot {
    /// The node owning this text block.
    pub fn node(self) -> NodeId {
        match self {
            TextSlot::Text(id) | TextSlot::Tail(id) => id,
        }
    }

    /// Check if this is a tail block.
    pub fn is_tail(self) -> bool {
        matches!(self, TextSlot::Tail(_))
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with lowercase tag name and attributes in source order.
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// A comment with its content.
    Comment(String),
}

/// A node in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub text: String,
    pub tail: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            text: String::new(),
            tail: String::new(),
            parent,
            children: Vec::new(),
        }
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// A mutable HTML tree.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Dom {
    /// Create a tree with a single root element.
    pub fn new(root_name: &str) -> Self {
        let root = Node::new(
            NodeKind::Element {
                name: root_name.to_ascii_lowercase(),
                attrs: Vec::new(),
            },
            None,
        );
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// Parse a full HTML document. The root is the `<html>` element.
    pub fn parse_document(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        Self::from_element(parsed.root_element())
    }

    /// Parse an HTML fragment.
    ///
    /// A fragment consisting of exactly one element (ignoring surrounding
    /// whitespace) is rooted at that element; anything else is wrapped in a
    /// `<div>`.
    pub fn parse_fragment(html: &str) -> Self {
        let parsed = Html::parse_fragment(html);
        let wrapper = parsed.root_element();

        let mut elements = wrapper.children().filter_map(ElementRef::wrap);
        let has_text = wrapper.children().any(|child| match child.value() {
            scraper::Node::Text(text) => !text.trim().is_empty(),
            scraper::Node::Comment(_) => true,
            _ => false,
        });

        match (elements.next(), elements.next(), has_text) {
            (Some(single), None, false) => Self::from_element(single),
            _ => {
                let mut dom = Dom::new("div");
                let root = dom.root;
                dom.convert_children(root, wrapper);
                dom
            }
        }
    }

    fn from_element(elem: ElementRef<'_>) -> Self {
        let mut dom = Dom::new(elem.value().name());
        let root = dom.root;
        dom.nodes[root.0].kind = element_kind(elem);
        dom.convert_children(root, elem);
        dom
    }

    fn convert_children(&mut self, parent: NodeId, elem: ElementRef<'_>) {
        for child in elem.children() {
            match child.value() {
                scraper::Node::Text(text) => self.append_text(parent, &**text),
                scraper::Node::Comment(comment) => {
                    self.push(parent, NodeKind::Comment(String::from(&**comment)));
                }
                scraper::Node::Element(_) => {
                    if let Some(child_elem) = ElementRef::wrap(child) {
                        let id = self.push(parent, element_kind(child_elem));
                        self.convert_children(id, child_elem);
                    }
                }
                _ => {}
            }
        }
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append a new element as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.push(
            parent,
            NodeKind::Element {
                name: name.to_ascii_lowercase(),
                attrs: Vec::new(),
            },
        )
    }

    /// Append a new comment as the last child of `parent`.
    pub fn append_comment(&mut self, parent: NodeId, content: &str) -> NodeId {
        self.push(parent, NodeKind::Comment(content.to_string()))
    }

    /// Append character data at the end of `parent`'s content: to the tail
    /// of its last child, or to its own text when it has no children.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        match self.nodes[parent.0].children.last() {
            Some(&last) => self.nodes[last.0].tail.push_str(text),
            None => self.nodes[parent.0].text.push_str(text),
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena, including detached ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty (never true for a constructed tree).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Ancestors of `id`, nearest first, excluding `id`.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// `id` followed by all nodes below it, in document (pre-)order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            dom: self,
            stack: vec![id],
        }
    }

    /// Tag name for elements, `None` for comments.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Comment(_) => None,
        }
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Comment(_))
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Comment(_) => None,
        }
    }

    /// Set (or add) an attribute on an element. Comments are left unchanged.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    pub fn tail(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tail
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.0].text = text.into();
    }

    pub fn set_tail(&mut self, id: NodeId, tail: impl Into<String>) {
        self.nodes[id.0].tail = tail.into();
    }

    /// The text block a slot refers to.
    pub fn slot_text(&self, slot: TextSlot) -> &str {
        match slot {
            TextSlot::Text(id) => self.text(id),
            TextSlot::Tail(id) => self.tail(id),
        }
    }

    pub fn set_slot_text(&mut self, slot: TextSlot, text: impl Into<String>) {
        match slot {
            TextSlot::Text(id) => self.set_text(id, text),
            TextSlot::Tail(id) => self.set_tail(id, text),
        }
    }

    /// All character data below `id` (its text, descendants' text and
    /// tails), excluding `id`'s own tail and comment contents.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        if !matches!(node.kind, NodeKind::Comment(_)) {
            out.push_str(&node.text);
        }
        for &child in &node.children {
            self.collect_text(child, out);
            out.push_str(&self.nodes[child.0].tail);
        }
    }

    /// Rename elements according to `mapping` (`old name -> new name`).
    pub fn rename_tags(&mut self, mapping: &HashMap<String, String>) {
        for node in &mut self.nodes {
            if let NodeKind::Element { name, .. } = &mut node.kind {
                if let Some(new_name) = mapping.get(name.as_str()) {
                    *name = new_name.clone();
                }
            }
        }
    }

    /// Remove elements named in `names`, keeping their content: text,
    /// children and tail are spliced into the parent in place. The root is
    /// never removed.
    pub fn kill_tags(&mut self, names: &HashSet<String>) {
        let doomed: Vec<NodeId> = self
            .descendants(self.root)
            .filter(|&id| id != self.root)
            .filter(|&id| self.tag_name(id).is_some_and(|n| names.contains(n)))
            .collect();
        for id in doomed {
            self.drop_tag(id);
        }
    }

    fn drop_tag(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let Some(index) = self.nodes[parent.0].children.iter().position(|&c| c == id) else {
            return;
        };

        let text = std::mem::take(&mut self.nodes[id.0].text);
        let tail = std::mem::take(&mut self.nodes[id.0].tail);
        let children = std::mem::take(&mut self.nodes[id.0].children);

        // own text joins whatever precedes the dropped element
        match index.checked_sub(1) {
            Some(prev) => {
                let prev = self.nodes[parent.0].children[prev];
                self.nodes[prev.0].tail.push_str(&text);
            }
            None => self.nodes[parent.0].text.push_str(&text),
        }

        // tail joins the last moved child, or the same place as the text
        match children.last() {
            Some(&last) => self.nodes[last.0].tail.push_str(&tail),
            None => match index.checked_sub(1) {
                Some(prev) => {
                    let prev = self.nodes[parent.0].children[prev];
                    self.nodes[prev.0].tail.push_str(&tail);
                }
                None => self.nodes[parent.0].text.push_str(&tail),
            },
        }

        for &child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0]
            .children
            .splice(index..=index, children);
        self.nodes[id.0].parent = None;
    }

    /// Serialize the tree to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_node(self.root, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Comment(content) => {
                let _ = write!(out, "<!--{content}-->");
            }
            NodeKind::Element { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attrs {
                    let _ = write!(out, " {key}=\"{}\"", escape(value, true));
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&name.as_str()) && node.children.is_empty() {
                    out.push_str(&escape(&node.text, false));
                    return;
                }

                if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    out.push_str(&node.text);
                } else {
                    out.push_str(&escape(&node.text, false));
                }
                for &child in &node.children {
                    self.write_node(child, out);
                    out.push_str(&escape(&self.nodes[child.0].tail, false));
                }
                let _ = write!(out, "</{name}>");
            }
        }
    }
}

fn element_kind(elem: ElementRef<'_>) -> NodeKind {
    let value = elem.value();
    NodeKind::Element {
        name: value.name().to_string(),
        attrs: value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Pre-order iterator over a subtree.
#[derive(Debug)]
pub struct Descendants<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.dom.children(id).iter().rev().copied());
        Some(id)
    }
}
