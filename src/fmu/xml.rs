// src/fmu/xml.rs

//! Minimal element tree for model description documents
//!
//! The descriptor is held as a plain tagged-variant tree instead of a typed
//! schema so that vendor extensions, annotations, and attributes we know
//! nothing about survive a parse/render cycle untouched. Attribute order and
//! child order are preserved exactly; only inter-element whitespace is
//! normalized on output.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::escape::{escape, partial_escape};
use quick_xml::Reader;

/// Indentation used per nesting level when rendering
const INDENT: &str = "  ";

/// XML declaration written at the top of every rendered document
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// A node in the element tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data (unescaped, surrounding whitespace trimmed)
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// An element with ordered attributes and ordered children
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Look up an attribute value
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Iterate over child elements, skipping text and comments
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Mutable iteration over child elements
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// First child element with the given name, mutably
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// Index into `children` of the first child element named `name`
    pub fn child_position(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.name == name))
    }

    /// Return the first child element named `name`, inserting an empty one
    /// at `position` in `children` if there is none
    pub fn ensure_child(&mut self, name: &str, position: usize) -> &mut Element {
        let index = match self.child_position(name) {
            Some(index) => index,
            None => {
                let at = position.min(self.children.len());
                self.children.insert(at, Node::Element(Element::new(name)));
                at
            }
        };

        match &mut self.children[index] {
            Node::Element(element) => element,
            _ => unreachable!("child_position only yields element indices"),
        }
    }

    /// Concatenated text content of direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A parsed document: the root element plus comments and processing
/// instructions that surround it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub prolog: Vec<Node>,
    pub root: Element,
    pub epilog: Vec<Node>,
}

impl Document {
    /// Wrap a root element in a document with no prolog
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Parse a document from text
    ///
    /// Fails with [`Error::DescriptorFormat`] for anything that is not a
    /// single well-formed element tree.
    pub fn parse(input: &str) -> Result<Self> {
        let mut reader = Reader::from_str(input);
        reader.trim_text(true);

        let mut builder = TreeBuilder::default();

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::DescriptorFormat(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            })?;

            match event {
                Event::Start(start) => builder.open(element_from_start(&start)?)?,
                Event::Empty(start) => {
                    builder.attach(Node::Element(element_from_start(&start)?))?
                }
                Event::End(_) => builder.close()?,
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| Error::DescriptorFormat(e.to_string()))?;
                    builder.text(text.into_owned())?;
                }
                Event::CData(cdata) => {
                    builder.attach(Node::CData(utf8(cdata.into_inner().into_owned())?))?
                }
                Event::Comment(comment) => {
                    builder.attach(Node::Comment(utf8(comment.into_inner().into_owned())?))?
                }
                Event::PI(pi) => builder.attach(Node::ProcessingInstruction(utf8(
                    pi.into_inner().into_owned(),
                )?))?,
                Event::Decl(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        builder.finish()
    }

    /// Render with two-space indentation and a UTF-8 declaration
    pub fn to_xml_string(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push('\n');

        for node in &self.prolog {
            render_node(node, 0, &mut out);
        }
        render_element(&self.root, 0, &mut out);
        for node in &self.epilog {
            render_node(node, 0, &mut out);
        }

        out
    }
}

/// Incremental tree assembly from a flat event stream
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Element>,
    root: Option<Element>,
    prolog: Vec<Node>,
    epilog: Vec<Node>,
}

impl TreeBuilder {
    fn open(&mut self, element: Element) -> Result<()> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(Error::DescriptorFormat(format!(
                "unexpected second root element <{}>",
                element.name
            )));
        }
        self.stack.push(element);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let element = self
            .stack
            .pop()
            .ok_or_else(|| Error::DescriptorFormat("unbalanced closing tag".to_string()))?;
        self.attach(Node::Element(element))
    }

    fn text(&mut self, text: String) -> Result<()> {
        if self.stack.is_empty() {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(Error::DescriptorFormat(format!(
                "text outside the root element: {:?}",
                text
            )));
        }
        self.attach(Node::Text(text))
    }

    fn attach(&mut self, node: Node) -> Result<()> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }

        match node {
            Node::Element(element) => {
                if self.root.is_some() {
                    return Err(Error::DescriptorFormat(format!(
                        "unexpected second root element <{}>",
                        element.name
                    )));
                }
                self.root = Some(element);
            }
            Node::Text(_) | Node::CData(_) => {
                return Err(Error::DescriptorFormat(
                    "character data outside the root element".to_string(),
                ));
            }
            other if self.root.is_none() => self.prolog.push(other),
            other => self.epilog.push(other),
        }
        Ok(())
    }

    fn finish(self) -> Result<Document> {
        if let Some(open) = self.stack.last() {
            return Err(Error::DescriptorFormat(format!(
                "unclosed element <{}>",
                open.name
            )));
        }
        let root = self
            .root
            .ok_or_else(|| Error::DescriptorFormat("document has no root element".to_string()))?;

        Ok(Document {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| Error::DescriptorFormat(e.to_string()))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| Error::DescriptorFormat(e.to_string()))?
        .to_string();

    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::DescriptorFormat(format!("<{}>: {}", element.name, e)))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::DescriptorFormat(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::DescriptorFormat(format!("<{}> {}: {}", element.name, key, e)))?
            .into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

/// Escape an attribute value, including whitespace that attribute-value
/// normalization would otherwise fold into spaces
fn escape_attr(value: &str) -> String {
    escape(value)
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;")
}

fn push_indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn render_node(node: &Node, level: usize, out: &mut String) {
    match node {
        Node::Element(element) => render_element(element, level, out),
        Node::Text(text) => {
            push_indent(level, out);
            out.push_str(&partial_escape(text.as_str()));
            out.push('\n');
        }
        Node::CData(data) => {
            push_indent(level, out);
            out.push_str("<![CDATA[");
            out.push_str(data);
            out.push_str("]]>\n");
        }
        Node::Comment(comment) => {
            push_indent(level, out);
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->\n");
        }
        Node::ProcessingInstruction(pi) => {
            push_indent(level, out);
            out.push_str("<?");
            out.push_str(pi);
            out.push_str("?>\n");
        }
    }
}

fn render_element(element: &Element, level: usize, out: &mut String) {
    push_indent(level, out);
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }

    if element.children.is_empty() {
        out.push_str("/>\n");
        return;
    }

    // Pure text content stays on one line so no whitespace leaks into it
    if let [Node::Text(text)] = element.children.as_slice() {
        out.push('>');
        out.push_str(&partial_escape(text.as_str()));
        out.push_str("</");
        out.push_str(&element.name);
        out.push_str(">\n");
        return;
    }

    out.push_str(">\n");
    for child in &element.children {
        render_node(child, level + 1, out);
    }
    push_indent(level, out);
    out.push_str("</");
    out.push_str(&element.name);
    out.push_str(">\n");
}
