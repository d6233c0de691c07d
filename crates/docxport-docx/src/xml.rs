//! Minimal XML tree for OOXML parts.
//!
//! Parts are parsed into [`XmlNode`] trees that keep element order,
//! attribute order and namespace declarations so that content the engine
//! does not understand is written back unchanged.

use std::fmt::Write;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::XmlError;

/// Declaration written at the top of every serialized part.
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Elements dropped while parsing. Spell/grammar markers would otherwise
/// split text runs.
const DROPPED_ELEMENTS: &[&str] = &["w:proofErr"];

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Qualified name, e.g. `w:p`.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlChild>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlChild {
    Element(XmlNode),
    Text(String),
}

impl XmlNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child element.
    #[must_use]
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(XmlChild::Element(child));
        self
    }

    /// Builder-style text child.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlChild::Text(text.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.attrs.push((key, value));
        }
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attrs.retain(|(k, _)| k != key);
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter_map(|child| match child {
            XmlChild::Element(node) => Some(node),
            XmlChild::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlNode> {
        self.children.iter_mut().filter_map(|child| match child {
            XmlChild::Element(node) => Some(node),
            XmlChild::Text(_) => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.elements().find(|node| node.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlNode> {
        self.elements_mut().find(|node| node.name == name)
    }

    /// Attribute of the first child element with the given name.
    pub fn child_attr(&self, name: &str, key: &str) -> Option<&str> {
        self.child(name).and_then(|child| child.attr(key))
    }

    /// Remove every child element with the given name.
    pub fn remove_children(&mut self, name: &str) {
        self.children
            .retain(|child| !matches!(child, XmlChild::Element(node) if node.name == name));
    }

    /// Concatenated text of this element and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Return the child element `name`, inserting it at the position given by
    /// `schema_order` when absent. Names missing from `schema_order` sort last.
    pub fn ensure_child_ordered(&mut self, name: &str, schema_order: &[&str]) -> &mut XmlNode {
        let index = if let Some(index) = self.position_of(name) {
            index
        } else {
            let rank = rank_of(name, schema_order);
            let insert_at = self
                .children
                .iter()
                .position(|child| match child {
                    XmlChild::Element(node) => rank_of(&node.name, schema_order) > rank,
                    XmlChild::Text(_) => false,
                })
                .unwrap_or(self.children.len());
            self.children
                .insert(insert_at, XmlChild::Element(XmlNode::new(name)));
            insert_at
        };
        match &mut self.children[index] {
            XmlChild::Element(node) => node,
            XmlChild::Text(_) => unreachable!("position_of only returns elements"),
        }
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|child| matches!(child, XmlChild::Element(node) if node.name == name))
    }

    /// Whether the element has neither attributes nor children.
    pub fn is_bare(&self) -> bool {
        self.attrs.is_empty() && self.children.is_empty()
    }
}

fn rank_of(name: &str, schema_order: &[&str]) -> usize {
    schema_order
        .iter()
        .position(|candidate| *candidate == name)
        .unwrap_or(schema_order.len())
}

fn collect_text(node: &XmlNode, out: &mut String) {
    for child in &node.children {
        match child {
            XmlChild::Element(element) => collect_text(element, out),
            XmlChild::Text(text) => out.push_str(text),
        }
    }
}

/// Parse an XML part into its root element.
pub fn parse(bytes: &[u8]) -> Result<XmlNode, XmlError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                stack.push(start_node(&reader, &e)?);
            }
            Event::Empty(e) => {
                let node = start_node(&reader, &e)?;
                attach(&mut stack, &mut root, node);
            }
            Event::End(_) => {
                if let Some(mut node) = stack.pop() {
                    drop_layout_whitespace(&mut node);
                    attach(&mut stack, &mut root, node);
                }
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                push_text(&mut stack, &text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                push_text(&mut stack, &decode_entity(&entity));
            }
            Event::CData(e) => {
                push_text(&mut stack, &String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }

    root.ok_or(XmlError::NoRoot)
}

fn start_node(reader: &Reader<&[u8]>, e: &BytesStart) -> Result<XmlNode, XmlError> {
    let name = reader.decoder().decode(e.name().as_ref())?.into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            std::borrow::Cow::into_owned,
        );
        attrs.push((key, value));
    }
    Ok(XmlNode {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    if DROPPED_ELEMENTS.contains(&node.name.as_str()) {
        return;
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlChild::Element(node)),
        None => *root = Some(node),
    }
}

fn push_text(stack: &mut [XmlNode], text: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(XmlChild::Text(existing)) = parent.children.last_mut() {
        existing.push_str(text);
    } else {
        parent.children.push(XmlChild::Text(text.to_owned()));
    }
}

/// Whitespace between child elements is indentation, not content.
fn drop_layout_whitespace(node: &mut XmlNode) {
    let has_elements = node
        .children
        .iter()
        .any(|child| matches!(child, XmlChild::Element(_)));
    if has_elements {
        node.children
            .retain(|child| !matches!(child, XmlChild::Text(text) if text.trim().is_empty()));
    }
}

/// Decode XML entity references to their character values.
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        s if s.starts_with('#') => {
            let code = if let Some(hex) = s.strip_prefix("#x").or_else(|| s.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        _ => format!("&{entity};"),
    }
}

/// Serialize a root element as a standalone XML part.
pub fn serialize(root: &XmlNode) -> Vec<u8> {
    let mut out = String::with_capacity(4096);
    out.push_str(XML_DECLARATION);
    out.push_str("\r\n");
    serialize_node(root, &mut out);
    out.into_bytes()
}

fn serialize_node(node: &XmlNode, out: &mut String) {
    out.push('<');
    out.push_str(&node.name);
    for (key, value) in &node.attrs {
        // Writing into a String cannot fail.
        let _ = write!(out, r#" {key}="{}""#, escape_xml(value, true));
    }

    if node.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in &node.children {
        match child {
            XmlChild::Element(element) => serialize_node(element, out),
            XmlChild::Text(text) => out.push_str(&escape_xml(text, false)),
        }
    }
    let _ = write!(out, "</{}>", node.name);
}

/// Escape XML special characters.
fn escape_xml(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            '\'' if escape_quotes => result.push_str("&apos;"),
            _ => result.push(ch),
        }
    }
    result
}
