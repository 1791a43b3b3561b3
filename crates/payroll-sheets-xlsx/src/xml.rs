//! Minimal element tree for the worksheet fragments we rewrite
//!
//! Names are kept exactly as written in the source part (including any
//! namespace prefix) so a serialized fragment drops back into the original
//! text without new namespace declarations.

use std::fmt::Write as _;

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};

/// A node inside an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Child element
    Element(XmlElement),
    /// Unescaped character data
    Text(String),
    /// Comment or CDATA section, re-emitted verbatim
    Raw(String),
}

/// An element with its qualified name, ordered attributes and children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name as written (`row`, `x:row`)
    pub name: String,
    /// Attributes in source order, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Child nodes in source order
    pub children: Vec<XmlNode>,
}

/// Part of a qualified name after the prefix
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Prefix of a qualified name including the colon (`"x:"`), or `""`
pub fn name_prefix(name: &str) -> &str {
    name.rsplit_once(':')
        .map_or("", |(prefix, _)| &name[..prefix.len() + 1])
}

impl XmlElement {
    /// Create an empty element
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Local name (without prefix)
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Get an attribute value
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position when it already exists
    pub fn set_attr<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Remove an attribute, returning its value
    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(index).1)
    }

    /// Child elements
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Mutable child elements
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given local name
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local_name() == local)
    }

    /// First mutable child element with the given local name
    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.local_name() == local)
    }

    /// Remove every child element whose local name is in `locals`
    pub fn remove_children(&mut self, locals: &[&str]) {
        self.children.retain(|node| match node {
            XmlNode::Element(e) => !locals.contains(&e.local_name()),
            _ => true,
        });
    }

    /// Append a child element
    pub fn push(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    /// Concatenated text of this element's direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Concatenated text of every descendant `<t>` element
    pub fn descendant_text(&self, local: &str) -> String {
        let mut out = String::new();
        self.collect_text(local, &mut out);
        out
    }

    fn collect_text(&self, local: &str, out: &mut String) {
        for e in self.elements() {
            if e.local_name() == local {
                out.push_str(&e.text());
            } else {
                e.collect_text(local, out);
            }
        }
    }

    /// Replace all children with a single text node
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.children = vec![XmlNode::Text(text.into())];
    }

    /// Drop text nodes that contain only whitespace
    pub fn strip_whitespace(&mut self) {
        self.children
            .retain(|node| !matches!(node, XmlNode::Text(t) if t.trim().is_empty()));
    }

    /// Parse the first element of an XML fragment
    ///
    /// The fragment may use prefixes whose declarations live outside it.
    pub fn parse(text: &str) -> XlsxResult<Self> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(false);
        reader.expand_empty_elements(false);

        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(element_from_start(&e)?),
                Event::Empty(e) => {
                    let element = element_from_start(&e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.push(element),
                        None => return Ok(element),
                    }
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XlsxError::Parse("unbalanced end tag".into()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.push(element),
                        None => return Ok(element),
                    }
                }
                Event::Text(t) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(t.unescape()?.into_owned()));
                    }
                }
                Event::CData(c) => {
                    if let Some(parent) = stack.last_mut() {
                        let raw = format!("<![CDATA[{}]]>", String::from_utf8_lossy(&c));
                        parent.children.push(XmlNode::Raw(raw));
                    }
                }
                Event::Comment(c) => {
                    if let Some(parent) = stack.last_mut() {
                        let raw = format!("<!--{}-->", String::from_utf8_lossy(&c));
                        parent.children.push(XmlNode::Raw(raw));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Err(XlsxError::Parse("fragment contains no complete element".into()))
    }

    /// Serialize this element
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    /// Serialize this element into `out`
    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", key, escape(value.as_str()));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_to(out),
                XmlNode::Text(t) => out.push_str(&partial_escape(t.as_str())),
                XmlNode::Raw(r) => out.push_str(r),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn element_from_start(start: &BytesStart<'_>) -> XlsxResult<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_and_serialize() {
        let text = r#"<x:row r="5" spans="1:17"><x:c r="B5" t="s"><x:v>3</x:v></x:c><x:c r="D5"><x:f>SUM(K5:O5)</x:f></x:c></x:row>"#;
        let row = XmlElement::parse(text).unwrap();
        assert_eq!(row.name, "x:row");
        assert_eq!(row.local_name(), "row");
        assert_eq!(row.attr("r"), Some("5"));
        assert_eq!(row.elements().count(), 2);
        assert_eq!(row.to_xml(), text);
    }

    #[test]
    fn test_escaping_round_trip() {
        let text = r#"<c r="B1"><f>IF(C1&gt;0,"A &amp; B","")</f></c>"#;
        let cell = XmlElement::parse(text).unwrap();
        assert_eq!(cell.child("f").unwrap().text(), r#"IF(C1>0,"A & B","")"#);
        assert_eq!(cell.to_xml(), text);
    }

    #[test]
    fn test_empty_elements_collapse() {
        let cell = XmlElement::parse(r#"<c r="A1" s="2"></c>"#).unwrap();
        assert_eq!(cell.to_xml(), r#"<c r="A1" s="2"/>"#);
    }

    #[test]
    fn test_descendant_text() {
        let si = XmlElement::parse("<si><r><t>Maria </t></r><r><t>Lopez</t></r></si>").unwrap();
        assert_eq!(si.descendant_text("t"), "Maria Lopez");
    }

    #[test]
    fn test_prefix_helpers() {
        assert_eq!(name_prefix("x:sheetData"), "x:");
        assert_eq!(name_prefix("sheetData"), "");
        assert_eq!(local_name("x:sheetData"), "sheetData");
    }

    #[test]
    fn test_attribute_editing() {
        let mut e = XmlElement::new("row");
        e.set_attr("r", "1");
        e.set_attr("hidden", "1");
        e.set_attr("r", "2");
        assert_eq!(e.attributes[0], ("r".to_string(), "2".to_string()));
        assert_eq!(e.remove_attr("hidden"), Some("1".to_string()));
        assert_eq!(e.remove_attr("hidden"), None);
    }
}
