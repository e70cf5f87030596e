//! Owned, namespace-resolved XML element tree.
//!
//! WS-Man responses are small, so the whole body is parsed eagerly into a tree of
//! [`Element`]s. Element and attribute names are stored as local names; elements keep
//! the namespace URI their prefix resolved to. Attributes drop their namespace, which
//! is enough for the shapes the controller emits (`Name="InstanceID"`, `xsi:nil`).

use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::{Error, Result};

/// A parsed XML element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    namespace: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// Parse a complete XML document and return its root element.
    pub fn parse(input: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            let (resolved, event) = reader.read_resolved_event()?;
            let namespace = resolve_namespace(resolved)?;

            match event {
                Event::Start(start) => stack.push(Self::from_start(namespace, &start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(namespace, &start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::malformed("unbalanced end tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::malformed("unterminated element"));
        }
        root.ok_or_else(|| Error::malformed("document has no root element"))
    }

    fn from_start(namespace: Option<String>, start: &BytesStart<'_>) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((name, value));
        }

        Ok(Self {
            namespace,
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    /// Namespace URI of this element, if it is qualified.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Local name of this element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text content directly inside this element, with surrounding whitespace trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Value of the attribute with the given local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Whether the element is marked `xsi:nil="true"`.
    pub fn is_nil(&self) -> bool {
        self.attribute("nil") == Some("true")
    }

    /// Whether this element has the given namespace and local name.
    pub fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }

    /// First direct child with the given namespace and local name.
    pub fn child(&self, namespace: Option<&str>, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// First descendant (depth-first, document order) with the given qualified name.
    pub fn find(&self, namespace: &str, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| {
            if child.is(Some(namespace), name) {
                Some(child)
            } else {
                child.find(namespace, name)
            }
        })
    }

    /// All descendants with the given qualified name, in document order.
    pub fn find_all(&self, namespace: &str, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect(namespace, name, &mut out);
        out
    }

    fn collect<'a>(&'a self, namespace: &str, name: &str, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.is(Some(namespace), name) {
                out.push(child);
            }
            child.collect(namespace, name, out);
        }
    }

    pub(crate) fn find_mut(&mut self, namespace: &str, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|child| {
            if child.is(Some(namespace), name) {
                Some(child)
            } else {
                child.find_mut(namespace, name)
            }
        })
    }

    pub(crate) fn into_children(self) -> Vec<Element> {
        self.children
    }

    pub(crate) fn extend_children(&mut self, children: impl IntoIterator<Item = Element>) {
        self.children.extend(children);
    }
}

impl FromStr for Element {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn resolve_namespace(resolved: ResolveResult<'_>) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(Namespace(ns)) => Ok(Some(String::from_utf8_lossy(ns).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(Error::malformed(format!(
            "undeclared namespace prefix `{}`",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::malformed("document has more than one root element")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="urn:soap" xmlns:n1="http://resource"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <s:Body>
    <n1:Item><n1:Name>first</n1:Name></n1:Item>
    <n1:Item>
      <n1:Name> second &amp; last </n1:Name>
      <n1:Pending xsi:nil="true"/>
    </n1:Item>
    <plain Name="InstanceID">JID_1</plain>
  </s:Body>
</s:Envelope>"#;

    #[test]
    fn resolves_namespaces_and_text() {
        let root = Element::parse(DOC).expect("parse");
        assert!(root.is(Some("urn:soap"), "Envelope"));

        let names: Vec<_> = root
            .find_all("http://resource", "Name")
            .into_iter()
            .map(Element::text)
            .collect();
        assert_eq!(names, vec!["first", "second & last"]);
    }

    #[test]
    fn find_returns_first_match_in_document_order() {
        let root = Element::parse(DOC).expect("parse");
        let item = root.find("http://resource", "Item").expect("item");
        assert_eq!(
            item.child(Some("http://resource"), "Name").map(Element::text),
            Some("first")
        );
    }

    #[test]
    fn nil_and_unqualified_attributes() {
        let root = Element::parse(DOC).expect("parse");
        let pending = root.find("http://resource", "Pending").expect("pending");
        assert!(pending.is_nil());
        assert_eq!(pending.text(), "");

        let body = root.child(Some("urn:soap"), "Body").expect("body");
        let plain = body.child(None, "plain").expect("plain");
        assert_eq!(plain.attribute("Name"), Some("InstanceID"));
        assert_eq!(plain.text(), "JID_1");
    }

    #[test]
    fn rejects_undeclared_prefix() {
        let err = Element::parse("<a:root/>").expect_err("undeclared prefix");
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn rejects_unbalanced_document() {
        assert!(Element::parse("<root><child></root>").is_err());
        assert!(Element::parse("").is_err());
    }
}
