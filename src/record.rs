//! Field-map driven extraction of CIM instances into records.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::xml::Element;

#[derive(Debug, Clone, Copy)]
enum Presence {
    Required,
    Optional(&'static str),
    Repeated,
}

/// One property of a CIM class, keyed by its XML element name.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Field {
    element: &'static str,
    presence: Presence,
}

impl Field {
    pub(crate) const fn required(element: &'static str) -> Self {
        Self {
            element,
            presence: Presence::Required,
        }
    }

    pub(crate) const fn optional(element: &'static str, default: &'static str) -> Self {
        Self {
            element,
            presence: Presence::Optional(default),
        }
    }

    /// Zero or more repeated elements.
    pub(crate) const fn repeated(element: &'static str) -> Self {
        Self {
            element,
            presence: Presence::Repeated,
        }
    }
}

/// Field map for one CIM class.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldMap {
    class: &'static str,
    resource_uri: &'static str,
    fields: &'static [Field],
}

impl FieldMap {
    pub(crate) const fn new(
        class: &'static str,
        resource_uri: &'static str,
        fields: &'static [Field],
    ) -> Self {
        Self {
            class,
            resource_uri,
            fields,
        }
    }

    /// Every instance element of this class in the document.
    pub(crate) fn instances<'a>(&self, doc: &'a Element) -> Vec<&'a Element> {
        doc.find_all(self.resource_uri, self.class)
    }

    pub(crate) fn extract<'a>(&self, instance: &'a Element) -> Result<Fields<'a>> {
        let mut values = Vec::with_capacity(self.fields.len());

        for field in self.fields {
            let present: Vec<&'a str> = instance
                .children()
                .iter()
                .filter(|c| c.is(Some(self.resource_uri), field.element) && !c.is_nil())
                .map(Element::text)
                .collect();

            let resolved = match field.presence {
                Presence::Repeated => present,
                _ if !present.is_empty() => present,
                Presence::Optional(default) => vec![default],
                Presence::Required => {
                    return Err(Error::malformed(format!(
                        "{} instance is missing required field {}",
                        self.class, field.element
                    )));
                }
            };
            values.push((field.element, resolved));
        }

        Ok(Fields {
            class: self.class,
            values,
        })
    }

    /// Parse every instance in the document with `build`.
    pub(crate) fn parse_all<T>(
        &self,
        doc: &Element,
        build: impl Fn(&Fields<'_>) -> Result<T>,
    ) -> Result<Vec<T>> {
        self.instances(doc)
            .into_iter()
            .map(|instance| build(&self.extract(instance)?))
            .collect()
    }

    /// Parse the first instance in the document, if any.
    pub(crate) fn parse_first<T>(
        &self,
        doc: &Element,
        build: impl Fn(&Fields<'_>) -> Result<T>,
    ) -> Result<Option<T>> {
        self.instances(doc)
            .first()
            .map(|instance| build(&self.extract(instance)?))
            .transpose()
    }
}

/// Extracted values of one instance.
#[derive(Debug)]
pub(crate) struct Fields<'a> {
    class: &'static str,
    values: Vec<(&'static str, Vec<&'a str>)>,
}

impl<'a> Fields<'a> {
    /// First value of a declared field.
    pub(crate) fn get(&self, element: &str) -> &'a str {
        self.list(element).first().copied().unwrap_or_default()
    }

    /// All values of a declared field.
    pub(crate) fn list(&self, element: &str) -> &[&'a str] {
        self.values
            .iter()
            .find(|(name, _)| *name == element)
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn string(&self, element: &str) -> String {
        self.get(element).to_owned()
    }

    pub(crate) fn parse<T: FromStr>(&self, element: &str) -> Result<T> {
        let raw = self.get(element);
        raw.trim().parse().map_err(|_| {
            Error::malformed(format!(
                "{}.{} has unparsable value {raw:?}",
                self.class, element
            ))
        })
    }

    /// Parse a field when present and non-empty.
    pub(crate) fn parse_opt<T: FromStr>(&self, element: &str) -> Result<Option<T>> {
        if self.get(element).trim().is_empty() {
            return Ok(None);
        }
        self.parse(element).map(Some)
    }
}

/// Text of the first `{resource_uri}element` anywhere in the document.
pub(crate) fn require_text<'a>(doc: &'a Element, resource_uri: &str, element: &str) -> Result<&'a str> {
    doc.find(resource_uri, element)
        .map(|e| e.text().trim())
        .ok_or_else(|| Error::malformed(format!("response has no {element} element")))
}
