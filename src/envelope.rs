//! WS-Management request envelopes.
//!
//! Three envelope shapes are produced: `Enumerate`, `Pull` and method invocation.
//! All of them share the same addressing header; invocations additionally carry a
//! `wsman:SelectorSet` identifying the target instance.

use std::collections::BTreeMap;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Error, Result};
use crate::return_code::ReturnPolicy;
use crate::xml::Element;

pub(crate) mod ns {
    pub(crate) const SOAP_ENV: &str = "http://www.w3.org/2003/05/soap-envelope";
    pub(crate) const WS_ADDR: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
    pub(crate) const WS_ADDR_ANONYMOUS: &str =
        "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";
    pub(crate) const WSMAN: &str = "http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd";
    pub(crate) const WSMAN_ENUM: &str = "http://schemas.xmlsoap.org/ws/2004/09/enumeration";
    pub(crate) const WQL_DIALECT: &str = "http://schemas.microsoft.com/wbem/wsman/1/WQL";
}

/// Default number of items requested per enumeration page.
pub const DEFAULT_MAX_ELEMENTS: u32 = 100;

/// A WS-Man `Enumerate` request for one CIM class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerateRequest {
    resource_uri: String,
    filter_query: Option<String>,
    max_elements: u32,
}

impl EnumerateRequest {
    /// Enumerate every instance of the class behind `resource_uri`.
    pub fn new(resource_uri: impl Into<String>) -> Self {
        Self {
            resource_uri: resource_uri.into(),
            filter_query: None,
            max_elements: DEFAULT_MAX_ELEMENTS,
        }
    }

    /// Restrict the enumeration with a WQL query.
    pub fn filter(mut self, query: impl Into<String>) -> Self {
        self.filter_query = Some(query.into());
        self
    }

    /// Number of items requested per page.
    pub fn max_elements(mut self, max_elements: u32) -> Self {
        self.max_elements = max_elements.max(1);
        self
    }

    /// Resource URI of the enumerated class.
    pub fn resource_uri(&self) -> &str {
        &self.resource_uri
    }

    /// WQL filter, if any.
    pub fn filter_query(&self) -> Option<&str> {
        self.filter_query.as_deref()
    }

    pub(crate) fn page_size(&self) -> u32 {
        self.max_elements
    }
}

/// Value of a method parameter. Lists are sent as repeated elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// A single value.
    Single(String),
    /// Several values for the same parameter.
    List(Vec<String>),
}

impl PropertyValue {
    /// Values in the order they are serialized.
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for PropertyValue {
    fn from(values: &[&str]) -> Self {
        Self::List(values.iter().map(|v| (*v).to_owned()).collect())
    }
}

/// A WS-Man method invocation on one CIM instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest {
    resource_uri: String,
    method: String,
    selectors: BTreeMap<String, String>,
    properties: BTreeMap<String, PropertyValue>,
    policy: ReturnPolicy,
}

impl InvokeRequest {
    /// Invoke `method` on the class behind `resource_uri`.
    pub fn new(resource_uri: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            resource_uri: resource_uri.into(),
            method: method.into(),
            selectors: BTreeMap::new(),
            properties: BTreeMap::new(),
            policy: ReturnPolicy::default(),
        }
    }

    /// Add a selector identifying the target instance. A repeated key replaces the value.
    pub fn selector(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.selectors.insert(key.into(), value.into());
        self
    }

    /// Add a method parameter. A repeated key replaces the value.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Return code the controller must answer with for the call to succeed.
    pub fn expect_return_value(mut self, code: impl Into<String>) -> Self {
        self.policy = self.policy.expect(code);
        self
    }

    /// Return code meaning "nothing to change" for this method, treated as success.
    pub fn no_change_code(mut self, code: impl Into<String>) -> Self {
        self.policy = self.policy.no_change(code);
        self
    }

    /// Resource URI of the target class.
    pub fn resource_uri(&self) -> &str {
        &self.resource_uri
    }

    /// Method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Selectors identifying the target instance.
    pub fn selectors(&self) -> &BTreeMap<String, String> {
        &self.selectors
    }

    /// Method parameters.
    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    /// Expected return code, if one was declared.
    pub fn expected_return_value(&self) -> Option<&str> {
        self.policy.expected()
    }

    /// Return-code policy applied to the response.
    pub fn policy(&self) -> &ReturnPolicy {
        &self.policy
    }

    pub(crate) fn action(&self) -> String {
        format!("{}/{}", self.resource_uri, self.method)
    }
}

pub(crate) fn enumerate_envelope(
    to: &str,
    request: &EnumerateRequest,
    message_id: &str,
) -> Result<String> {
    let mut w = EnvelopeWriter::new();
    let action = format!("{}/Enumerate", ns::WSMAN_ENUM);
    w.header(to, &request.resource_uri, message_id, &action, None)?;

    w.start("s:Body", &[])?;
    w.start("wsen:Enumerate", &[])?;
    w.empty("wsman:OptimizeEnumeration")?;
    w.text_element(
        "wsman:MaxElements",
        &[],
        &request.max_elements.to_string(),
    )?;
    if let Some(query) = &request.filter_query {
        w.text_element("wsman:Filter", &[("Dialect", ns::WQL_DIALECT)], query)?;
    }
    w.end("wsen:Enumerate")?;
    w.end("s:Body")?;

    w.finish()
}

pub(crate) fn pull_envelope(
    to: &str,
    resource_uri: &str,
    context: &str,
    max_elements: u32,
    message_id: &str,
) -> Result<String> {
    let mut w = EnvelopeWriter::new();
    let action = format!("{}/Pull", ns::WSMAN_ENUM);
    w.header(to, resource_uri, message_id, &action, None)?;

    w.start("s:Body", &[])?;
    w.start("wsen:Pull", &[])?;
    w.text_element("wsen:EnumerationContext", &[], context)?;
    w.text_element("wsen:MaxElements", &[], &max_elements.to_string())?;
    w.end("wsen:Pull")?;
    w.end("s:Body")?;

    w.finish()
}

pub(crate) fn invoke_envelope(to: &str, request: &InvokeRequest, message_id: &str) -> Result<String> {
    let mut w = EnvelopeWriter::new();
    w.header(
        to,
        &request.resource_uri,
        message_id,
        &request.action(),
        Some(&request.selectors),
    )?;

    let input = format!("p:{}_INPUT", request.method);
    w.start("s:Body", &[])?;
    w.start(&input, &[("xmlns:p", request.resource_uri.as_str())])?;
    for (key, value) in &request.properties {
        let element = format!("p:{key}");
        for v in value.values() {
            w.text_element(&element, &[], v)?;
        }
    }
    w.end(&input)?;
    w.end("s:Body")?;

    w.finish()
}

/// Extract the human-readable reason from a SOAP fault body.
pub(crate) fn fault_reason(body: &str) -> Option<String> {
    let doc = Element::parse(body).ok()?;
    let fault = doc.find(ns::SOAP_ENV, "Fault")?;
    let text = fault
        .find(ns::SOAP_ENV, "Reason")
        .and_then(|reason| reason.find(ns::SOAP_ENV, "Text"))
        .or_else(|| fault.find(ns::WSMAN, "FaultDetail"))?;
    Some(text.text().to_owned()).filter(|t| !t.is_empty())
}

struct EnvelopeWriter {
    writer: Writer<Vec<u8>>,
}

impl EnvelopeWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn header(
        &mut self,
        to: &str,
        resource_uri: &str,
        message_id: &str,
        action: &str,
        selectors: Option<&BTreeMap<String, String>>,
    ) -> Result<()> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.start(
            "s:Envelope",
            &[
                ("xmlns:s", ns::SOAP_ENV),
                ("xmlns:wsa", ns::WS_ADDR),
                ("xmlns:wsman", ns::WSMAN),
                ("xmlns:wsen", ns::WSMAN_ENUM),
            ],
        )?;

        let must = [("s:mustUnderstand", "true")];
        self.start("s:Header", &[])?;
        self.text_element("wsa:To", &must, to)?;
        self.text_element("wsman:ResourceURI", &must, resource_uri)?;
        self.text_element("wsa:MessageID", &must, &format!("uuid:{message_id}"))?;
        self.start("wsa:ReplyTo", &[])?;
        self.text_element("wsa:Address", &[], ns::WS_ADDR_ANONYMOUS)?;
        self.end("wsa:ReplyTo")?;
        self.text_element("wsa:Action", &must, action)?;
        if let Some(selectors) = selectors.filter(|s| !s.is_empty()) {
            self.start("wsman:SelectorSet", &[])?;
            for (name, value) in selectors {
                self.text_element("wsman:Selector", &[("Name", name.as_str())], value)?;
            }
            self.end("wsman:SelectorSet")?;
        }
        self.end("s:Header")
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.write(Event::Start(start))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str) -> Result<()> {
        self.write(Event::Empty(BytesStart::new(name)))
    }

    fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::invalid(format!("cannot encode envelope: {e}")))
    }

    fn finish(mut self) -> Result<String> {
        self.end("s:Envelope")?;
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| Error::invalid(format!("envelope is not valid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TO: &str = "https://1.2.3.4:443/wsman";
    const ID: &str = "00000000-0000-0000-0000-000000000000";

    #[test]
    fn invoke_envelope_carries_selectors_and_repeated_properties() {
        let request = InvokeRequest::new("http://resource", "Foo")
            .selector("InstanceID", "IPL")
            .property("source", vec!["foo", "bar", "baz"])
            .property("Target", "BIOS.Setup.1-1");

        let body = invoke_envelope(TO, &request, ID).expect("envelope");
        let doc = Element::parse(&body).expect("parse");

        let action = doc.find(ns::WS_ADDR, "Action").expect("action");
        assert_eq!(action.text(), "http://resource/Foo");
        assert_eq!(
            doc.find(ns::WS_ADDR, "MessageID").map(Element::text),
            Some("uuid:00000000-0000-0000-0000-000000000000")
        );

        let selector = doc.find(ns::WSMAN, "Selector").expect("selector");
        assert_eq!(selector.attribute("Name"), Some("InstanceID"));
        assert_eq!(selector.text(), "IPL");

        let input = doc.find("http://resource", "Foo_INPUT").expect("input");
        let sources: Vec<_> = input
            .find_all("http://resource", "source")
            .into_iter()
            .map(Element::text)
            .collect();
        assert_eq!(sources, vec!["foo", "bar", "baz"]);
        assert_eq!(
            input.find("http://resource", "Target").map(Element::text),
            Some("BIOS.Setup.1-1")
        );
    }

    #[test]
    fn enumerate_envelope_escapes_filter_query() {
        let request = EnumerateRequest::new("http://resource")
            .filter(r#"select * from X where Name != "a<b""#);
        let body = enumerate_envelope(TO, &request, ID).expect("envelope");
        assert!(body.contains("&lt;"));

        let doc = Element::parse(&body).expect("parse");
        let filter = doc.find(ns::WSMAN, "Filter").expect("filter");
        assert_eq!(filter.attribute("Dialect"), Some(ns::WQL_DIALECT));
        assert_eq!(filter.text(), r#"select * from X where Name != "a<b""#);
        assert!(doc.find(ns::WSMAN, "OptimizeEnumeration").is_some());
        assert_eq!(
            doc.find(ns::WSMAN, "MaxElements").map(Element::text),
            Some("100")
        );
    }

    #[test]
    fn pull_envelope_carries_context() {
        let body = pull_envelope(TO, "http://resource", "ctx-1", 50, ID).expect("envelope");
        let doc = Element::parse(&body).expect("parse");
        assert_eq!(
            doc.find(ns::WSMAN_ENUM, "EnumerationContext")
                .map(Element::text),
            Some("ctx-1")
        );
        assert_eq!(
            doc.find(ns::WS_ADDR, "Action").map(Element::text),
            Some("http://schemas.xmlsoap.org/ws/2004/09/enumeration/Pull")
        );
    }

    #[test]
    fn fault_reason_is_extracted() {
        let body = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope">
  <s:Body><s:Fault>
    <s:Code><s:Value>s:Sender</s:Value></s:Code>
    <s:Reason><s:Text xml:lang="en">The action is not supported by the service.</s:Text></s:Reason>
  </s:Fault></s:Body></s:Envelope>"#;
        assert_eq!(
            fault_reason(body).as_deref(),
            Some("The action is not supported by the service.")
        );
        assert_eq!(fault_reason("not xml"), None);
    }
}
