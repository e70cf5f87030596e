use uuid::Uuid;

use crate::envelope::ns::{WSMAN, WSMAN_ENUM};
use crate::envelope::{EnumerateRequest, InvokeRequest, enumerate_envelope, invoke_envelope, pull_envelope};
use crate::error::{Error, Result};
use crate::return_code::{Outcome, check};
use crate::xml::Element;

pub(crate) fn message_id() -> String {
    Uuid::new_v4().to_string()
}

/// Build the envelope for an invocation.
pub(crate) fn invoke_body(to: &str, request: &InvokeRequest) -> Result<String> {
    invoke_envelope(to, request, &message_id())
}

/// Parse an invocation response and apply the request's return-code policy.
pub(crate) fn interpret_invoke(request: &InvokeRequest, body: &str) -> Result<Element> {
    let document = Element::parse(body)?;
    let outcome = check(&document, request.resource_uri(), request.policy())?;
    if outcome == Outcome::NoChange {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            method = request.method(),
            resource_uri = request.resource_uri(),
            "invocation reported nothing to change"
        );
    }
    Ok(document)
}

/// An enumeration in progress: the first page plus every pulled page merged into it.
#[derive(Debug)]
pub(crate) struct Enumeration<'r> {
    to: String,
    request: &'r EnumerateRequest,
    document: Option<Element>,
}

impl<'r> Enumeration<'r> {
    pub(crate) fn new(to: &str, request: &'r EnumerateRequest) -> Self {
        Self {
            to: to.to_owned(),
            request,
            document: None,
        }
    }

    pub(crate) fn first_envelope(&self) -> Result<String> {
        enumerate_envelope(&self.to, self.request, &message_id())
    }

    /// Take in a response page. Returns the `Pull` envelope for the next page, if any.
    ///
    /// A page that carries no items must end the sequence; otherwise paging would not
    /// make progress.
    pub(crate) fn absorb(&mut self, body: &str) -> Result<Option<String>> {
        let mut page = Element::parse(body)?;
        let next = next_context(&page);

        let received = if let Some(document) = self.document.as_mut() {
            let items = take_items(&mut page);
            let received = items.len();
            merge_items(document, items)?;
            received
        } else {
            let received = item_count(&page);
            self.document = Some(page);
            received
        };

        if next.is_some() && received == 0 {
            return Err(Error::malformed(format!(
                "enumeration of {} returned an empty page without ending the sequence",
                self.request.resource_uri()
            )));
        }

        next.map(|context| {
            pull_envelope(
                &self.to,
                self.request.resource_uri(),
                &context,
                self.request.page_size(),
                &message_id(),
            )
        })
        .transpose()
    }

    pub(crate) fn finish(self) -> Result<Element> {
        self.document
            .ok_or_else(|| Error::malformed("enumeration finished without a response"))
    }
}

/// The context to pull with, unless the page ends the sequence.
fn next_context(page: &Element) -> Option<String> {
    if page.find(WSMAN, "EndOfSequence").is_some() || page.find(WSMAN_ENUM, "EndOfSequence").is_some()
    {
        return None;
    }
    page.find(WSMAN_ENUM, "EnumerationContext")
        .map(|c| c.text().to_owned())
        .filter(|c| !c.is_empty())
}

fn item_count(page: &Element) -> usize {
    page.find(WSMAN_ENUM, "Items")
        .or_else(|| page.find(WSMAN, "Items"))
        .map_or(0, |items| items.children().len())
}

fn take_items(page: &mut Element) -> Vec<Element> {
    let namespace = if page.find(WSMAN_ENUM, "Items").is_some() {
        WSMAN_ENUM
    } else {
        WSMAN
    };
    page.find_mut(namespace, "Items")
        .map(|items| std::mem::take(items).into_children())
        .unwrap_or_default()
}

fn merge_items(document: &mut Element, items: Vec<Element>) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let target = if document.find(WSMAN, "Items").is_some() {
        document.find_mut(WSMAN, "Items")
    } else if document.find(WSMAN_ENUM, "Items").is_some() {
        document.find_mut(WSMAN_ENUM, "Items")
    } else {
        document.find_mut(WSMAN_ENUM, "EnumerateResponse")
    };
    let target = target.ok_or_else(|| Error::malformed("enumeration response has no Items"))?;
    target.extend_children(items);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/DCIM_Thing";

    fn page(first: bool, items: &str, context: Option<&str>, end: bool) -> String {
        let (wrapper, items_tag) = if first {
            ("wsen:EnumerateResponse", "wsman:Items")
        } else {
            ("wsen:PullResponse", "wsen:Items")
        };
        let context = context
            .map(|c| format!("<wsen:EnumerationContext>{c}</wsen:EnumerationContext>"))
            .unwrap_or_default();
        let end = if end {
            if first { "<wsman:EndOfSequence/>" } else { "<wsen:EndOfSequence/>" }
        } else {
            ""
        };
        format!(
            r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
                 xmlns:wsen="{WSMAN_ENUM}" xmlns:wsman="{WSMAN}" xmlns:n1="{URI}">
                 <s:Body><{wrapper}>{context}<{items_tag}>{items}</{items_tag}>{end}</{wrapper}></s:Body>
               </s:Envelope>"#
        )
    }

    fn thing(id: &str) -> String {
        format!("<n1:DCIM_Thing><n1:InstanceID>{id}</n1:InstanceID></n1:DCIM_Thing>")
    }

    #[test]
    fn single_page_needs_no_pull() {
        let request = EnumerateRequest::new(URI);
        let mut enumeration = Enumeration::new("https://host:443/wsman", &request);
        let next = enumeration
            .absorb(&page(true, &thing("a"), Some("ctx-1"), true))
            .expect("absorb");
        assert!(next.is_none());
        let doc = enumeration.finish().expect("finish");
        assert_eq!(doc.find_all(URI, "DCIM_Thing").len(), 1);
    }

    #[test]
    fn pulled_pages_are_merged_into_the_first() {
        let request = EnumerateRequest::new(URI);
        let mut enumeration = Enumeration::new("https://host:443/wsman", &request);

        let pull = enumeration
            .absorb(&page(true, &thing("a"), Some("ctx-1"), false))
            .expect("absorb")
            .expect("pull");
        assert!(pull.contains("<wsen:EnumerationContext>ctx-1</wsen:EnumerationContext>"));
        assert!(pull.contains("enumeration/Pull"));

        let next = enumeration
            .absorb(&page(false, &(thing("b") + &thing("c")), Some("ctx-2"), true))
            .expect("absorb");
        assert!(next.is_none());

        let doc = enumeration.finish().expect("finish");
        let ids: Vec<_> = doc
            .find_all(URI, "InstanceID")
            .into_iter()
            .map(Element::text)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn missing_context_ends_enumeration() {
        let request = EnumerateRequest::new(URI);
        let mut enumeration = Enumeration::new("https://host:443/wsman", &request);
        assert!(enumeration.absorb(&page(true, "", None, false)).expect("absorb").is_none());
    }

    #[test]
    fn empty_pages_that_keep_the_context_are_malformed() {
        let request = EnumerateRequest::new(URI);
        let mut enumeration = Enumeration::new("https://host:443/wsman", &request);
        let err = enumeration
            .absorb(&page(true, "", Some("ctx"), false))
            .expect_err("no progress");
        assert!(matches!(err, Error::MalformedResponse(_)));

        let mut enumeration = Enumeration::new("https://host:443/wsman", &request);
        enumeration
            .absorb(&page(true, &thing("a"), Some("ctx"), false))
            .expect("absorb")
            .expect("pull");
        let err = enumeration
            .absorb(&page(false, "", Some("ctx"), false))
            .expect_err("no progress");
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn message_ids_are_unique_uuids() {
        let a = message_id();
        assert!(Uuid::parse_str(&a).is_ok());
        assert_ne!(a, message_id());
    }
}
