//! Return-code policy for method invocations.
//!
//! The controller signals operation-level success in the response body through a
//! `ReturnValue` element qualified with the invoked class' resource URI. HTTP status is
//! not involved.

use crate::error::{Error, Result};
use crate::xml::Element;

/// Method completed.
pub const RET_SUCCESS: &str = "0";
/// Method failed; `Message` explains why.
pub const RET_ERROR: &str = "2";
/// Method accepted and created a job.
pub const RET_CREATED: &str = "4096";

/// Return codes that always mean the remote operation failed.
const FAILURE_CODES: &[&str] = &[RET_ERROR];

/// How an invocation's return code was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The code matched the expected value, or no value was expected.
    Success,
    /// The code is a declared "nothing to change" code for this method.
    NoChange,
    /// The code is a known failure code.
    Failed,
    /// The code is neither expected nor known.
    Unexpected,
}

/// Expected return code plus the method-specific no-op codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnPolicy {
    expected: Option<String>,
    no_change: Vec<String>,
}

impl ReturnPolicy {
    /// Policy requiring `code`.
    pub fn expecting(code: impl Into<String>) -> Self {
        Self::default().expect(code)
    }

    /// Require `code`.
    pub fn expect(mut self, code: impl Into<String>) -> Self {
        self.expected = Some(code.into());
        self
    }

    /// Treat `code` as a successful no-op.
    pub fn no_change(mut self, code: impl Into<String>) -> Self {
        self.no_change.push(code.into());
        self
    }

    /// Expected return code, if any.
    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    /// Classify a return code. Known failure codes win over everything else.
    pub fn classify(&self, code: &str) -> Outcome {
        if FAILURE_CODES.contains(&code) {
            return Outcome::Failed;
        }
        match self.expected.as_deref() {
            Some(expected) if expected == code => Outcome::Success,
            _ if self.no_change.iter().any(|c| c == code) => Outcome::NoChange,
            None => Outcome::Success,
            Some(_) => Outcome::Unexpected,
        }
    }
}

/// Validate an invocation response against `policy`.
///
/// `ReturnValue` and `Message` are looked up in the `resource_uri` namespace anywhere in
/// the document. A response without `ReturnValue` is malformed.
pub(crate) fn check(response: &Element, resource_uri: &str, policy: &ReturnPolicy) -> Result<Outcome> {
    let code = response
        .find(resource_uri, "ReturnValue")
        .map(|e| e.text().trim())
        .ok_or_else(|| Error::malformed(format!("no ReturnValue in response from {resource_uri}")))?;

    match policy.classify(code) {
        Outcome::Failed => Err(Error::OperationFailed {
            message: response
                .find(resource_uri, "Message")
                .map(|m| m.text().to_owned())
                .unwrap_or_default(),
        }),
        Outcome::Unexpected => Err(Error::UnexpectedReturnValue {
            expected: policy.expected().unwrap_or_default().to_owned(),
            actual: code.to_owned(),
        }),
        outcome => Ok(outcome),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(code: &str) -> Element {
        let xml = format!(
            r#"<response xmlns:n1="http://resource">
    <n1:ReturnValue>{code}</n1:ReturnValue>
    <n1:Message>The command failed to set RequestedState</n1:Message>
    <result>yay!</result>
</response>"#
        );
        Element::parse(&xml).expect("parse")
    }

    #[test]
    fn classify_table() {
        let policy = ReturnPolicy::expecting(RET_SUCCESS).no_change("4097");

        assert_eq!(policy.classify("0"), Outcome::Success);
        assert_eq!(policy.classify("2"), Outcome::Failed);
        assert_eq!(policy.classify("4097"), Outcome::NoChange);
        assert_eq!(policy.classify("4096"), Outcome::Unexpected);

        let unchecked = ReturnPolicy::default();
        assert_eq!(unchecked.classify("42"), Outcome::Success);
        assert_eq!(unchecked.classify("2"), Outcome::Failed);
    }

    #[test]
    fn failure_carries_vendor_message() {
        let err = check(&response("2"), "http://resource", &ReturnPolicy::default())
            .expect_err("failure");
        let Error::OperationFailed { message } = err else {
            panic!("expected OperationFailed, got {err:?}");
        };
        assert_eq!(message, "The command failed to set RequestedState");
    }

    #[test]
    fn mismatch_carries_both_codes() {
        let err = check(
            &response("42"),
            "http://resource",
            &ReturnPolicy::expecting("4242"),
        )
        .expect_err("mismatch");
        assert!(matches!(
            err,
            Error::UnexpectedReturnValue { ref expected, ref actual }
                if expected == "4242" && actual == "42"
        ));
    }

    #[test]
    fn return_value_is_namespace_qualified() {
        let outcome = check(&response("42"), "http://resource", &ReturnPolicy::expecting("42"))
            .expect("check");
        assert_eq!(outcome, Outcome::Success);

        let err = check(&response("42"), "http://other", &ReturnPolicy::expecting("42"))
            .expect_err("wrong namespace");
        assert!(matches!(err, Error::MalformedResponse(_)));
    }
}
