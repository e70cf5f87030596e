#[cfg(any(feature = "blocking", feature = "async"))]
use std::time::Duration;

use crate::error::Result;
#[cfg(any(feature = "blocking", feature = "async"))]
use crate::error::Error;
#[cfg(any(feature = "blocking", feature = "async"))]
use crate::secret::SecretString;

/// `Content-Type` of every WS-Man request.
#[cfg(any(feature = "blocking", feature = "async"))]
pub(crate) const SOAP_CONTENT_TYPE: &str = "application/soap+xml;charset=UTF-8";

/// A synchronous transport that POSTs SOAP envelopes to a WS-Man endpoint.
///
/// The HTTP implementation is used by default; tests plug in canned responses.
pub trait Transport {
    /// Endpoint URL, used as the `wsa:To` address of every envelope.
    fn url(&self) -> &str;

    /// POST `body` and return the response body of a 2xx answer.
    fn post(&self, body: &str) -> Result<String>;
}

#[cfg(feature = "async")]
mod async_support {
    use core::future::Future;
    use core::pin::Pin;

    use crate::error::Result;

    /// An asynchronous transport that POSTs SOAP envelopes to a WS-Man endpoint.
    pub trait AsyncTransport {
        /// Endpoint URL, used as the `wsa:To` address of every envelope.
        fn url(&self) -> &str;

        /// POST `body` and return the response body of a 2xx answer.
        fn post<'a>(
            &'a self,
            body: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
    }
}

#[cfg(feature = "async")]
pub use async_support::AsyncTransport;

/// Connection settings shared by the HTTP transports.
#[cfg(any(feature = "blocking", feature = "async"))]
#[derive(Clone)]
pub(crate) struct HttpSettings {
    pub(crate) url: String,
    pub(crate) username: String,
    pub(crate) password: SecretString,
    pub(crate) verify_tls: bool,
    pub(crate) ca_certificates: Vec<reqwest::Certificate>,
    pub(crate) timeout: Duration,
}

#[cfg(any(feature = "blocking", feature = "async"))]
impl core::fmt::Debug for HttpSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpSettings")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password)
            .field("verify_tls", &self.verify_tls)
            .field("ca_certificates", &self.ca_certificates.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Error for a non-2xx answer, preferring the SOAP fault text over the status reason.
#[cfg(any(feature = "blocking", feature = "async"))]
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> Error {
    let reason = crate::envelope::fault_reason(body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_owned());
    Error::Http {
        status: status.as_u16(),
        reason,
    }
}

#[cfg(feature = "blocking")]
pub(crate) mod blocking;

#[cfg(feature = "async")]
pub(crate) mod tokio;

#[cfg(all(test, any(feature = "blocking", feature = "async")))]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_fault_reason() {
        let body = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body><s:Fault>
            <s:Code><s:Value>s:Sender</s:Value></s:Code>
            <s:Reason><s:Text xml:lang="en">The action is not supported by the service.</s:Text></s:Reason>
            </s:Fault></s:Body></s:Envelope>"#;
        let err = status_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(matches!(
            err,
            Error::Http { status: 400, ref reason } if reason == "The action is not supported by the service."
        ));

        let err = status_error(reqwest::StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, Error::Http { status: 401, ref reason } if reason == "Unauthorized"));
    }
}
