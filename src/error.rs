use thiserror::Error;

/// Result type used across this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP request could not be completed (connection refused, TLS failure, etc.).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The controller answered with a non-2xx HTTP status.
    ///
    /// `reason` carries the SOAP fault text when the body contained one.
    #[error("http status {status}: {reason}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// SOAP fault reason, or the canonical status reason.
        reason: String,
    },

    /// The request timed out.
    ///
    /// For invocations the remote outcome is unknown: the controller may or may not
    /// have applied the change.
    #[error("timeout waiting for response")]
    Timeout,

    /// The response body is not well-formed XML.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The controller reported a failed operation.
    #[error("operation failed: {message}")]
    OperationFailed {
        /// Message returned by the controller, verbatim (may be empty).
        message: String,
    },

    /// The controller returned a return code that neither matches the expected one
    /// nor is a known failure code.
    #[error("unexpected return value: expected {expected}, got {actual}")]
    UnexpectedReturnValue {
        /// Return code the operation expected.
        expected: String,
        /// Return code the controller sent.
        actual: String,
    },

    /// A response lacked a required field or carried an unparsable one.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Invalid caller-supplied argument. No request has been sent.
    #[error("invalid parameter value: {0}")]
    InvalidParameterValue(String),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameterValue(msg.into())
    }

    /// Map a `reqwest` failure onto the crate taxonomy.
    pub(crate) fn from_http(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        match err.status() {
            Some(status) => Self::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_owned(),
            },
            None => Self::Transport(err),
        }
    }
}
