use std::time::Duration;

use crate::error::Error;

/// What a round trip was for, as reported to tracing and metrics.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Call<'a> {
    pub(crate) action: &'a str,
    pub(crate) resource_uri: &'a str,
}

pub(crate) fn record_ok(mode: &'static str, call: Call<'_>, elapsed: Duration) {
    let _ = (mode, call, elapsed);

    #[cfg(feature = "metrics")]
    {
        metrics::counter!("drac_requests_total", "mode" => mode, "outcome" => "ok").increment(1);
        metrics::histogram!("drac_request_seconds", "mode" => mode).record(elapsed.as_secs_f64());
    }

    #[cfg(feature = "tracing")]
    {
        tracing::debug!(
            mode,
            action = call.action,
            resource_uri = call.resource_uri,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "wsman request ok"
        );
    }
}

pub(crate) fn record_err(mode: &'static str, call: Call<'_>, elapsed: Duration, err: &Error) {
    let _ = (mode, call, elapsed, err);

    #[cfg(feature = "metrics")]
    {
        metrics::counter!("drac_requests_total", "mode" => mode, "outcome" => "err").increment(1);
        metrics::counter!(
            "drac_request_errors_total",
            "mode" => mode,
            "kind" => error_kind(err)
        )
        .increment(1);
        metrics::histogram!("drac_request_seconds", "mode" => mode).record(elapsed.as_secs_f64());
    }

    #[cfg(feature = "tracing")]
    {
        tracing::warn!(
            mode,
            action = call.action,
            resource_uri = call.resource_uri,
            error = %err,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "wsman request failed"
        );
    }
}

#[cfg(feature = "metrics")]
fn error_kind(err: &Error) -> &'static str {
    match err {
        Error::Transport(_) => "transport",
        Error::Http { .. } => "http",
        Error::Timeout => "timeout",
        Error::Xml(_) => "xml",
        Error::OperationFailed { .. } => "operation_failed",
        Error::UnexpectedReturnValue { .. } => "unexpected_return_value",
        Error::MalformedResponse(_) => "malformed_response",
        Error::InvalidParameterValue(_) => "invalid_parameter",
    }
}
