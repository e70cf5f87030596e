pub(crate) fn enabled() -> bool {
    std::env::var("DRAC_DEBUG")
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

/// Dump a raw SOAP body when `DRAC_DEBUG` is set.
pub(crate) fn dump_xml(label: &str, body: &str) {
    if !enabled() {
        return;
    }
    let out = format!("{label} ({} bytes):\n{body}", body.len());

    #[cfg(feature = "tracing")]
    tracing::trace!("{out}");

    #[cfg(not(feature = "tracing"))]
    eprintln!("{out}");
}
