//! Bridges the secure-transport engine's debug callback onto `tracing`.
use crate::config::DtlsLogLevel;

/// Forwards a single mbedTLS debug line to `tracing` at the severity implied by `level`.
///
/// `level` here is mbedTLS's own 0-4 threshold, passed through unchanged from the
/// `mbedtls_ssl_conf_dbg` callback; `file`/`line` identify the mbedTLS source location that
/// emitted the message, which is useful when correlating handshake failures against upstream
/// issue trackers.
pub(crate) fn forward_dtls_log(configured: DtlsLogLevel, level: i32, file: &str, line: i32, message: &str) {
    if level > configured.as_mbedtls_threshold() {
        return;
    }
    match level {
        0 | 1 => tracing::error!(target: "thread_commissioner::dtls", file, line, "{}", message),
        2 => tracing::warn!(target: "thread_commissioner::dtls", file, line, "{}", message),
        3 => tracing::info!(target: "thread_commissioner::dtls", file, line, "{}", message),
        _ => tracing::debug!(target: "thread_commissioner::dtls", file, line, "{}", message),
    }
}
