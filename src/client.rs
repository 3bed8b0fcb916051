//! Public facade: the thin entry point an embedding application drives end to end (A4).
//!
//! Mirrors the shape of a high-level SDK client that wraps discovery, handshake, and
//! protocol state behind a handful of async methods, so a caller never touches the CoAP
//! codec, the TLV codec, or the secure transport directly.

use std::time::Duration;

use crate::admin_code::AdminCode;
use crate::commissioner::Commissioner;
use crate::config::{CommissioningConfig, DtlsLogLevel};
use crate::dataset::Dataset;
use crate::discovery::{self, ThreadHub};
use crate::error::Result;

/// Drives one commissioning attempt: discover a hub, connect with an admin code, and pull
/// down the Active Operational Dataset.
///
/// # Guarantees
/// * `search_for_hub` never blocks past its timeout.
/// * `connect_to_hub` performs only the DTLS handshake; petition happens in
///   `get_thread_dataset`.
/// * `close` is safe to call at any point, including before a successful connect.
pub struct ThreadCommissioner {
    commissioner: Commissioner,
}

impl ThreadCommissioner {
    pub fn new() -> Self {
        Self::with_config(CommissioningConfig::default())
    }

    pub fn with_config(config: CommissioningConfig) -> Self {
        Self {
            commissioner: Commissioner::new(config),
        }
    }

    /// Browses for a TBR advertising `_meshcop-e._udp` for up to `timeout_seconds`.
    ///
    /// `timeout_seconds <= 0.0` means wait indefinitely, per §6. Returns `None` on timeout
    /// rather than an error, since "no hub found yet" is a routine outcome an embedder will
    /// usually just retry.
    pub async fn search_for_hub(&self, timeout_seconds: f64) -> Option<ThreadHub> {
        let timeout = if timeout_seconds <= 0.0 {
            None
        } else {
            Some(Duration::from_secs_f64(timeout_seconds))
        };
        discovery::wait_for_hub(timeout).await.ok()
    }

    /// Connects to `hub` with `admin_code`, performing the DTLS/EC-JPAKE handshake only.
    /// Petitioning for the commercial commissioner role happens later, in
    /// [`Self::get_thread_dataset`].
    pub async fn connect_to_hub(&mut self, hub: &ThreadHub, admin_code: &str) -> Result<()> {
        let admin_code = AdminCode::parse(admin_code)?;
        self.commissioner.connect(hub, admin_code).await?;
        Ok(())
    }

    /// Petitions for the commercial commissioner role, then requests the Active Operational
    /// Dataset. Returns `None` if either step did not yield a usable dataset.
    pub async fn get_thread_dataset(&mut self) -> Option<Dataset> {
        self.commissioner.petition().ok()?;
        self.commissioner.request_dataset().ok()
    }

    /// Adjusts the secure transport's debug verbosity for the remainder of this session.
    pub fn set_dtls_logging_level(&mut self, level: DtlsLogLevel) {
        // The transport instance is created fresh on each `connect_to_hub`; this only takes
        // effect once a session exists, mirroring mbedTLS's own library-wide threshold.
        self.commissioner.set_log_level_preference(level);
    }

    pub fn close(&mut self) {
        self.commissioner.close();
    }
}

impl Default for ThreadCommissioner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_with_invalid_admin_code_is_rejected_before_any_network_io() {
        let mut client = ThreadCommissioner::new();
        let hub = ThreadHub {
            host: "127.0.0.1".parse().unwrap(),
            port: 12345,
        };
        let result = client.connect_to_hub(&hub, "123").await;
        assert!(result.is_err());
    }
}
