//! Tunables the spec calls out as constants, made overridable by the embedder.
use std::time::Duration;

/// The reference commissioner name sent in the Commissioner-ID TLV during petition.
pub const DEFAULT_COMMISSIONER_NAME: &str = "iOSCommissioner";

/// Per-record read timeout configured on the secure-transport engine.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on handshake-step iterations before the handshake is treated as a timeout.
pub const DEFAULT_HANDSHAKE_STEP_CAP: u32 = 100;

/// Debug verbosity threshold for the secure-transport engine.
///
/// Mirrors the four levels mbedTLS itself exposes through `mbedtls_debug_set_threshold`,
/// mapped onto `tracing`'s `error!`/`info!`/`debug!` macros by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum DtlsLogLevel {
    None = 0,
    Error = 1,
    Info = 3,
    Verbose = 4,
}

impl DtlsLogLevel {
    pub fn as_mbedtls_threshold(self) -> i32 {
        self as u8 as i32
    }
}

/// Configuration controlling one commissioning attempt.
///
/// Every field has the value the spec describes as fixed; the builder exists so an
/// embedding application can tune them (e.g. a longer discovery window on slow networks)
/// without the crate hard-coding magic numbers at every call site.
#[derive(Debug, Clone)]
pub struct CommissioningConfig {
    pub commissioner_name: String,
    pub read_timeout: Duration,
    pub handshake_step_cap: u32,
    pub discovery_timeout: Option<Duration>,
    pub log_level: DtlsLogLevel,
}

impl Default for CommissioningConfig {
    fn default() -> Self {
        Self {
            commissioner_name: DEFAULT_COMMISSIONER_NAME.to_string(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            handshake_step_cap: DEFAULT_HANDSHAKE_STEP_CAP,
            discovery_timeout: None,
            log_level: DtlsLogLevel::None,
        }
    }
}

impl CommissioningConfig {
    pub fn builder() -> CommissioningConfigBuilder {
        CommissioningConfigBuilder::default()
    }
}

/// Builder for [`CommissioningConfig`].
#[derive(Debug, Default, Clone)]
pub struct CommissioningConfigBuilder {
    inner: PartialConfig,
}

#[derive(Debug, Default, Clone)]
struct PartialConfig {
    commissioner_name: Option<String>,
    read_timeout: Option<Duration>,
    handshake_step_cap: Option<u32>,
    discovery_timeout: Option<Duration>,
    log_level: Option<DtlsLogLevel>,
}

impl CommissioningConfigBuilder {
    pub fn commissioner_name(mut self, name: impl Into<String>) -> Self {
        self.inner.commissioner_name = Some(name.into());
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.inner.read_timeout = Some(timeout);
        self
    }

    pub fn handshake_step_cap(mut self, cap: u32) -> Self {
        self.inner.handshake_step_cap = Some(cap);
        self
    }

    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.inner.discovery_timeout = Some(timeout);
        self
    }

    pub fn log_level(mut self, level: DtlsLogLevel) -> Self {
        self.inner.log_level = Some(level);
        self
    }

    pub fn build(self) -> CommissioningConfig {
        let defaults = CommissioningConfig::default();
        CommissioningConfig {
            commissioner_name: self.inner.commissioner_name.unwrap_or(defaults.commissioner_name),
            read_timeout: self.inner.read_timeout.unwrap_or(defaults.read_timeout),
            handshake_step_cap: self.inner.handshake_step_cap.unwrap_or(defaults.handshake_step_cap),
            discovery_timeout: self.inner.discovery_timeout.or(defaults.discovery_timeout),
            log_level: self.inner.log_level.unwrap_or(defaults.log_level),
        }
    }
}
