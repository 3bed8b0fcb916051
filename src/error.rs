//! Crate-wide error taxonomy.
//!
//! Each component owns a focused error enum; [`CommissioningError`] unifies
//! them behind `#[from]` so callers can match on the coarse kind while
//! `source()` still drills into the underlying detail.

use thiserror::Error;

/// Errors raised by the secure datagram transport (C1).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("admin code must be 6-12 ASCII digits after trimming")]
    InvalidAdminCode,
    #[error("connection setup failed: {0}")]
    ConnectionFailed(String),
    #[error("handshake failed (code {code:#x}): {message}")]
    HandshakeFailed { code: i32, message: String },
    #[error("send failed (code {0:#x})")]
    SendFailed(i32),
    #[error("receive failed (code {0:#x})")]
    ReceiveFailed(i32),
}

/// Errors raised by the CoAP codec (C2).
#[derive(Debug, Error)]
pub enum CoapError {
    #[error("invalid CoAP response: {0}")]
    InvalidResponse(String),
}

/// Errors raised by the commissioner state machine (C4).
#[derive(Debug, Error)]
pub enum CommissionerError {
    #[error("petition rejected with code {0:#04x}")]
    PetitionFailed(u8),
    #[error("dataset request rejected with code {0:#04x}")]
    DatasetRequestFailed(u8),
    #[error("operation invalid in state {state}")]
    WrongState { state: &'static str },
    #[error("discovery timed out before a hub was found")]
    DiscoveryTimeout,
}

/// Top-level error returned by every public entry point in this crate.
#[derive(Debug, Error)]
pub enum CommissioningError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Coap(#[from] CoapError),
    #[error(transparent)]
    Commissioner(#[from] CommissionerError),
}

pub type Result<T> = std::result::Result<T, CommissioningError>;
