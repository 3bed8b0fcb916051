//! Commissioner session state machine (C4, §4.4).
//!
//! Drives the sequence a commercial commissioner must follow once a secure session exists:
//! petition for the commissioner role, then request the Active Operational Dataset. Unlike
//! the lighting-streaming session this is modeled after, there is no keepalive loop here —
//! one commissioning attempt runs start to finish and then the session is done.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::RngCore;

use crate::admin_code::AdminCode;
use crate::coap::{CoapCode, CoapMessage, CoapType};
use crate::config::CommissioningConfig;
use crate::dataset::Dataset;
use crate::discovery::ThreadHub;
use crate::error::{CommissionerError, CommissioningError};
use crate::tlv;
use crate::transport::SecureTransport;

/// The Commissioner-ID TLV type sent in the petition payload.
const TLV_TYPE_COMMISSIONER_ID: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionerState {
    Disconnected,
    Connected,
    CommissionerPending,
    CommissionerActive,
    DatasetRequested,
    Idle,
    Faulted,
}

impl CommissionerState {
    fn name(self) -> &'static str {
        match self {
            CommissionerState::Disconnected => "Disconnected",
            CommissionerState::Connected => "Connected",
            CommissionerState::CommissionerPending => "CommissionerPending",
            CommissionerState::CommissionerActive => "CommissionerActive",
            CommissionerState::DatasetRequested => "DatasetRequested",
            CommissionerState::Idle => "Idle",
            CommissionerState::Faulted => "Faulted",
        }
    }
}

/// Drives one commissioning attempt against a single TBR.
///
/// `transport` is `None` before [`Commissioner::connect`] and after [`Commissioner::close`];
/// every other method that needs it returns [`CommissionerError::WrongState`] when it is
/// absent instead of panicking.
pub struct Commissioner {
    config: CommissioningConfig,
    state: Arc<Mutex<CommissionerState>>,
    transport: Option<SecureTransport>,
    dataset: Option<Dataset>,
    message_id: u16,
}

impl Commissioner {
    pub fn new(config: CommissioningConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(CommissionerState::Disconnected)),
            transport: None,
            dataset: None,
            message_id: 0,
        }
    }

    pub fn state(&self) -> CommissionerState {
        *self.state.lock()
    }

    fn set_state(&self, next: CommissionerState) {
        *self.state.lock() = next;
    }

    /// Next message id, pre-incremented so the first request sent carries id `1`.
    fn next_message_id(&mut self) -> u16 {
        self.message_id = self.message_id.wrapping_add(1);
        self.message_id
    }

    fn random_token() -> Vec<u8> {
        let mut token = [0u8; 4];
        rand::thread_rng().fill_bytes(&mut token);
        token.to_vec()
    }

    /// Establishes the DTLS session against `hub` using `admin_code`, blocking the calling
    /// thread's executor via `spawn_blocking` for the handshake itself.
    pub async fn connect(&mut self, hub: &ThreadHub, admin_code: AdminCode) -> Result<(), CommissioningError> {
        let host = hub.host.to_string();
        let port = hub.port;
        let read_timeout = self.config.read_timeout;
        let step_cap = self.config.handshake_step_cap;
        let log_level = self.config.log_level;

        let transport = tokio::task::spawn_blocking(move || {
            SecureTransport::connect(&host, port, &admin_code, read_timeout, step_cap, log_level)
        })
        .await
        .map_err(|_| CommissioningError::Commissioner(CommissionerError::WrongState { state: "connect task panicked" }))??;

        self.transport = Some(transport);
        self.set_state(CommissionerState::Connected);
        Ok(())
    }

    fn transport_mut(&mut self) -> Result<&mut SecureTransport, CommissioningError> {
        self.transport
            .as_mut()
            .ok_or(CommissioningError::Commissioner(CommissionerError::WrongState {
                state: self.state().name(),
            }))
    }

    /// Sends `request` and returns the eventual response, transparently handling MeshCoP's
    /// separate-response pattern: an immediate empty ACK followed later by a Confirmable
    /// message carrying the real result.
    fn exchange(&mut self, request: &CoapMessage) -> Result<CoapMessage, CommissioningError> {
        let transport = self.transport_mut()?;
        transport.send(&request.encode())?;

        let first = transport.receive(4096)?;
        if CoapMessage::decode(&first).map_err(CommissioningError::from)?.is_empty_ack() {
            let second = transport.receive(4096)?;
            Self::first_non_ack(&[first, second])
        } else {
            Self::first_non_ack(&[first])
        }
    }

    /// The separate-response unwrapping logic in [`Commissioner::exchange`], factored out so
    /// it can be exercised without a live transport: given the datagrams a peer sends back in
    /// order, returns the response that actually carries the result.
    fn first_non_ack(datagrams: &[Vec<u8>]) -> Result<CoapMessage, CommissioningError> {
        for bytes in datagrams {
            let message = CoapMessage::decode(bytes).map_err(CommissioningError::from)?;
            if !message.is_empty_ack() {
                return Ok(message);
            }
        }
        Err(CommissioningError::Commissioner(CommissionerError::WrongState {
            state: "no non-ACK datagram received",
        }))
    }

    /// Petitions to become the active commercial commissioner (`POST /c/cp`).
    ///
    /// Accepts only a Changed (2.04) response; anything else, including Content (2.05),
    /// is treated as a rejection since only Changed indicates the petition was granted.
    pub fn petition(&mut self) -> Result<(), CommissioningError> {
        if self.state() != CommissionerState::Connected {
            return Err(CommissioningError::Commissioner(CommissionerError::WrongState {
                state: self.state().name(),
            }));
        }

        let mut payload = Vec::new();
        let name_bytes = self.config.commissioner_name.as_bytes();
        payload.push(TLV_TYPE_COMMISSIONER_ID);
        payload.push(name_bytes.len() as u8);
        payload.extend_from_slice(name_bytes);

        let message_id = self.next_message_id();
        let request = CoapMessage::new(CoapType::Confirmable, CoapCode::POST, message_id)
            .with_token(Self::random_token())
            .uri_path(&["c", "cp"])
            .with_payload(payload);

        self.set_state(CommissionerState::CommissionerPending);

        let response = self.exchange(&request)?;
        if response.code == CoapCode::CHANGED {
            self.set_state(CommissionerState::CommissionerActive);
            Ok(())
        } else {
            self.set_state(CommissionerState::Faulted);
            Err(CommissioningError::Commissioner(CommissionerError::PetitionFailed(
                (response.code.class << 5) | response.code.detail,
            )))
        }
    }

    /// Requests the Active Operational Dataset (`POST /c/ag`, MGMT_ACTIVE_GET).
    ///
    /// Accepts Changed (2.04) or Content (2.05); a success code with an empty payload is
    /// still a failure, since there would be nothing to parse a dataset out of.
    pub fn request_dataset(&mut self) -> Result<Dataset, CommissioningError> {
        if self.state() != CommissionerState::CommissionerActive {
            return Err(CommissioningError::Commissioner(CommissionerError::WrongState {
                state: self.state().name(),
            }));
        }

        let payload = tlv::encode_get_request(tlv::FULL_CREDENTIAL_REQUEST);
        let message_id = self.next_message_id();
        let request = CoapMessage::new(CoapType::Confirmable, CoapCode::POST, message_id)
            .with_token(Self::random_token())
            .uri_path(&["c", "ag"])
            .with_payload(payload);

        self.set_state(CommissionerState::DatasetRequested);

        let response = self.exchange(&request)?;
        let is_success = response.code == CoapCode::CHANGED || response.code == CoapCode::CONTENT;
        let body = response.payload.as_deref().unwrap_or(&[]);

        if !is_success || body.is_empty() {
            self.set_state(CommissionerState::Faulted);
            return Err(CommissioningError::Commissioner(CommissionerError::DatasetRequestFailed(
                (response.code.class << 5) | response.code.detail,
            )));
        }

        let dataset = tlv::parse_dataset(body);
        self.dataset = Some(dataset.clone());
        self.set_state(CommissionerState::Idle);
        Ok(dataset)
    }

    /// The most recently retrieved dataset, if any.
    pub fn active_dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Updates the configured DTLS log level, applying it immediately if a transport is
    /// already live and using it for any transport connected afterward.
    pub fn set_log_level_preference(&mut self, level: crate::config::DtlsLogLevel) {
        self.config.log_level = level;
        if let Some(transport) = self.transport.as_mut() {
            transport.set_log_level(level);
        }
    }

    /// Tears down the secure session. Safe to call from any state, including `Faulted` or
    /// before `connect` was ever called.
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
        self.transport = None;
        self.set_state(CommissionerState::Disconnected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn petition_before_connect_is_wrong_state() {
        let mut commissioner = Commissioner::new(CommissioningConfig::default());
        let result = commissioner.petition();
        assert!(matches!(
            result,
            Err(CommissioningError::Commissioner(CommissionerError::WrongState { .. }))
        ));
    }

    #[test]
    fn dataset_request_before_petition_is_wrong_state() {
        let mut commissioner = Commissioner::new(CommissioningConfig::default());
        let result = commissioner.request_dataset();
        assert!(matches!(
            result,
            Err(CommissioningError::Commissioner(CommissionerError::WrongState { .. }))
        ));
    }

    #[test]
    fn close_is_safe_with_no_transport() {
        let mut commissioner = Commissioner::new(CommissioningConfig::default());
        commissioner.close();
        assert_eq!(commissioner.state(), CommissionerState::Disconnected);
    }

    #[test]
    fn message_ids_start_at_one_and_increase() {
        let mut commissioner = Commissioner::new(CommissioningConfig::default());
        assert_eq!(commissioner.next_message_id(), 1);
        assert_eq!(commissioner.next_message_id(), 2);
    }

    /// S3 — an empty ACK followed by the real, separately-sent response.
    #[test]
    fn s3_separate_response_skips_the_empty_ack() {
        let ack = CoapMessage::new(CoapType::Acknowledgement, CoapCode::EMPTY, 7).encode();
        let real = CoapMessage::new(CoapType::Confirmable, CoapCode::CHANGED, 8)
            .with_payload(vec![0x01, 0x02])
            .encode();

        let resolved = Commissioner::first_non_ack(&[ack, real]).unwrap();
        assert_eq!(resolved.code, CoapCode::CHANGED);
        assert_eq!(resolved.payload, Some(vec![0x01, 0x02]));
    }

    #[test]
    fn piggybacked_response_has_no_leading_ack() {
        let piggybacked = CoapMessage::new(CoapType::Acknowledgement, CoapCode::CHANGED, 9).encode();
        let resolved = Commissioner::first_non_ack(&[piggybacked]).unwrap();
        assert_eq!(resolved.code, CoapCode::CHANGED);
    }
}
