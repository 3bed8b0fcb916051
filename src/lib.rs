//! Thread 1.4 Commercial Commissioning client.
//!
//! Discovers a Thread Border Router advertising an open commissioning window, establishes
//! a DTLS session authenticated by EC-JPAKE against its admin code, petitions to become the
//! active commercial commissioner, and retrieves the network's Active Operational Dataset.
//!
//! The pieces compose bottom-up: [`tlv`] and [`coap`] are pure codecs, [`transport`] is the
//! secure datagram channel, [`discovery`] finds a hub to talk to, [`commissioner`] drives the
//! protocol state machine over all of the above, and [`client`] is the thin facade most
//! callers should actually use.

pub mod admin_code;
pub mod client;
pub mod coap;
pub mod commissioner;
pub mod config;
pub mod dataset;
pub mod discovery;
pub mod error;
pub(crate) mod logging;
pub mod tlv;
pub mod transport;

pub use admin_code::AdminCode;
pub use client::ThreadCommissioner;
pub use commissioner::{Commissioner, CommissionerState};
pub use config::{CommissioningConfig, CommissioningConfigBuilder, DtlsLogLevel};
pub use dataset::{ActiveTimestamp, Channel, ChannelMaskEntry, Dataset, SecurityPolicy};
pub use discovery::ThreadHub;
pub use error::{CoapError, CommissionerError, CommissioningError, Result, TransportError};
