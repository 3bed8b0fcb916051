//! Black-box integration tests for the two boundary scenarios spec.md §8 calls out as
//! integration-level (S3 separate response, S6 handshake cap), exercised purely through the
//! crate's public surface.

use std::net::UdpSocket;
use std::time::Duration;

use thread_commissioner::coap::{CoapCode, CoapMessage, CoapType};
use thread_commissioner::config::DtlsLogLevel;
use thread_commissioner::error::TransportError;
use thread_commissioner::transport::SecureTransport;
use thread_commissioner::AdminCode;

/// S3 — the harness first replies with a 4-byte empty-ACK datagram, then with a `2.04
/// Changed` carrying no payload, both matching the wire bytes spec.md §8 specifies.
#[test]
fn s3_separate_response_datagrams_decode_in_order() {
    let empty_ack = [0x60u8, 0x00, 0x00, 0x07];
    let changed = CoapMessage::new(CoapType::Acknowledgement, CoapCode::CHANGED, 0x0007)
        .with_token(vec![0xAA, 0xBB, 0xCC, 0xDD])
        .encode();

    let first = CoapMessage::decode(&empty_ack).unwrap();
    assert!(first.is_empty_ack());

    let second = CoapMessage::decode(&changed).unwrap();
    assert!(!second.is_empty_ack());
    assert_eq!(second.code, CoapCode::CHANGED);
    assert_eq!(second.token, vec![0xAA, 0xBB, 0xCC, 0xDD]);
}

/// S6 — against a peer that never replies to the ClientHello, the handshake must fail within
/// the bounded `handshake_step_cap * read_timeout` wall-clock budget rather than hang.
#[tokio::test]
async fn s6_handshake_times_out_against_a_silent_peer() {
    // Bound but never read from: the kernel holds the port open, so the handshake's UDP
    // sends land without an ICMP port-unreachable, and every recv simply times out.
    let silent_peer = UdpSocket::bind("127.0.0.1:0").expect("bind silent peer");
    let port = silent_peer.local_addr().unwrap().port();

    let admin_code = AdminCode::parse("123456").unwrap();
    let result = tokio::task::spawn_blocking(move || {
        SecureTransport::connect(
            "127.0.0.1",
            port,
            &admin_code,
            Duration::from_millis(20),
            3,
            DtlsLogLevel::None,
        )
    })
    .await
    .expect("connect task panicked");

    assert!(matches!(result, Err(TransportError::HandshakeFailed { .. })));
    drop(silent_peer);
}
