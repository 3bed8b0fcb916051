//! Binary TLV codec for Thread management messages (C3, §4.3).
//!
//! The request side builds the single outer "Get TLV" TLV (type `0x0D`) listing which
//! dataset fields the TBR should include in its response. The response side is a forward
//! scan over `(type:u8, length:u8, value:length bytes)` records, dispatched through a
//! table of `(type, decoder)` pairs per the re-architecture note in the design notes —
//! adding a new field means adding one table row, not a new branch in a hand-rolled switch.

use crate::dataset::{ActiveTimestamp, Channel, ChannelMaskEntry, Dataset, SecurityPolicy};

pub const TLV_TYPE_CHANNEL: u8 = 0x00;
pub const TLV_TYPE_PAN_ID: u8 = 0x01;
pub const TLV_TYPE_XPAN_ID: u8 = 0x02;
pub const TLV_TYPE_NETWORK_NAME: u8 = 0x03;
pub const TLV_TYPE_PSKC: u8 = 0x04;
pub const TLV_TYPE_NETWORK_KEY: u8 = 0x05;
pub const TLV_TYPE_MESH_LOCAL_PREFIX: u8 = 0x07;
pub const TLV_TYPE_ACTIVE_TIMESTAMP: u8 = 0x0E;
pub const TLV_TYPE_SECURITY_POLICY: u8 = 0x0C;
pub const TLV_TYPE_CHANNEL_MASK: u8 = 0x35;
pub const TLV_TYPE_GET: u8 = 0x0D;

/// TLV types requested by the reference MGMT_ACTIVE_GET: enough to join a device to the mesh.
pub const FULL_CREDENTIAL_REQUEST: &[u8] = &[
    TLV_TYPE_CHANNEL,
    TLV_TYPE_PAN_ID,
    TLV_TYPE_XPAN_ID,
    TLV_TYPE_NETWORK_NAME,
    TLV_TYPE_NETWORK_KEY,
    TLV_TYPE_ACTIVE_TIMESTAMP,
];

/// Encodes the outer "Get TLV" request: type `0x0D`, length `N`, then `N` one-byte type ids.
pub fn encode_get_request(requested_types: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + requested_types.len());
    out.push(TLV_TYPE_GET);
    out.push(requested_types.len() as u8);
    out.extend_from_slice(requested_types);
    out
}

type Decoder = fn(&mut Dataset, &[u8]);

/// `(type, decoder)` table. A decoder that receives a value of the wrong length leaves the
/// field absent and does nothing else; a TLV type not in this table is skipped by the scan
/// without any decoder being invoked.
const DECODERS: &[(u8, Decoder)] = &[
    (TLV_TYPE_ACTIVE_TIMESTAMP, decode_active_timestamp),
    (TLV_TYPE_CHANNEL, decode_channel),
    (TLV_TYPE_PAN_ID, decode_pan_id),
    (TLV_TYPE_XPAN_ID, decode_xpan_id),
    (TLV_TYPE_NETWORK_NAME, decode_network_name),
    (TLV_TYPE_PSKC, decode_pskc),
    (TLV_TYPE_NETWORK_KEY, decode_network_key),
    (TLV_TYPE_MESH_LOCAL_PREFIX, decode_mesh_local_prefix),
    (TLV_TYPE_SECURITY_POLICY, decode_security_policy),
    (TLV_TYPE_CHANNEL_MASK, decode_channel_mask),
];

/// Parses a MGMT_ACTIVE_GET response payload into a [`Dataset`].
///
/// Total and idempotent: any byte string, however malformed, yields a `Dataset` (possibly
/// with every field absent) rather than an error. An unknown TLV type is skipped by its
/// declared length; a TLV whose declared length would exceed the remaining payload stops
/// the scan cleanly, keeping whatever fields were already decoded.
pub fn parse_dataset(payload: &[u8]) -> Dataset {
    let mut dataset = Dataset::default();
    let mut pos = 0usize;

    while pos < payload.len() {
        let tlv_type = payload[pos];
        let Some(&len_byte) = payload.get(pos + 1) else {
            break;
        };
        let len = len_byte as usize;
        let value_start = pos + 2;
        let value_end = value_start + len;
        if value_end > payload.len() {
            break;
        }
        let value = &payload[value_start..value_end];

        if let Some((_, decoder)) = DECODERS.iter().find(|(t, _)| *t == tlv_type) {
            decoder(&mut dataset, value);
        }

        pos = value_end;
    }

    dataset
}

fn decode_active_timestamp(dataset: &mut Dataset, value: &[u8]) {
    if value.len() != 8 {
        return;
    }
    let seconds = u64::from(value[0]) << 40
        | u64::from(value[1]) << 32
        | u64::from(value[2]) << 24
        | u64::from(value[3]) << 16
        | u64::from(value[4]) << 8
        | u64::from(value[5]);
    let ticks = u16::from_be_bytes([value[6], value[7]]);
    dataset.active_timestamp = Some(ActiveTimestamp { seconds, ticks });
}

fn decode_channel(dataset: &mut Dataset, value: &[u8]) {
    if value.len() != 3 {
        return;
    }
    let page = value[0];
    let id = u16::from_be_bytes([value[1], value[2]]);
    dataset.channel = Some(Channel { page, id });
}

fn decode_pan_id(dataset: &mut Dataset, value: &[u8]) {
    if value.len() != 2 {
        return;
    }
    dataset.pan_id = Some(u16::from_be_bytes([value[0], value[1]]));
}

fn decode_xpan_id(dataset: &mut Dataset, value: &[u8]) {
    if let Ok(bytes) = <[u8; 8]>::try_from(value) {
        dataset.xpan_id = Some(bytes);
    }
}

fn decode_network_name(dataset: &mut Dataset, value: &[u8]) {
    if let Ok(name) = std::str::from_utf8(value) {
        dataset.network_name = Some(name.to_string());
    }
}

fn decode_pskc(dataset: &mut Dataset, value: &[u8]) {
    if let Ok(bytes) = <[u8; 16]>::try_from(value) {
        dataset.pskc = Some(bytes);
    }
}

fn decode_network_key(dataset: &mut Dataset, value: &[u8]) {
    if let Ok(bytes) = <[u8; 16]>::try_from(value) {
        dataset.network_key = Some(bytes);
    }
}

fn decode_mesh_local_prefix(dataset: &mut Dataset, value: &[u8]) {
    if let Ok(bytes) = <[u8; 8]>::try_from(value) {
        dataset.mesh_local_prefix = Some(bytes);
    }
}

fn decode_security_policy(dataset: &mut Dataset, value: &[u8]) {
    if value.len() < 4 {
        return;
    }
    let rotation_hours = u16::from_be_bytes([value[0], value[1]]);
    let flags = u16::from_be_bytes([value[2], value[3]]);
    dataset.security_policy = Some(SecurityPolicy { rotation_hours, flags });
}

fn decode_channel_mask(dataset: &mut Dataset, value: &[u8]) {
    if value.len() < 2 {
        return;
    }
    let page = value[0];
    let mask_len = value[1] as usize;
    if mask_len % 4 != 0 || value.len() != 2 + mask_len {
        return;
    }
    let mut entries = Vec::with_capacity(mask_len / 4);
    for chunk in value[2..].chunks_exact(4) {
        let mask = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        entries.push(ChannelMaskEntry { page, mask });
    }
    dataset.channel_mask = Some(entries);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// S4 — full dataset parse from the spec's boundary scenarios.
    #[test]
    fn s4_dataset_parse() {
        let payload: Vec<u8> = vec![
            0x00, 0x03, 0x00, 0x00, 0x0F, // channel
            0x01, 0x02, 0xAB, 0xCD, // pan id
            0x02, 0x08, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, // xpan id
            0x03, 0x05, 0x48, 0x65, 0x6C, 0x6C, 0x6F, // network name "Hello"
            0x05, 0x10, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
            0x0C, 0x0D, 0x0E, 0x0F, // network key
            0x0E, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, // active timestamp
        ];
        let dataset = parse_dataset(&payload);
        assert_eq!(dataset.channel, Some(Channel { page: 0, id: 15 }));
        assert_eq!(dataset.pan_id, Some(0xABCD));
        assert_eq!(
            dataset.xpan_id,
            Some([0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88])
        );
        assert_eq!(dataset.network_name.as_deref(), Some("Hello"));
        assert_eq!(
            dataset.network_key,
            Some([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15])
        );
        assert_eq!(
            dataset.active_timestamp,
            Some(ActiveTimestamp { seconds: 1, ticks: 0 })
        );
        assert!(dataset.pskc.is_none());
        assert!(dataset.mesh_local_prefix.is_none());
        assert!(dataset.security_policy.is_none());
        assert!(dataset.channel_mask.is_none());
    }

    /// S5 — an unknown leading TLV must not disturb the known fields.
    #[test]
    fn s5_unknown_tlv_is_skipped() {
        let mut payload = vec![0xFF, 0x02, 0xDE, 0xAD];
        let s4_payload: Vec<u8> = vec![
            0x00, 0x03, 0x00, 0x00, 0x0F, 0x01, 0x02, 0xAB, 0xCD, 0x02, 0x08, 0x11, 0x22, 0x33,
            0x44, 0x55, 0x66, 0x77, 0x88, 0x03, 0x05, 0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x05, 0x10,
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D,
            0x0E, 0x0F, 0x0E, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
        ];
        payload.extend_from_slice(&s4_payload);
        let with_unknown = parse_dataset(&payload);
        let without_unknown = parse_dataset(&s4_payload);
        assert_eq!(with_unknown, without_unknown);
    }

    #[test]
    fn truncated_tlv_terminates_parse_cleanly() {
        // declares 16 bytes of network key but only 4 are present.
        let payload = vec![0x05, 0x10, 0x00, 0x01, 0x02, 0x03];
        let dataset = parse_dataset(&payload);
        assert!(dataset.network_key.is_none());
    }

    #[test]
    fn wrong_length_drops_field_but_continues_parsing() {
        let mut payload = vec![0x01, 0x01, 0xAB]; // pan id with wrong length (1 byte)
        payload.extend_from_slice(&[0x03, 0x03, b'F', b'o', b'o']); // valid network name
        let dataset = parse_dataset(&payload);
        assert!(dataset.pan_id.is_none());
        assert_eq!(dataset.network_name.as_deref(), Some("Foo"));
    }

    #[test]
    fn channel_mask_decodes_multiple_masks() {
        let payload = vec![
            TLV_TYPE_CHANNEL_MASK,
            10,
            0x00, // page
            8,    // mask length = 2 masks
            0x00, 0x00, 0x07, 0xFF,
            0x00, 0x00, 0x00, 0x01,
        ];
        let dataset = parse_dataset(&payload);
        let masks = dataset.channel_mask.unwrap();
        assert_eq!(masks.len(), 2);
        assert_eq!(masks[0].mask, 0x0000_07FF);
        assert_eq!(masks[1].mask, 0x0000_0001);
    }

    #[test]
    fn security_policy_ignores_trailing_bytes() {
        let payload = vec![TLV_TYPE_SECURITY_POLICY, 5, 0x00, 0x48, 0x80, 0x00, 0xFF];
        let dataset = parse_dataset(&payload);
        let policy = dataset.security_policy.unwrap();
        assert_eq!(policy.rotation_hours, 0x0048);
        assert!(policy.obtain_network_key());
        assert!(!policy.native_commissioning());
    }

    #[test]
    fn idempotent_reparse() {
        let payload = vec![0x01, 0x02, 0x00, 0x01];
        let first = parse_dataset(&payload);
        let second = parse_dataset(&payload);
        assert_eq!(first, second);
    }

    #[test]
    fn get_request_encodes_outer_tlv() {
        let encoded = encode_get_request(FULL_CREDENTIAL_REQUEST);
        assert_eq!(encoded[0], TLV_TYPE_GET);
        assert_eq!(encoded[1], FULL_CREDENTIAL_REQUEST.len() as u8);
        assert_eq!(&encoded[2..], FULL_CREDENTIAL_REQUEST);
    }
}
