//! The parsed Active Operational Dataset (§3, §4.3 response side).

/// 8 B channel mask entries: a page and the big-endian u32 mask for that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMaskEntry {
    pub page: u8,
    pub mask: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTimestamp {
    pub seconds: u64,
    pub ticks: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub page: u8,
    pub id: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityPolicy {
    pub rotation_hours: u16,
    pub flags: u16,
}

impl SecurityPolicy {
    /// Bit 7 of the flags byte (as laid out by Thread 1.4's security policy TLV):
    /// whether the network key may be obtained through this commissioning session.
    pub fn obtain_network_key(&self) -> bool {
        self.flags & 0x8000 != 0
    }

    /// Bit 6: whether native commissioning (no external commissioner) is permitted.
    pub fn native_commissioning(&self) -> bool {
        self.flags & 0x4000 != 0
    }
}

/// The parsed Active Operational Dataset. Every field is optional: presence depends on
/// what TLVs the TBR actually returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub active_timestamp: Option<ActiveTimestamp>,
    pub channel: Option<Channel>,
    pub pan_id: Option<u16>,
    pub xpan_id: Option<[u8; 8]>,
    pub network_name: Option<String>,
    pub pskc: Option<[u8; 16]>,
    pub network_key: Option<[u8; 16]>,
    pub mesh_local_prefix: Option<[u8; 8]>,
    pub security_policy: Option<SecurityPolicy>,
    pub channel_mask: Option<Vec<ChannelMaskEntry>>,
}

impl Dataset {
    /// Whether the six fields requested by the reference Get-TLV list (§4.3) are all present:
    /// channel, PAN ID, extended PAN ID, network name, network key, active timestamp. A
    /// commissioner that only got some of these cannot actually join a device to the mesh.
    pub fn has_full_credentials(&self) -> bool {
        self.channel.is_some()
            && self.pan_id.is_some()
            && self.xpan_id.is_some()
            && self.network_name.is_some()
            && self.network_key.is_some()
            && self.active_timestamp.is_some()
    }
}
