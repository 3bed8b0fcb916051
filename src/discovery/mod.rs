//! mDNS/DNS-SD discovery of a Thread Border Router's commissioning endpoint (C5, §4.5).
//!
//! The TBR advertises `_meshcop-e._udp` over mDNS while it has an active commissioning
//! petition window open. This adapter just waits for the first IPv4-reachable instance of
//! that service and extracts host/port; it does not inspect the TXT record fields Thread
//! defines for network name/extended PAN ID, since nothing downstream of discovery needs
//! them before the DTLS handshake.

use std::net::Ipv4Addr;
use std::time::Duration;

use mdns_sd::{ServiceDaemon, ServiceEvent};

use crate::error::CommissionerError;

const MESHCOP_SERVICE_TYPE: &str = "_meshcop-e._udp.local.";

/// A discovered TBR commissioning endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHub {
    pub host: Ipv4Addr,
    pub port: u16,
}

/// Browses for `_meshcop-e._udp` and returns the first IPv4-reachable instance found.
///
/// An instance advertising only IPv6 addresses is treated as not found rather than as an
/// error; the caller's overall timeout is what ultimately surfaces as
/// [`CommissionerError::DiscoveryTimeout`].
pub async fn wait_for_hub(timeout: Option<Duration>) -> Result<ThreadHub, CommissionerError> {
    let daemon = ServiceDaemon::new().map_err(|_| CommissionerError::DiscoveryTimeout)?;
    let receiver = daemon
        .browse(MESHCOP_SERVICE_TYPE)
        .map_err(|_| CommissionerError::DiscoveryTimeout)?;

    let search = async {
        loop {
            match receiver.recv_async().await {
                Ok(ServiceEvent::ServiceResolved(info)) => {
                    if let Some(host) = info.get_addresses().iter().find_map(|addr| match addr {
                        std::net::IpAddr::V4(v4) => Some(*v4),
                        std::net::IpAddr::V6(_) => None,
                    }) {
                        return Ok(ThreadHub {
                            host,
                            port: info.get_port(),
                        });
                    }
                    // IPv6-only instance: keep listening for a better one.
                }
                Ok(_) => continue,
                Err(_) => return Err(CommissionerError::DiscoveryTimeout),
            }
        }
    };

    let result = match timeout {
        Some(duration) => tokio::time::timeout(duration, search)
            .await
            .map_err(|_| CommissionerError::DiscoveryTimeout)?,
        None => search.await,
    };

    let _ = daemon.stop_browse(MESHCOP_SERVICE_TYPE);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn times_out_when_nothing_is_advertised() {
        let result = wait_for_hub(Some(Duration::from_millis(50))).await;
        assert!(matches!(result, Err(CommissionerError::DiscoveryTimeout)));
    }
}
