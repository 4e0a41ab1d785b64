//! Device discovery via UDP broadcast.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::debug;
use serde_json::{Value, json};
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout};

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

const DISCOVERY_PORT: u16 = 38899;

/// A discovered Wiz bulb on the network.
#[derive(Debug, Clone)]
pub struct DiscoveredBulb {
    /// IP address of the discovered bulb
    pub ip: Ipv4Addr,
    /// MAC address of the discovered bulb
    pub mac: String,
}

/// Discover Wiz bulbs on the local network using UDP broadcast.
///
/// Sends a registration probe to `broadcast` (see
/// [`broadcast_address`](crate::broadcast_address) for the configured
/// default) and collects responses until `discovery_timeout` elapses.
/// Bulbs are deduplicated by MAC address. Zero responders is an empty
/// result, not an error; only a failing socket operation makes the scan
/// itself fail.
///
/// # Examples
///
/// ```ignore
/// use std::time::Duration;
/// use wiz_fanout::{broadcast_address, discover_bulbs};
///
/// let bulbs = discover_bulbs(broadcast_address(), Duration::from_secs(5)).await?;
/// for bulb in &bulbs {
///     println!("  {} - {}", bulb.ip, bulb.mac);
/// }
/// ```
pub async fn discover_bulbs(
    broadcast: Ipv4Addr,
    discovery_timeout: Duration,
) -> Result<Vec<DiscoveredBulb>> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|e| Error::discovery("bind", e))?;

    socket
        .set_broadcast(true)
        .map_err(|e| Error::discovery("set_broadcast", e))?;

    let msg = json!({
        "method": "registration",
        "params": {
            "phoneMac": "AAAAAAAAAAAA",
            "register": false,
            "phoneIp": "1.2.3.4",
            "id": "1"
        }
    });
    let msg_bytes = serde_json::to_vec(&msg).map_err(Error::JsonDump)?;

    socket
        .send_to(&msg_bytes, (broadcast, DISCOVERY_PORT))
        .await
        .map_err(|e| Error::discovery("send_to", e))?;

    let mut discovered: HashMap<String, DiscoveredBulb> = HashMap::new();
    let start = Instant::now();
    let mut buffer = [0u8; 4096];
    let recv_timeout = Duration::from_millis(500);

    while start.elapsed() < discovery_timeout {
        match timeout(recv_timeout, socket.recv_from(&mut buffer)).await {
            Ok(Ok((size, addr))) => {
                if let Ok(response) = String::from_utf8(buffer[..size].to_vec())
                    && let Ok(json) = serde_json::from_str::<Value>(&response)
                    && let Some(mac) = extract_mac(&json)
                {
                    let ip = match addr {
                        SocketAddr::V4(v4) => *v4.ip(),
                        SocketAddr::V6(_) => continue,
                    };
                    debug!("discovery reply from {ip} ({mac})");
                    discovered.insert(mac.clone(), DiscoveredBulb { ip, mac });
                }
            }
            // Timeout elapsed - continue loop to check overall timeout
            Ok(Err(_)) | Err(_) => continue,
        }
    }

    Ok(discovered.into_values().collect())
}

fn extract_mac(json: &Value) -> Option<String> {
    json.get("result")
        .and_then(|r| r.get("mac"))
        .and_then(|m| m.as_str())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_mac() {
        let reply = json!({
            "method": "registration",
            "env": "pro",
            "result": {"mac": "a8bb5006033d", "success": true}
        });
        assert_eq!(extract_mac(&reply), Some("a8bb5006033d".to_string()));

        assert_eq!(extract_mac(&json!({"result": {}})), None);
        assert_eq!(extract_mac(&json!({})), None);
    }
}
