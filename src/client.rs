//! The device client seam.
//!
//! [`FanoutController`](crate::FanoutController) talks to bulbs only
//! through the [`DeviceClient`] and [`Connect`] traits, so the controller
//! logic is testable against scripted fakes while production runs use the
//! UDP [`WizClient`].

use std::future::Future;
use std::net::Ipv4Addr;

use log::debug;
use serde_json::{Value, json};
use tokio::net::UdpSocket;

use crate::errors::Error;
use crate::payload::Payload;
use crate::status::{DeviceState, PilotReply, SetReply};

type Result<T> = std::result::Result<T, Error>;

/// One live connection to one bulb.
///
/// A client performs exactly one wire exchange per call; deadlines and
/// retries are imposed by the controller driving it.
pub trait DeviceClient: Send + Sync {
    /// Apply lighting settings, returning the state the bulb now has.
    fn apply_state(&self, payload: &Payload) -> impl Future<Output = Result<DeviceState>> + Send;

    /// Query the bulb for its full current state.
    fn query_state(&self) -> impl Future<Output = Result<DeviceState>> + Send;

    /// Release the connection. Idempotent; errors are for logging only.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Factory for [`DeviceClient`]s, keyed by target address.
pub trait Connect: Send + Sync {
    type Client: DeviceClient;

    /// Open a connection to the bulb at `ip`.
    fn connect(&self, ip: Ipv4Addr) -> impl Future<Output = Result<Self::Client>> + Send;
}

/// A [`DeviceClient`] speaking the Wiz UDP protocol on port 38899.
///
/// Holds one bound socket connected to the bulb for its whole lifetime, so
/// repeated attempts against the same target reuse the same local port.
#[derive(Debug)]
pub struct WizClient {
    ip: Ipv4Addr,
    socket: UdpSocket,
}

impl WizClient {
    const PORT: u16 = 38899;

    /// Bind a local socket and connect it to the bulb at `ip`.
    pub async fn connect(ip: Ipv4Addr) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| Error::socket("bind", e))?;

        socket
            .connect((ip, Self::PORT))
            .await
            .map_err(|e| Error::socket("connect", e))?;

        Ok(WizClient { ip, socket })
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    async fn send_command(&self, msg: &Value) -> Result<Value> {
        let msg_str = serde_json::to_string(msg).map_err(Error::JsonDump)?;

        self.socket
            .send(msg_str.as_bytes())
            .await
            .map_err(|e| Error::socket("send", e))?;

        let mut buffer = [0u8; 4096];
        let bytes = self
            .socket
            .recv(&mut buffer)
            .await
            .map_err(|e| Error::socket("receive", e))?;

        let response = String::from_utf8(buffer[..bytes].to_vec()).map_err(Error::Utf8Decode)?;
        debug!("UDP response from {}: {}", self.ip, response);
        serde_json::from_str(&response).map_err(Error::JsonLoad)
    }
}

impl DeviceClient for WizClient {
    async fn apply_state(&self, payload: &Payload) -> Result<DeviceState> {
        if !payload.is_valid() {
            return Err(Error::NoAttribute);
        }

        // Power-only changes use the dedicated setState method; anything
        // touching lighting attributes goes through setPilot.
        let msg = if payload.is_power_only() {
            json!({
                "method": "setState",
                "params": {"state": payload.state},
            })
        } else {
            let params = serde_json::to_value(payload).map_err(Error::JsonDump)?;
            json!({
                "method": "setPilot",
                "params": params,
            })
        };

        let response = self.send_command(&msg).await?;
        let reply: SetReply = serde_json::from_value(response).map_err(Error::JsonLoad)?;
        if !reply.result.success {
            return Err(Error::Rejected { ip: self.ip });
        }

        Ok(DeviceState::from(payload))
    }

    async fn query_state(&self) -> Result<DeviceState> {
        let response = self.send_command(&json!({"method": "getPilot"})).await?;
        let reply: PilotReply = serde_json::from_value(response).map_err(Error::JsonLoad)?;
        debug!(
            "pilot from {}: method {} env {}",
            self.ip, reply.method, reply.env
        );
        Ok(reply.result)
    }

    async fn close(&self) -> Result<()> {
        // UDP sockets carry no shutdown handshake; the socket is released
        // when the client is dropped.
        debug!("closing client for {}", self.ip);
        Ok(())
    }
}

/// Production [`Connect`] implementation producing [`WizClient`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct WizConnector;

impl Connect for WizConnector {
    type Client = WizClient;

    async fn connect(&self, ip: Ipv4Addr) -> Result<WizClient> {
        WizClient::connect(ip).await
    }
}
