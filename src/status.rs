//! Device state as reported by a bulb.

use serde::{Deserialize, Serialize};

use crate::payload::Payload;
use crate::types::Color;

/// The state of a single bulb.
///
/// Produced either by querying the bulb (`getPilot`), in which case the
/// identity fields (`mac`, `rssi`) are populated from the reply, or as the
/// echo of a successfully applied [`Payload`], in which case only the
/// attributes that were just set are present.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeviceState {
    pub(crate) mac: Option<String>,
    pub(crate) rssi: Option<i32>,
    #[serde(rename = "state")]
    pub(crate) emitting: bool,
    #[serde(rename = "sceneId")]
    pub(crate) scene: Option<u16>,
    pub(crate) dimming: Option<u8>,
    pub(crate) temp: Option<u16>,
    #[serde(rename = "r")]
    pub(crate) red: Option<u8>,
    #[serde(rename = "g")]
    pub(crate) green: Option<u8>,
    #[serde(rename = "b")]
    pub(crate) blue: Option<u8>,
    #[serde(rename = "c")]
    pub(crate) cool: Option<u8>,
    #[serde(rename = "w")]
    pub(crate) warm: Option<u8>,
}

impl DeviceState {
    /// MAC address, if the state came from a live query.
    pub fn mac(&self) -> Option<&str> {
        self.mac.as_deref()
    }

    /// Signal strength, if the state came from a live query.
    pub fn rssi(&self) -> Option<i32> {
        self.rssi
    }

    /// Check if the light is emitting.
    pub fn emitting(&self) -> bool {
        self.emitting
    }

    /// RGB color, when all three components are known.
    pub fn color(&self) -> Option<Color> {
        match (self.red, self.green, self.blue) {
            (Some(r), Some(g), Some(b)) => Some(Color::rgb(r, g, b)),
            _ => None,
        }
    }

    /// Brightness percentage, if known.
    pub fn dimming(&self) -> Option<u8> {
        self.dimming
    }

    /// Cool white channel intensity, if known.
    pub fn cool(&self) -> Option<u8> {
        self.cool
    }

    /// Warm white channel intensity, if known.
    pub fn warm(&self) -> Option<u8> {
        self.warm
    }
}

impl From<&Payload> for DeviceState {
    fn from(payload: &Payload) -> Self {
        DeviceState {
            mac: None,
            rssi: None,
            emitting: payload.state.unwrap_or(true),
            scene: None,
            dimming: payload.dimming,
            temp: None,
            red: payload.red,
            green: payload.green,
            blue: payload.blue,
            cool: payload.cool,
            warm: payload.warm,
        }
    }
}

/// Reply envelope for a `getPilot` query.
#[derive(Debug, Deserialize)]
pub(crate) struct PilotReply {
    pub env: String,
    pub method: String,
    pub result: DeviceState,
}

/// Reply envelope for `setPilot`/`setState` commands.
#[derive(Debug, Deserialize)]
pub(crate) struct SetReply {
    pub result: SetResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetResult {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pilot_reply() {
        let raw = json!({
            "method": "getPilot",
            "env": "pro",
            "result": {
                "mac": "a8bb5006033d",
                "rssi": -60,
                "state": true,
                "sceneId": 0,
                "r": 255,
                "g": 127,
                "b": 0,
                "dimming": 13,
            }
        });
        let reply: PilotReply = serde_json::from_value(raw).unwrap();
        assert_eq!(reply.method, "getPilot");
        assert!(reply.result.emitting());
        assert_eq!(reply.result.color(), Some(Color::rgb(255, 127, 0)));
        assert_eq!(reply.result.dimming(), Some(13));
        assert_eq!(reply.result.mac(), Some("a8bb5006033d"));
        assert!(reply.result.warm().is_none());
    }

    #[test]
    fn test_state_from_payload_echo() {
        let mut payload = Payload::new();
        payload.color(&Color::rgb(1, 2, 3));
        let state = DeviceState::from(&payload);
        assert!(state.emitting());
        assert_eq!(state.color(), Some(Color::rgb(1, 2, 3)));
        assert!(state.mac().is_none());
    }
}
