//! The action applied uniformly to every target of a run.

use std::fmt;

use crate::client::DeviceClient;
use crate::errors::Error;
use crate::payload::Payload;
use crate::status::DeviceState;
use crate::types::{Brightness, Color, PowerMode, White};

type Result<T> = std::result::Result<T, Error>;

/// One device action, supplied once per run and applied to every target.
///
/// # Examples
///
/// ```
/// use wiz_fanout::{Color, Operation};
///
/// let op = Operation::SetColor {
///     color: Color::rgb(255, 0, 0),
///     brightness: None,
/// };
/// assert_eq!(op.to_string(), "set color");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Power the bulb on.
    TurnOn,
    /// Power the bulb off.
    TurnOff,
    /// Set an RGB color, optionally with a brightness level.
    SetColor {
        color: Color,
        brightness: Option<Brightness>,
    },
    /// Set the warm white channel intensity.
    SetWarmWhite(White),
    /// Set the cold white channel intensity.
    SetColdWhite(White),
    /// Retrieve the bulb's full current state.
    QueryState,
}

impl Operation {
    /// Run this operation against one connected client.
    pub(crate) async fn apply<C: DeviceClient>(&self, client: &C) -> Result<DeviceState> {
        match self.to_payload() {
            Some(payload) => client.apply_state(&payload).await,
            None => client.query_state().await,
        }
    }

    /// The pilot spec this operation sends, or `None` for a status query.
    pub fn to_payload(&self) -> Option<Payload> {
        match self {
            Operation::TurnOn => Some(Payload::from(&PowerMode::On)),
            Operation::TurnOff => Some(Payload::from(&PowerMode::Off)),
            Operation::SetColor { color, brightness } => {
                let mut payload = Payload::from(color);
                if let Some(brightness) = brightness {
                    payload.brightness(brightness);
                }
                Some(payload)
            }
            Operation::SetWarmWhite(white) => {
                let mut payload = Payload::new();
                payload.warm(white);
                Some(payload)
            }
            Operation::SetColdWhite(white) => {
                let mut payload = Payload::new();
                payload.cool(white);
                Some(payload)
            }
            Operation::QueryState => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::TurnOn => "turn on",
            Operation::TurnOff => "turn off",
            Operation::SetColor { .. } => "set color",
            Operation::SetWarmWhite(_) => "set warm white",
            Operation::SetColdWhite(_) => "set cold white",
            Operation::QueryState => "query state",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_operations_build_power_only_payloads() {
        let on = Operation::TurnOn.to_payload().unwrap();
        assert!(on.is_power_only());
        assert_eq!(on.state, Some(true));

        let off = Operation::TurnOff.to_payload().unwrap();
        assert!(off.is_power_only());
        assert_eq!(off.state, Some(false));
    }

    #[test]
    fn test_color_with_brightness() {
        let op = Operation::SetColor {
            color: Color::rgb(1, 2, 3),
            brightness: Brightness::create(50),
        };
        let payload = op.to_payload().unwrap();
        assert_eq!(payload.get_color(), Some(Color::rgb(1, 2, 3)));
        assert_eq!(payload.dimming, Some(50));
    }

    #[test]
    fn test_query_has_no_payload() {
        assert!(Operation::QueryState.to_payload().is_none());
    }
}
