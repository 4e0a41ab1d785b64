//! Power mode for light control.

use serde::{Deserialize, Serialize};

/// Power state for a light.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum PowerMode {
    /// Turn the light on
    On,
    /// Turn the light off
    Off,
}

impl PowerMode {
    /// Whether this mode leaves the light emitting.
    pub fn emitting(&self) -> bool {
        matches!(self, PowerMode::On)
    }
}
