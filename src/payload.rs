//! Configuration payload for Wiz lights.

use serde::{Deserialize, Serialize};

use crate::types::{Brightness, Color, PowerMode, White};

/// A configuration payload to send to Wiz lights.
///
/// Payloads can combine multiple lighting attributes (power state, color,
/// white channel intensity, brightness) that will be applied to the bulb in
/// a single command.
///
/// # Creating Payloads
///
/// You can create a payload in two ways:
///
/// 1. **From a single attribute** using the [`From`] trait:
///    ```
///    use wiz_fanout::{Payload, PowerMode};
///    let payload = Payload::from(&PowerMode::On);
///    ```
///
/// 2. **Builder pattern** for combining multiple attributes:
///    ```
///    use std::str::FromStr;
///    use wiz_fanout::{Payload, Brightness, Color};
///    let mut payload = Payload::new();
///    payload.brightness(&Brightness::create(80).unwrap());
///    payload.color(&Color::from_str("255,128,0").unwrap());
///    ```
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Payload {
    pub(crate) state: Option<bool>,
    pub(crate) dimming: Option<u8>,
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

impl Payload {
    /// Create a new empty payload.
    ///
    /// At least one attribute must be set for the payload to be valid.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiz_fanout::Payload;
    ///
    /// let payload = Payload::new();
    /// assert_eq!(payload.is_valid(), false);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this payload contains at least one attribute.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiz_fanout::{Payload, White};
    ///
    /// let mut payload = Payload::new();
    /// assert_eq!(payload.is_valid(), false);
    ///
    /// payload.warm(&White::create(50).unwrap());
    /// assert_eq!(payload.is_valid(), true);
    /// ```
    pub fn is_valid(&self) -> bool {
        self.state.is_some()
            || self.dimming.is_some()
            || (self.red.is_some() && self.green.is_some() && self.blue.is_some())
            || self.cool.is_some()
            || self.warm.is_some()
    }

    /// Set the power state.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiz_fanout::{Payload, PowerMode};
    ///
    /// let mut payload = Payload::new();
    /// payload.power(&PowerMode::On);
    /// assert_eq!(payload.is_valid(), true);
    /// ```
    pub fn power(&mut self, power: &PowerMode) {
        self.state = Some(power.emitting());
    }

    /// Set the brightness level.
    pub fn brightness(&mut self, brightness: &Brightness) {
        self.dimming = Some(brightness.value);
    }

    /// Set the RGB color.
    ///
    /// The bulb only switches to color rendering while powered, so setting
    /// a color also sets the power state to on.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::str::FromStr;
    /// use wiz_fanout::{Payload, Color};
    ///
    /// let mut payload = Payload::new();
    /// payload.color(&Color::from_str("255,255,255").unwrap());
    /// assert_eq!(payload.is_valid(), true);
    /// ```
    pub fn color(&mut self, color: &Color) {
        self.state = Some(true);
        self.red = Some(color.red);
        self.green = Some(color.green);
        self.blue = Some(color.blue);
    }

    /// Set the cool white intensity (also powers the bulb on).
    ///
    /// # Examples
    ///
    /// ```
    /// use wiz_fanout::{Payload, White};
    ///
    /// let mut payload = Payload::new();
    /// payload.cool(&White::create(50).unwrap());
    /// assert_eq!(payload.is_valid(), true);
    /// ```
    pub fn cool(&mut self, cool: &White) {
        self.state = Some(true);
        self.cool = Some(cool.value);
    }

    /// Set the warm white intensity (also powers the bulb on).
    ///
    /// # Examples
    ///
    /// ```
    /// use wiz_fanout::{Payload, White};
    ///
    /// let mut payload = Payload::new();
    /// payload.warm(&White::create(50).unwrap());
    /// assert_eq!(payload.is_valid(), true);
    /// ```
    pub fn warm(&mut self, warm: &White) {
        self.state = Some(true);
        self.warm = Some(warm.value);
    }

    /// Whether this payload only changes the power state.
    ///
    /// Power-only payloads go over the wire as a `setState` command rather
    /// than `setPilot`.
    pub(crate) fn is_power_only(&self) -> bool {
        self.state.is_some()
            && self.dimming.is_none()
            && self.red.is_none()
            && self.green.is_none()
            && self.blue.is_none()
            && self.cool.is_none()
            && self.warm.is_none()
    }

    pub(crate) fn get_color(&self) -> Option<Color> {
        match (self.red, self.green, self.blue) {
            (Some(r), Some(g), Some(b)) => Some(Color::rgb(r, g, b)),
            _ => None,
        }
    }
}

impl From<&PowerMode> for Payload {
    fn from(power: &PowerMode) -> Self {
        let mut p = Payload::new();
        p.power(power);
        p
    }
}

impl From<&Color> for Payload {
    fn from(color: &Color) -> Self {
        let mut p = Payload::new();
        p.color(color);
        p
    }
}

impl From<&Brightness> for Payload {
    fn from(brightness: &Brightness) -> Self {
        let mut p = Payload::new();
        p.brightness(brightness);
        p
    }
}
