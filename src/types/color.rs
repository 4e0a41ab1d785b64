//! RGB color representation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::Error;

/// An RGB color with red, green, and blue components (0-255 each).
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Color {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Color {
    /// Create a color with the given RGB values.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Create a default color (black: 0,0,0).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parse from comma-separated string (e.g., "255,128,0").
    ///
    /// # Examples
    ///
    /// ```
    /// use std::str::FromStr;
    /// use wiz_fanout::Color;
    ///
    /// let color = Color::from_str("255,128,0").unwrap();
    /// assert_eq!(color.red(), 255);
    /// assert_eq!(color.green(), 128);
    /// assert_eq!(color.blue(), 0);
    ///
    /// assert!(Color::from_str("255,128").is_err());
    /// assert!(Color::from_str("255,128,none").is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Error> {
        let parts: Vec<u8> = s
            .split(',')
            .map(|c| c.trim().parse())
            .collect::<Result<_, _>>()
            .map_err(|_| Error::InvalidColorString(s.to_string()))?;
        if parts.len() == 3 {
            Ok(Self::rgb(parts[0], parts[1], parts[2]))
        } else {
            Err(Error::InvalidColorString(s.to_string()))
        }
    }
}
