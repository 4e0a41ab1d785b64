//! Value types for light control parameters.

mod brightness;
mod color;
mod power;
mod white;

pub use brightness::Brightness;
pub use color::Color;
pub use power::PowerMode;
pub use white::White;
