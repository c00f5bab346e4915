//! World-space position and color payload types.
//!
//! The core never tracks positions itself; a `Position` is captured from the
//! host at the moment a distress call is made and forwarded verbatim into the
//! notification payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}:{:.2}:{:.2}", self.x, self.y, self.z)
    }
}

/// An RGB color forwarded to the host's chat and marker systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
}
