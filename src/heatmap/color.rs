//! Blue → cyan → green → yellow → red gradient used for cells and hotspots.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Maps a normalized density to a color along four linear segments with
    /// stops at 0.0, 0.25, 0.5, 0.75 and 1.0.
    ///
    /// Values outside `[0, 1]` are clamped and NaN is treated as zero.
    pub fn from_value(value: f64) -> Self {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };

        if value < 0.25 {
            Self::new(0, channel(value * 4.0), 255)
        } else if value < 0.5 {
            Self::new(0, 255, channel(1.0 - (value - 0.25) * 4.0))
        } else if value < 0.75 {
            Self::new(channel((value - 0.5) * 4.0), 255, 0)
        } else {
            Self::new(255, channel(1.0 - (value - 0.75) * 4.0), 0)
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn channel(fraction: f64) -> u8 {
    (fraction * 255.0).floor() as u8
}
