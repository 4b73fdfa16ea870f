//! Color conversions between OpenCV's HSV scale and display colors
//!
//! OpenCV stores 8-bit HSV as H in [0, 180), S and V in [0, 255]. These
//! helpers move between that scale, `palette` colors and hex strings.

use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};

use crate::{AnalysisError, Result};

/// An HSV triple on OpenCV's 8-bit scale (H 0-180, S/V 0-255)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsvColor {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl HsvColor {
    pub fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }

    /// Convert to a palette HSV color (hue in degrees, s/v in 0-1)
    pub fn to_palette(self) -> Hsv {
        Hsv::new(
            (self.h * 2.0) as f32,
            (self.s / 255.0).clamp(0.0, 1.0) as f32,
            (self.v / 255.0).clamp(0.0, 1.0) as f32,
        )
    }

    /// Convert to sRGB for display
    pub fn to_srgb(self) -> Srgb {
        let srgb = Srgb::from_color(self.to_palette());
        Srgb::new(
            srgb.red.clamp(0.0, 1.0),
            srgb.green.clamp(0.0, 1.0),
            srgb.blue.clamp(0.0, 1.0),
        )
    }

    /// Hex representation of the displayed color, e.g. "#22BB22"
    pub fn to_hex(self) -> String {
        srgb_to_hex(self.to_srgb())
    }
}

/// Convert sRGB to hexadecimal string (e.g., "#FF0000")
pub fn srgb_to_hex(srgb: Srgb) -> String {
    let rgb = srgb.into_format::<u8>();
    format!("#{:02X}{:02X}{:02X}", rgb.red, rgb.green, rgb.blue)
}

/// Parse a hexadecimal color string ("#RRGGBB" or "RRGGBB") to sRGB
pub fn hex_to_srgb(hex: &str) -> Result<Srgb> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(AnalysisError::invalid_parameter("hex", hex));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| AnalysisError::invalid_parameter("hex", hex))
    };

    Ok(Srgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?).into_format::<f32>())
}
