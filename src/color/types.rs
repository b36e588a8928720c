//! Plain color value types shared across the crate

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{constants::srgb::CHANNEL_MAX, LibraryError, Result};

/// CIE L*a*b* color (D65)
///
/// L* is nominally in [0, 100], a* and b* nominally in [-128, 127]. Values
/// outside the nominal range are representable; they are only flagged when
/// imported.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LabColor {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl LabColor {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Components as an `(L*, a*, b*)` tuple
    pub fn to_tuple(self) -> (f64, f64, f64) {
        (self.l, self.a, self.b)
    }

    /// True when every component lies inside the nominal Lab range
    pub fn is_nominal(&self) -> bool {
        use crate::constants::cie::{AB_RANGE, L_RANGE};

        (L_RANGE.0..=L_RANGE.1).contains(&self.l)
            && (AB_RANGE.0..=AB_RANGE.1).contains(&self.a)
            && (AB_RANGE.0..=AB_RANGE.1).contains(&self.b)
    }
}

impl From<(f64, f64, f64)> for LabColor {
    fn from((l, a, b): (f64, f64, f64)) -> Self {
        Self::new(l, a, b)
    }
}

impl fmt::Display for LabColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L*a*b*({:.2}, {:.2}, {:.2})", self.l, self.a, self.b)
    }
}

impl From<LabColor> for palette::Lab<palette::white_point::D65, f64> {
    fn from(color: LabColor) -> Self {
        palette::Lab::new(color.l, color.a, color.b)
    }
}

impl From<palette::Lab<palette::white_point::D65, f64>> for LabColor {
    fn from(color: palette::Lab<palette::white_point::D65, f64>) -> Self {
        Self::new(color.l, color.a, color.b)
    }
}

/// sRGB color with channels on the 0-255 scale
///
/// Channels are floats because sampled colors are pixel averages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RgbColor {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Copy with every channel clamped to [0, 255]
    pub fn clamped(self) -> Self {
        let clamp = |c: f64| if c.is_nan() { 0.0 } else { c.clamp(0.0, CHANNEL_MAX) };
        Self::new(clamp(self.r), clamp(self.g), clamp(self.b))
    }

    /// Channels as an `(r, g, b)` tuple
    pub fn to_tuple(self) -> (f64, f64, f64) {
        (self.r, self.g, self.b)
    }

    /// Convert to hexadecimal color string (e.g., "#FF0000")
    pub fn to_hex(&self) -> String {
        let c = self.clamped();
        let r = c.r.round() as u8;
        let g = c.g.round() as u8;
        let b = c.b.round() as u8;
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }

    /// Parse hexadecimal color string ("#FF0000" or "FF0000")
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the string is not six hex digits
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(LibraryError::invalid_parameter("hex", hex));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map(f64::from)
                .map_err(|_| LibraryError::invalid_parameter("hex", hex))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl From<(f64, f64, f64)> for RgbColor {
    fn from((r, g, b): (f64, f64, f64)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<[u8; 3]> for RgbColor {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(f64::from(r), f64::from(g), f64::from(b))
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({:.2}, {:.2}, {:.2})", self.r, self.g, self.b)
    }
}

/// A color given in exactly one authoritative form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "space", rename_all = "lowercase")]
pub enum ColorInput {
    Lab(LabColor),
    Rgb(RgbColor),
}

impl From<LabColor> for ColorInput {
    fn from(lab: LabColor) -> Self {
        ColorInput::Lab(lab)
    }
}

impl From<RgbColor> for ColorInput {
    fn from(rgb: RgbColor) -> Self {
        ColorInput::Rgb(rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex() {
        assert_eq!(RgbColor::new(255.0, 0.0, 0.0).to_hex(), "#FF0000");
        assert_eq!(RgbColor::new(0.0, 255.0, 0.0).to_hex(), "#00FF00");
        assert_eq!(RgbColor::new(0.0, 0.0, 255.0).to_hex(), "#0000FF");
        // Averages round, out-of-range channels clamp
        assert_eq!(RgbColor::new(127.6, -4.0, 300.0).to_hex(), "#8000FF");
    }

    #[test]
    fn test_from_hex() {
        let red = RgbColor::from_hex("#FF0000").unwrap();
        assert_eq!(red, RgbColor::new(255.0, 0.0, 0.0));

        let green = RgbColor::from_hex("00ff00").unwrap(); // Test without #
        assert_eq!(green, RgbColor::new(0.0, 255.0, 0.0));
    }

    #[test]
    fn test_from_hex_invalid() {
        assert!(RgbColor::from_hex("#FF").is_err()); // Too short
        assert!(RgbColor::from_hex("#GGGGGG").is_err()); // Invalid chars
        assert!(RgbColor::from_hex("#ÄÄÄ").is_err()); // Multi-byte chars
    }

    #[test]
    fn test_lab_nominal_range() {
        assert!(LabColor::new(50.0, 20.0, -30.0).is_nominal());
        assert!(!LabColor::new(101.0, 0.0, 0.0).is_nominal());
        assert!(!LabColor::new(50.0, 0.0, -130.0).is_nominal());
    }

    #[test]
    fn test_color_input_serialization() {
        let input = ColorInput::Lab(LabColor::new(62.0, 70.0, 65.0));
        let json = serde_json::to_string(&input).unwrap();
        assert!(json.contains("\"space\":\"lab\""));
        let back: ColorInput = serde_json::from_str(&json).unwrap();
        assert_eq!(input, back);
    }
}
