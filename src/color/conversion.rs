//! Color space conversion utilities
//!
//! Provides the sRGB <-> CIE L*a*b* path used throughout the crate, on top of
//! `palette`:
//! - sRGB (0-255) to linear RGB to CIE XYZ (D65)
//! - XYZ to L*a*b* relative to the D65 white point
//! - The inverse, with RGB clamped to the displayable gamut
//!
//! The converter also carries the session's Delta E strategy so that every
//! comparison made through one converter uses the same method.

use std::sync::Arc;

use palette::{convert::FromColorUnclamped, white_point::D65, Lab, LinSrgb, Srgb, Xyz};

use crate::{
    color::{
        difference::{select_strategy, DeltaEMethod, DeltaEPreference, DeltaEStrategy},
        LabColor, RgbColor,
    },
    constants::srgb::CHANNEL_MAX,
    Result,
};

/// Color converter with a fixed Delta E strategy
#[derive(Debug, Clone)]
pub struct ColorConverter {
    difference: Arc<dyn DeltaEStrategy>,
}

impl Default for ColorConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorConverter {
    /// Create a converter using the most precise available Delta E method
    pub fn new() -> Self {
        Self {
            difference: crate::color::difference::detect_strategy(),
        }
    }

    /// Create a converter for an explicit method preference
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the preferred backend is not compiled in
    pub fn with_preference(preference: DeltaEPreference) -> Result<Self> {
        Ok(Self {
            difference: select_strategy(preference)?,
        })
    }

    /// Create a converter around an existing strategy
    pub fn with_strategy(difference: Arc<dyn DeltaEStrategy>) -> Self {
        Self { difference }
    }

    /// Delta E method used by this converter
    pub fn delta_e_method(&self) -> DeltaEMethod {
        self.difference.method()
    }

    /// Convert RGB (0-255) to Lab color space
    ///
    /// Channels outside [0, 255] are clamped first.
    ///
    /// # Returns
    ///
    /// Lab color relative to D65
    pub fn rgb_to_lab(&self, rgb: RgbColor) -> LabColor {
        self.xyz_to_lab(self.rgb_to_xyz(rgb))
    }

    /// Convert Lab to RGB (0-255)
    ///
    /// Not every Lab point is displayable; the result is clamped to the sRGB
    /// gamut.
    pub fn lab_to_rgb(&self, lab: LabColor) -> RgbColor {
        self.xyz_to_rgb(self.lab_to_xyz(lab))
    }

    /// Convert RGB (0-255) to CIE XYZ (Y of white = 1.0)
    pub fn rgb_to_xyz(&self, rgb: RgbColor) -> [f64; 3] {
        let rgb = rgb.clamped();
        let encoded = Srgb::new(rgb.r / CHANNEL_MAX, rgb.g / CHANNEL_MAX, rgb.b / CHANNEL_MAX);
        let linear: LinSrgb<f64> = encoded.into_linear();
        let xyz = Xyz::<D65, f64>::from_color_unclamped(linear);
        [xyz.x, xyz.y, xyz.z]
    }

    /// Convert CIE XYZ to Lab relative to D65
    pub fn xyz_to_lab(&self, [x, y, z]: [f64; 3]) -> LabColor {
        Lab::<D65, f64>::from_color_unclamped(Xyz::<D65, f64>::new(x, y, z)).into()
    }

    /// Convert Lab relative to D65 to CIE XYZ
    pub fn lab_to_xyz(&self, lab: LabColor) -> [f64; 3] {
        let xyz = Xyz::<D65, f64>::from_color_unclamped(Lab::<D65, f64>::from(lab));
        [xyz.x, xyz.y, xyz.z]
    }

    /// Convert CIE XYZ to RGB (0-255), clamped to gamut
    pub fn xyz_to_rgb(&self, xyz: [f64; 3]) -> RgbColor {
        let srgb = unclamped_srgb(xyz);
        RgbColor::new(
            srgb.red * CHANNEL_MAX,
            srgb.green * CHANNEL_MAX,
            srgb.blue * CHANNEL_MAX,
        )
        .clamped()
    }

    /// Check if a Lab color is within sRGB gamut
    ///
    /// # Returns
    ///
    /// true if the color maps to sRGB without clamping (to within rounding)
    pub fn is_in_srgb_gamut(&self, lab: LabColor) -> bool {
        const TOLERANCE: f64 = 1e-6;
        let srgb = unclamped_srgb(self.lab_to_xyz(lab));
        [srgb.red, srgb.green, srgb.blue]
            .iter()
            .all(|c| (-TOLERANCE..=1.0 + TOLERANCE).contains(c))
    }

    /// Compute Delta E (color difference) between two Lab colors
    ///
    /// Uses the converter's strategy; see [`ColorConverter::delta_e_method`].
    pub fn delta_e(&self, lab1: LabColor, lab2: LabColor) -> f64 {
        self.difference.delta_e(lab1, lab2)
    }
}

/// Encoded sRGB on the [0, 1] scale, possibly out of range
fn unclamped_srgb([x, y, z]: [f64; 3]) -> Srgb<f64> {
    let linear = LinSrgb::<f64>::from_color_unclamped(Xyz::<D65, f64>::new(x, y, z));
    Srgb::from_linear(linear)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::difference::Cie76;

    fn assert_lab_close(actual: LabColor, expected: (f64, f64, f64), tolerance: f64) {
        assert!(
            (actual.l - expected.0).abs() < tolerance
                && (actual.a - expected.1).abs() < tolerance
                && (actual.b - expected.2).abs() < tolerance,
            "expected {:?}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_rgb_to_lab_black() {
        let converter = ColorConverter::new();
        let lab = converter.rgb_to_lab(RgbColor::new(0.0, 0.0, 0.0));
        assert_lab_close(lab, (0.0, 0.0, 0.0), 1e-9);
    }

    #[test]
    fn test_rgb_to_lab_white() {
        let converter = ColorConverter::new();
        let lab = converter.rgb_to_lab(RgbColor::new(255.0, 255.0, 255.0));
        assert_lab_close(lab, (100.0, 0.0, 0.0), 0.01);
    }

    #[test]
    fn test_rgb_to_lab_reference_primaries() {
        let converter = ColorConverter::new();
        let red = converter.rgb_to_lab(RgbColor::new(255.0, 0.0, 0.0));
        assert_lab_close(red, (53.24, 80.09, 67.20), 0.01);

        let green = converter.rgb_to_lab(RgbColor::new(0.0, 255.0, 0.0));
        assert_lab_close(green, (87.73, -86.18, 83.18), 0.01);

        let blue = converter.rgb_to_lab(RgbColor::new(0.0, 0.0, 255.0));
        assert_lab_close(blue, (32.30, 79.19, -107.86), 0.01);
    }

    #[test]
    fn test_lab_to_rgb_clamps_out_of_gamut() {
        let converter = ColorConverter::new();
        let rgb = converter.lab_to_rgb(LabColor::new(50.0, 120.0, -120.0));
        for c in [rgb.r, rgb.g, rgb.b] {
            assert!((0.0..=255.0).contains(&c));
        }
    }

    #[test]
    fn test_input_channels_clamped() {
        let converter = ColorConverter::new();
        let over = converter.rgb_to_lab(RgbColor::new(300.0, -20.0, 0.0));
        let red = converter.rgb_to_lab(RgbColor::new(255.0, 0.0, 0.0));
        assert_eq!(over, red);
    }

    #[test]
    fn test_extremes_round_trip() {
        let converter = ColorConverter::new();
        for rgb in [RgbColor::new(0.0, 0.0, 0.0), RgbColor::new(255.0, 255.0, 255.0)] {
            let back = converter.lab_to_rgb(converter.rgb_to_lab(rgb));
            assert!((back.r - rgb.r).abs() <= 1.0);
            assert!((back.g - rgb.g).abs() <= 1.0);
            assert!((back.b - rgb.b).abs() <= 1.0);
        }
    }

    #[test]
    fn test_dark_values_use_linear_segment() {
        let converter = ColorConverter::new();
        let rgb = RgbColor::new(3.0, 2.0, 1.0);
        let lab = converter.rgb_to_lab(rgb);
        assert!(lab.l < 2.0);
        let back = converter.lab_to_rgb(lab);
        assert!((back.r - 3.0).abs() < 1e-3);
        assert!((back.g - 2.0).abs() < 1e-3);
        assert!((back.b - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_gamut_checking() {
        let converter = ColorConverter::new();
        assert!(converter.is_in_srgb_gamut(LabColor::new(50.0, 0.0, 0.0)));
        assert!(converter.is_in_srgb_gamut(converter.rgb_to_lab(RgbColor::new(255.0, 0.0, 0.0))));
        assert!(!converter.is_in_srgb_gamut(LabColor::new(50.0, 120.0, -120.0)));
    }

    #[test]
    fn test_white_maps_to_d65_white_point() {
        let converter = ColorConverter::new();
        let xyz = converter.rgb_to_xyz(RgbColor::new(255.0, 255.0, 255.0));
        for (actual, expected) in xyz.iter().zip(crate::constants::D65_WHITE_POINT_XYZ) {
            assert!((actual - expected).abs() < 1e-4, "{actual} vs {expected}");
        }
    }

    #[test]
    fn test_xyz_round_trip() {
        let converter = ColorConverter::new();
        let lab = LabColor::new(62.0, 70.0, 65.0);
        let back = converter.xyz_to_lab(converter.lab_to_xyz(lab));
        assert_lab_close(back, lab.to_tuple(), 1e-9);
    }

    #[test]
    fn test_delta_e_uses_configured_strategy() {
        let converter = ColorConverter::with_strategy(Arc::new(Cie76));
        assert_eq!(converter.delta_e_method(), DeltaEMethod::Cie76);

        let lab1 = LabColor::new(50.0, 0.0, 0.0);
        let lab2 = LabColor::new(53.0, 4.0, 0.0);
        assert!((converter.delta_e(lab1, lab2) - 5.0).abs() < 1e-12);
        assert_eq!(converter.delta_e(lab1, lab1), 0.0);
    }
}
