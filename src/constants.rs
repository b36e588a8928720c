//! Colorimetric constants and library defaults
//!
//! This module contains the D65 reference values, nominal L*a*b* ranges,
//! the fixed match-quality policy and the default metadata applied to stored
//! colors.

/// D65 Standard Illuminant Reference
///
/// CIE Standard Illuminant D65 represents average daylight with a correlated
/// color temperature of 6504K. All Lab values in this crate are relative to it.
pub mod d65 {
    /// D65 white point in CIE XYZ color space (Y normalized to 1.0)
    /// Source: CIE 15:2004 Colorimetry, 3rd edition
    pub const WHITE_POINT_XYZ: [f64; 3] = [0.95047, 1.00000, 1.08883];
}

/// Re-export D65 white point at top level for convenience
pub const D65_WHITE_POINT_XYZ: [f64; 3] = d65::WHITE_POINT_XYZ;

/// sRGB channel scale
pub mod srgb {
    /// Upper bound of an 8-bit channel
    pub const CHANNEL_MAX: f64 = 255.0;
}

/// CIE L*a*b* nominal ranges
pub mod cie {
    /// Nominal L* range
    pub const L_RANGE: (f64, f64) = (0.0, 100.0);

    /// Nominal a*/b* range
    pub const AB_RANGE: (f64, f64) = (-128.0, 127.0);
}

/// Match quality policy
///
/// Fixed thresholds shared by every Delta E method. Each boundary belongs to
/// the stricter band (a Delta E of exactly 1.0 is still Excellent).
pub mod thresholds {
    /// Imperceptible difference
    pub const EXCELLENT_MAX: f64 = 1.0;

    /// Perceptible but acceptable
    pub const GOOD_MAX: f64 = 2.5;

    /// Clearly perceptible
    pub const FAIR_MAX: f64 = 5.0;

    /// Default tolerance for library searches
    pub const DEFAULT_MAX_DELTA_E: f64 = 5.0;

    /// Default number of matches kept per library
    pub const DEFAULT_MAX_RESULTS: usize = 3;

    /// Length of the merged cross-library best-match list
    pub const TOP_MATCHES_OVERALL: usize = 5;
}

/// Metadata defaults applied when a field is omitted
pub mod defaults {
    /// Category for colors added through the store API
    pub const CATEGORY: &str = "General";

    /// Source for colors added through the store API
    pub const SOURCE: &str = "Custom";

    /// Category for CSV rows without a category column
    pub const IMPORT_CATEGORY: &str = "Imported";

    /// Source for CSV rows without a source column
    pub const IMPORT_SOURCE: &str = "CSV Import";

    /// Category for samples added from an analysis
    pub const SAMPLE_CATEGORY: &str = "User Samples";

    /// Source for samples added from an analysis
    pub const SAMPLE_SOURCE: &str = "StampZ Analysis";

    /// Source recorded for the seeded standard libraries
    pub const STANDARD_SOURCE: &str = "StampZ Standard";
}

/// On-disk layout of the library store
pub mod storage {
    /// Directory under the data dir holding per-library databases
    pub const LIBRARIES_DIR: &str = "color_libraries";

    /// Suffix appended to the sanitized library name
    pub const DB_FILE_SUFFIX: &str = "_library.db";

    /// Environment variable overriding the base data directory
    pub const DATA_DIR_ENV: &str = "STAMPZ_DATA_DIR";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d65_constants() {
        assert!((d65::WHITE_POINT_XYZ[0] - 0.95047).abs() < 1e-9);
        assert!((d65::WHITE_POINT_XYZ[1] - 1.00000).abs() < 1e-9);
        assert!((d65::WHITE_POINT_XYZ[2] - 1.08883).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_ordering() {
        assert!(thresholds::EXCELLENT_MAX < thresholds::GOOD_MAX);
        assert!(thresholds::GOOD_MAX < thresholds::FAIR_MAX);
        assert!(thresholds::DEFAULT_MAX_RESULTS <= thresholds::TOP_MATCHES_OVERALL);
    }
}
