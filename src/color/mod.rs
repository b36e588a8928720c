//! Color value types, conversion and difference
//!
//! This module handles the sRGB <-> CIE L*a*b* conversions and the
//! perceptual Delta E metrics used for library matching.

pub mod conversion;
pub mod difference;
pub mod types;

pub use conversion::ColorConverter;
pub use difference::{
    detect_strategy, precise_backend_available, select_strategy, Cie76, DeltaEMethod,
    DeltaEPreference, DeltaEStrategy,
};
#[cfg(feature = "ciede2000")]
pub use difference::Ciede2000;
pub use types::{ColorInput, LabColor, RgbColor};
