//! # Stamp Colors
//!
//! Color library matching for philatelic color analysis.
//!
//! This library provides:
//! - sRGB <-> CIE L*a*b* conversion (D65) with selectable Delta E metrics
//! - Persisted, named reference-color libraries with CSV import/export
//! - Ranked matching of a sampled color against one or many libraries
//!
//! ## Example
//!
//! ```rust,no_run
//! use stamp_colors::{create_standard_libraries, LabColor, LibraryIntegration};
//! use std::path::Path;
//!
//! let dir = Path::new("data/color_libraries");
//! create_standard_libraries(dir)?;
//!
//! let mut integration = LibraryIntegration::new(dir);
//! integration.load_library("philatelic_colors")?;
//!
//! let result = integration.analyze_sample_against_libraries(
//!     LabColor::new(61.0, 69.0, 64.0),
//!     None,
//!     5.0,
//!     3,
//! )?;
//! if let Some(best) = result.best_match() {
//!     println!("{} ({}, dE {:.2})", best.library_color.name, best.quality, best.delta_e);
//! }
//! # Ok::<(), stamp_colors::LibraryError>(())
//! ```

pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod integration;
pub mod library;
pub mod matching;
pub mod standard;

pub use color::{ColorConverter, ColorInput, DeltaEMethod, DeltaEPreference, LabColor, RgbColor};
pub use config::LibraryConfig;
pub use error::{LibraryError, NameRule, Result};
pub use integration::{
    quick_analysis, LibraryIntegration, NewSample, SampleAnalysisResult, SampleMetadata,
    WorkflowSummary,
};
pub use library::{ColorLibrary, ColorUpdate, LibraryColor, NewLibraryColor};
pub use matching::{ColorMatch, ColorMatcher, LibraryComparison, MatchOutcome, MatchQuality};
pub use standard::create_standard_libraries;
