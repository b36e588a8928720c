//! Ranked matching of a sample color against one library
//!
//! Every library color is scored with the converter's Delta E strategy,
//! filtered by a tolerance, sorted best first and truncated. An empty result
//! is the normal "no match" signal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    color::{ColorConverter, ColorInput, DeltaEMethod, LabColor, RgbColor},
    constants::thresholds,
    library::{ColorLibrary, LibraryColor},
    LibraryError, Result,
};

/// Quality band of a match, derived only from its Delta E
///
/// Boundaries belong to the stricter band: 1.0 is Excellent, 2.5 is Good,
/// 5.0 is Fair. The same thresholds apply to both Delta E methods; CIE76
/// distances run larger, so it classifies more conservatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchQuality {
    /// Imperceptible
    Excellent,
    /// Perceptible but acceptable
    Good,
    /// Clearly perceptible
    Fair,
    Poor,
}

impl MatchQuality {
    pub fn from_delta_e(delta_e: f64) -> Self {
        if delta_e <= thresholds::EXCELLENT_MAX {
            MatchQuality::Excellent
        } else if delta_e <= thresholds::GOOD_MAX {
            MatchQuality::Good
        } else if delta_e <= thresholds::FAIR_MAX {
            MatchQuality::Fair
        } else {
            MatchQuality::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchQuality::Excellent => "Excellent",
            MatchQuality::Good => "Good",
            MatchQuality::Fair => "Fair",
            MatchQuality::Poor => "Poor",
        }
    }
}

impl fmt::Display for MatchQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One library color scored against a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMatch {
    pub library_color: LibraryColor,
    pub delta_e: f64,
    pub quality: MatchQuality,
    pub library_name: String,
    /// Delta E method that produced `delta_e`
    pub method: DeltaEMethod,
}

/// Whether a comparison found anything within tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    MatchesFound,
    None,
}

/// The sample as compared, in both color forms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleColor {
    pub lab: LabColor,
    pub rgb: RgbColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonStatistics {
    pub total_library_colors: usize,
    pub matches_found: usize,
    pub threshold_used: f64,
    pub best_match_delta_e: Option<f64>,
}

/// Summary of one sample compared against a whole library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryComparison {
    pub sample: SampleColor,
    pub matches: Vec<ColorMatch>,
    pub statistics: ComparisonStatistics,
    pub result: MatchOutcome,
}

/// Matches samples against a single library
pub struct ColorMatcher<'a> {
    library: &'a ColorLibrary,
    converter: &'a ColorConverter,
}

impl<'a> ColorMatcher<'a> {
    /// Match using the library's own converter
    pub fn new(library: &'a ColorLibrary) -> Self {
        Self {
            library,
            converter: library.converter(),
        }
    }

    /// Match using a shared converter, so several libraries are scored with
    /// one Delta E method
    pub fn with_converter(library: &'a ColorLibrary, converter: &'a ColorConverter) -> Self {
        Self { library, converter }
    }

    /// Lab and display RGB of a sample
    pub fn sample_color(&self, sample: ColorInput) -> SampleColor {
        match sample {
            ColorInput::Lab(lab) => SampleColor {
                lab,
                rgb: self.converter.lab_to_rgb(lab),
            },
            ColorInput::Rgb(rgb) => {
                let rgb = rgb.clamped();
                SampleColor {
                    lab: self.converter.rgb_to_lab(rgb),
                    rgb,
                }
            }
        }
    }

    /// Library colors within `max_delta_e` of the sample, best first
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a negative or NaN tolerance, or
    /// `Storage` if the library cannot be read
    pub fn find_closest_matches(
        &self,
        sample: impl Into<ColorInput>,
        max_delta_e: f64,
        max_results: usize,
    ) -> Result<Vec<ColorMatch>> {
        let sample_lab = self.sample_color(sample.into()).lab;
        self.matches_for_lab(sample_lab, max_delta_e, max_results)
    }

    fn matches_for_lab(
        &self,
        sample_lab: LabColor,
        max_delta_e: f64,
        max_results: usize,
    ) -> Result<Vec<ColorMatch>> {
        if max_delta_e.is_nan() || max_delta_e < 0.0 {
            return Err(LibraryError::invalid_parameter("max_delta_e", max_delta_e));
        }

        let method = self.converter.delta_e_method();
        let mut matches: Vec<ColorMatch> = self
            .library
            .get_all_colors(None)?
            .into_iter()
            .filter_map(|color| {
                let delta_e = self.converter.delta_e(sample_lab, color.lab);
                (delta_e <= max_delta_e).then(|| ColorMatch {
                    library_color: color,
                    delta_e,
                    quality: MatchQuality::from_delta_e(delta_e),
                    library_name: self.library.name().to_string(),
                    method,
                })
            })
            .collect();

        matches.sort_by(|a, b| a.delta_e.total_cmp(&b.delta_e));
        matches.truncate(max_results);
        Ok(matches)
    }

    /// Compare a sample against the whole library
    ///
    /// Keeps the top three matches within `threshold`.
    pub fn compare_sample_to_library(
        &self,
        sample: impl Into<ColorInput>,
        threshold: f64,
    ) -> Result<LibraryComparison> {
        let sample = self.sample_color(sample.into());
        let matches = self.matches_for_lab(sample.lab, threshold, thresholds::DEFAULT_MAX_RESULTS)?;
        let total_library_colors = self.library.get_color_count()?;

        let best_match_delta_e = matches.first().map(|m| m.delta_e);
        let result = if matches.is_empty() {
            MatchOutcome::None
        } else {
            MatchOutcome::MatchesFound
        };

        Ok(LibraryComparison {
            sample,
            statistics: ComparisonStatistics {
                total_library_colors,
                matches_found: matches.len(),
                threshold_used: threshold,
                best_match_delta_e,
            },
            matches,
            result,
        })
    }
}
