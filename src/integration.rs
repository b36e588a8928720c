//! Multi-library matching and the "save this sample" workflow
//!
//! `LibraryIntegration` keeps a working set of open libraries, in load order,
//! and scores a sample against all of them with one shared converter, so a
//! single analysis never mixes Delta E methods.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    color::{ColorConverter, DeltaEMethod, LabColor, RgbColor},
    config::LibraryConfig,
    constants::{defaults, thresholds},
    library::{ColorLibrary, LibraryColor, NewLibraryColor, SampleGeometry},
    matching::{ColorMatch, ColorMatcher, MatchQuality},
    standard::{create_standard_libraries, PHILATELIC_COLORS_LIBRARY, BASIC_COLORS_LIBRARY},
    Result,
};

/// The analyzed sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleInfo {
    pub lab: LabColor,
    pub rgb: RgbColor,
    pub analysis_date: DateTime<Utc>,
}

/// One sample scored against every loaded library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleAnalysisResult {
    pub sample_info: SampleInfo,
    /// Matches per library, in load order
    pub library_matches: IndexMap<String, Vec<ColorMatch>>,
    /// All matches merged, best first, at most five
    pub best_matches: Vec<ColorMatch>,
    /// False only when an Excellent match exists
    pub user_action_needed: bool,
    pub method: DeltaEMethod,
}

impl SampleAnalysisResult {
    pub fn best_match(&self) -> Option<&ColorMatch> {
        self.best_matches.first()
    }
}

/// Where a sample came from, folded into the stored description and notes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleMetadata {
    pub image_name: Option<String>,
    /// Index of the sample point within its coordinate template
    pub coordinate_point: Option<u32>,
    /// Pixel position of the sample point
    pub position: Option<(f64, f64)>,
    pub analysis_date: Option<DateTime<Utc>>,
    pub geometry: Option<SampleGeometry>,
}

impl SampleMetadata {
    fn description_suffix(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(image) = &self.image_name {
            parts.push(format!("Image: {image}"));
        }
        if let Some(point) = self.coordinate_point {
            parts.push(format!("Point: {point}"));
        }
        if let Some((x, y)) = self.position {
            parts.push(format!("Position: ({x:.0},{y:.0})"));
        }
        (!parts.is_empty()).then(|| parts.join(" | "))
    }
}

/// Metadata for a sample being saved as a library color
#[derive(Debug, Clone, PartialEq)]
pub struct NewSample {
    pub category: String,
    pub description: String,
    pub source: String,
    pub notes: Option<String>,
    pub metadata: Option<SampleMetadata>,
}

impl Default for NewSample {
    fn default() -> Self {
        Self {
            category: defaults::SAMPLE_CATEGORY.to_string(),
            description: String::new(),
            source: defaults::SAMPLE_SOURCE.to_string(),
            notes: None,
            metadata: None,
        }
    }
}

impl NewSample {
    fn into_library_color(self, name: &str, lab: LabColor) -> NewLibraryColor {
        let suffix = self.metadata.as_ref().and_then(SampleMetadata::description_suffix);
        let description = match suffix {
            Some(suffix) if self.description.is_empty() => suffix,
            Some(suffix) => format!("{} | {}", self.description, suffix),
            None => self.description,
        };

        let notes = self.notes.filter(|n| !n.is_empty());
        let analyzed = self
            .metadata
            .as_ref()
            .and_then(|m| m.analysis_date)
            .map(|date| format!("Analyzed: {}", date.to_rfc3339()));
        let notes = match (notes, analyzed) {
            (Some(notes), Some(analyzed)) => Some(format!("{notes} | {analyzed}")),
            (notes, analyzed) => notes.or(analyzed),
        };

        NewLibraryColor::from_lab(name, lab)
            .description(description)
            .category(self.category)
            .source(self.source)
            .notes(notes)
            .geometry(self.metadata.and_then(|m| m.geometry))
    }
}

/// Whether a batch had anything to analyze
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    NoData,
    Analyzed,
}

/// Batch analysis of measured samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub status: WorkflowStatus,
    pub total_samples: usize,
    pub matched_samples: usize,
    pub unmatched_samples: usize,
    pub match_percentage: f64,
    pub loaded_libraries: Vec<String>,
    pub threshold_used: f64,
    pub analyses: Vec<SampleAnalysisResult>,
    /// Indexes into `analyses` of samples with no match
    pub unmatched: Vec<usize>,
    pub recommendations: Vec<String>,
}

/// Coordinates matching across several open libraries
#[derive(Debug)]
pub struct LibraryIntegration {
    libraries_dir: PathBuf,
    converter: ColorConverter,
    libraries: IndexMap<String, ColorLibrary>,
    max_matches_per_library: usize,
}

impl LibraryIntegration {
    /// Empty working set over `libraries_dir`, with the default Delta E method
    pub fn new(libraries_dir: impl Into<PathBuf>) -> Self {
        Self::with_converter(libraries_dir, ColorConverter::new())
    }

    pub fn with_converter(libraries_dir: impl Into<PathBuf>, converter: ColorConverter) -> Self {
        Self {
            libraries_dir: libraries_dir.into(),
            converter,
            libraries: IndexMap::new(),
            max_matches_per_library: thresholds::DEFAULT_MAX_RESULTS,
        }
    }

    /// Build from configuration and load its default libraries
    ///
    /// A default library that fails to open is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or names an
    /// unavailable Delta E method
    pub fn from_config(config: &LibraryConfig) -> Result<Self> {
        config.validate()?;
        let converter = ColorConverter::with_preference(config.delta_e)?;
        let mut integration = Self::with_converter(config.libraries_dir(), converter);
        integration.max_matches_per_library = config.max_matches_per_library;

        for name in &config.default_libraries {
            if let Err(e) = integration.load_library(name) {
                warn!("Could not load default library '{}': {}", name, e);
            }
        }

        info!(
            "Library integration ready with {} libraries ({})",
            integration.libraries.len(),
            integration.converter.delta_e_method()
        );
        Ok(integration)
    }

    /// Open a library and add it to the working set; loading twice is a no-op
    pub fn load_library(&mut self, name: &str) -> Result<()> {
        if self.libraries.contains_key(name) {
            return Ok(());
        }
        let library = ColorLibrary::open(name, &self.libraries_dir)?;
        self.libraries.insert(name.to_string(), library);
        Ok(())
    }

    /// Drop a library from the working set; true if it was loaded
    pub fn unload_library(&mut self, name: &str) -> bool {
        self.libraries.shift_remove(name).is_some()
    }

    /// Loaded library names, in load order
    pub fn loaded_libraries(&self) -> Vec<&str> {
        self.libraries.keys().map(String::as_str).collect()
    }

    pub fn library(&self, name: &str) -> Option<&ColorLibrary> {
        self.libraries.get(name)
    }

    pub fn library_mut(&mut self, name: &str) -> Option<&mut ColorLibrary> {
        self.libraries.get_mut(name)
    }

    pub fn converter(&self) -> &ColorConverter {
        &self.converter
    }

    pub fn libraries_dir(&self) -> &Path {
        &self.libraries_dir
    }

    /// Match a sample against every loaded library
    ///
    /// Each library contributes up to `max_matches_per_library` matches within
    /// `threshold`; the merged list keeps the best five overall.
    pub fn analyze_sample_against_libraries(
        &self,
        sample_lab: LabColor,
        sample_rgb: Option<RgbColor>,
        threshold: f64,
        max_matches_per_library: usize,
    ) -> Result<SampleAnalysisResult> {
        let rgb = sample_rgb.unwrap_or_else(|| self.converter.lab_to_rgb(sample_lab));

        let mut library_matches = IndexMap::with_capacity(self.libraries.len());
        let mut all_matches = Vec::new();

        for (name, library) in &self.libraries {
            let matches = ColorMatcher::with_converter(library, &self.converter).find_closest_matches(
                sample_lab,
                threshold,
                max_matches_per_library,
            )?;
            debug!("{} match(es) in '{}' for {}", matches.len(), name, sample_lab);
            all_matches.extend(matches.iter().cloned());
            library_matches.insert(name.clone(), matches);
        }

        // Stable, so ties keep library load order
        all_matches.sort_by(|a, b| a.delta_e.total_cmp(&b.delta_e));
        all_matches.truncate(thresholds::TOP_MATCHES_OVERALL);

        let user_action_needed = !all_matches
            .iter()
            .any(|m| m.quality == MatchQuality::Excellent);

        Ok(SampleAnalysisResult {
            sample_info: SampleInfo {
                lab: sample_lab,
                rgb,
                analysis_date: Utc::now(),
            },
            library_matches,
            best_matches: all_matches,
            user_action_needed,
            method: self.converter.delta_e_method(),
        })
    }

    /// Save a sample as a new color, loading the target library if needed
    ///
    /// The name follows [`ColorLibrary::add_color`]: it is validated, and
    /// auto-suffixed on collision. Returns the stored color.
    pub fn add_sample_to_library(
        &mut self,
        library_name: &str,
        sample_lab: LabColor,
        user_name: &str,
        sample: NewSample,
    ) -> Result<LibraryColor> {
        self.load_library(library_name)?;
        let library = self
            .libraries
            .get_mut(library_name)
            .ok_or_else(|| crate::LibraryError::invalid_parameter("library_name", library_name))?;

        let stored = library.add_color(sample.into_library_color(user_name, sample_lab))?;
        info!("Saved sample as '{}' in '{}'", stored.name, library_name);
        Ok(stored)
    }

    /// Analyze a batch of measured samples and suggest next steps
    pub fn summarize_samples(&self, samples: &[LabColor], threshold: f64) -> Result<WorkflowSummary> {
        let loaded_libraries: Vec<String> = self.libraries.keys().cloned().collect();

        let mut analyses = Vec::with_capacity(samples.len());
        let mut unmatched = Vec::new();
        for (index, lab) in samples.iter().enumerate() {
            let analysis =
                self.analyze_sample_against_libraries(*lab, None, threshold, self.max_matches_per_library)?;
            if analysis.best_matches.is_empty() {
                unmatched.push(index);
            }
            analyses.push(analysis);
        }

        let total_samples = samples.len();
        let matched_samples = total_samples - unmatched.len();
        let match_percentage = if total_samples > 0 {
            matched_samples as f64 / total_samples as f64 * 100.0
        } else {
            0.0
        };
        let recommendations = recommendations(&analyses, unmatched.len());

        Ok(WorkflowSummary {
            status: if total_samples == 0 {
                WorkflowStatus::NoData
            } else {
                WorkflowStatus::Analyzed
            },
            total_samples,
            matched_samples,
            unmatched_samples: unmatched.len(),
            match_percentage,
            loaded_libraries,
            threshold_used: threshold,
            analyses,
            unmatched,
            recommendations,
        })
    }
}

fn recommendations(analyses: &[SampleAnalysisResult], unmatched: usize) -> Vec<String> {
    let mut recommendations = Vec::new();

    if unmatched > 0 {
        recommendations.push(format!(
            "Consider adding {unmatched} unmatched samples to your libraries to improve future matching"
        ));
    }

    let mut category_counts: IndexMap<&str, usize> = IndexMap::new();
    for m in analyses.iter().flat_map(|a| &a.best_matches) {
        *category_counts.entry(m.library_color.category.as_str()).or_default() += 1;
    }
    // First category reached wins a tie
    let top = category_counts
        .iter()
        .fold(None::<(&str, usize)>, |best, (&category, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((category, count)),
        });
    if let Some((category, count)) = top {
        recommendations.push(format!("Most matches found in '{category}' category ({count} matches)"));
    }

    recommendations
}

/// One-shot analysis against the standard libraries
///
/// Seeds the standard libraries in `libraries_dir` if they are missing.
pub fn quick_analysis(libraries_dir: &Path, sample_lab: LabColor) -> Result<SampleAnalysisResult> {
    create_standard_libraries(libraries_dir)?;

    let mut integration = LibraryIntegration::new(libraries_dir);
    integration.load_library(PHILATELIC_COLORS_LIBRARY)?;
    integration.load_library(BASIC_COLORS_LIBRARY)?;
    integration.analyze_sample_against_libraries(
        sample_lab,
        None,
        thresholds::DEFAULT_MAX_DELTA_E,
        thresholds::DEFAULT_MAX_RESULTS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Cie76;
    use crate::library::{Anchor, SampleShape};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn cie76_integration(dir: &Path) -> LibraryIntegration {
        LibraryIntegration::with_converter(dir, ColorConverter::with_strategy(Arc::new(Cie76)))
    }

    #[test]
    fn test_load_and_unload() {
        let dir = tempfile::tempdir().unwrap();
        let mut integration = cie76_integration(dir.path());

        integration.load_library("stamps").unwrap();
        integration.load_library("inks").unwrap();
        integration.load_library("stamps").unwrap();
        assert_eq!(integration.loaded_libraries(), ["stamps", "inks"]);

        assert!(integration.unload_library("stamps"));
        assert!(!integration.unload_library("stamps"));
        assert_eq!(integration.loaded_libraries(), ["inks"]);
        assert!(integration.library("inks").is_some());
    }

    #[test]
    fn test_add_sample_folds_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut integration = cie76_integration(dir.path());

        let geometry = SampleGeometry::new(SampleShape::Rectangle, 20.0, 10.0, Anchor::Center).unwrap();
        let sample = NewSample {
            description: "Pale shade".into(),
            notes: Some("check under UV".into()),
            metadata: Some(SampleMetadata {
                image_name: Some("sg45.tif".into()),
                coordinate_point: Some(2),
                position: Some((120.4, 88.6)),
                analysis_date: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
                geometry: Some(geometry),
            }),
            ..NewSample::default()
        };

        let stored = integration
            .add_sample_to_library("my_samples", LabColor::new(60.0, 50.0, 40.0), "Pale_Rose", sample)
            .unwrap();

        assert_eq!(integration.loaded_libraries(), ["my_samples"]);
        assert_eq!(
            stored.description,
            "Pale shade | Image: sg45.tif | Point: 2 | Position: (120,89)"
        );
        assert_eq!(
            stored.notes.as_deref(),
            Some("check under UV | Analyzed: 2024-03-01T12:00:00+00:00")
        );
        assert_eq!(stored.category, "User Samples");
        assert_eq!(stored.source, "StampZ Analysis");
        assert_eq!(stored.geometry, Some(geometry));

        let read = integration
            .library("my_samples")
            .unwrap()
            .get_color_by_name("Pale_Rose")
            .unwrap()
            .unwrap();
        assert_eq!(read.id, stored.id);
    }

    #[test]
    fn test_add_sample_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let mut integration = cie76_integration(dir.path());
        let lab = LabColor::new(60.0, 50.0, 40.0);

        let first = integration
            .add_sample_to_library("my_samples", lab, "Rose", NewSample::default())
            .unwrap();
        let second = integration
            .add_sample_to_library("my_samples", lab, "Rose", NewSample::default())
            .unwrap();

        assert_eq!(first.description, "");
        assert!(first.notes.is_none());
        assert_eq!(second.name, "Rose_1");
        assert!(integration
            .add_sample_to_library("my_samples", lab, "bad name", NewSample::default())
            .is_err());
    }

    #[test]
    fn test_recommendations() {
        let dir = tempfile::tempdir().unwrap();
        let mut integration = cie76_integration(dir.path());
        integration.load_library("stamps").unwrap();
        {
            let lib = integration.library_mut("stamps").unwrap();
            lib.add_color(NewLibraryColor::from_lab("Carmine", LabColor::new(47.0, 74.0, 37.0)).category("Reds"))
                .unwrap();
            lib.add_color(NewLibraryColor::from_lab("Rose", LabColor::new(70.0, 45.0, 12.0)).category("Reds"))
                .unwrap();
        }

        let samples = [
            LabColor::new(47.5, 74.0, 37.0),
            LabColor::new(70.0, 45.5, 12.0),
            LabColor::new(20.0, 0.0, -60.0),
        ];
        let summary = integration.summarize_samples(&samples, 5.0).unwrap();

        assert_eq!(summary.status, WorkflowStatus::Analyzed);
        assert_eq!(summary.total_samples, 3);
        assert_eq!(summary.matched_samples, 2);
        assert_eq!(summary.unmatched, [2]);
        assert!((summary.match_percentage - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.loaded_libraries, ["stamps"]);
        assert_eq!(
            summary.recommendations,
            [
                "Consider adding 1 unmatched samples to your libraries to improve future matching",
                "Most matches found in 'Reds' category (2 matches)",
            ]
        );

        let empty = integration.summarize_samples(&[], 5.0).unwrap();
        assert_eq!(empty.status, WorkflowStatus::NoData);
        assert_eq!(empty.match_percentage, 0.0);
        assert!(empty.recommendations.is_empty());
    }
}
