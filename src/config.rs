//! Configuration for library storage and matching.
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use stamp_colors::LibraryConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = LibraryConfig::from_json_file(Path::new("library_config.json"))?;
//!
//! // Or derive from the environment
//! let config = LibraryConfig::from_env();
//! # Ok::<(), stamp_colors::LibraryError>(())
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    color::DeltaEPreference,
    constants::{storage, thresholds},
    LibraryError, Result,
};

/// Settings for opening libraries and matching samples.
///
/// Serialized to/from JSON so a matching session can be reproduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Base data directory; libraries live in `<data_dir>/color_libraries`
    pub data_dir: PathBuf,

    /// Delta E method to use for the whole session
    #[serde(default)]
    pub delta_e: DeltaEPreference,

    /// Delta E tolerance for matches
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,

    /// Matches kept per library in multi-library analysis
    #[serde(default = "default_max_matches")]
    pub max_matches_per_library: usize,

    /// Libraries loaded when the integration service starts
    #[serde(default)]
    pub default_libraries: Vec<String>,
}

fn default_threshold() -> f64 {
    thresholds::DEFAULT_MAX_DELTA_E
}

fn default_max_matches() -> usize {
    thresholds::DEFAULT_MAX_RESULTS
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            delta_e: DeltaEPreference::Auto,
            default_threshold: default_threshold(),
            max_matches_per_library: default_max_matches(),
            default_libraries: vec!["philatelic_colors".to_string(), "basic_colors".to_string()],
        }
    }
}

impl LibraryConfig {
    /// Defaults, with the data directory taken from `STAMPZ_DATA_DIR`
    ///
    /// When the variable is set the data directory is `$STAMPZ_DATA_DIR/data`,
    /// otherwise `./data`.
    pub fn from_env() -> Self {
        let root = std::env::var_os(storage::DATA_DIR_ENV).map(PathBuf::from);
        Self::with_data_root(root.as_deref())
    }

    /// Defaults with the data directory under `root` (or `./data` for `None`)
    pub fn with_data_root(root: Option<&Path>) -> Self {
        let data_dir = match root {
            Some(root) => root.join("data"),
            None => PathBuf::from("data"),
        };
        Self {
            data_dir,
            ..Self::default()
        }
    }

    /// Directory holding one database per library
    pub fn libraries_dir(&self) -> PathBuf {
        self.data_dir.join(storage::LIBRARIES_DIR)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a non-positive or non-finite threshold,
    /// a zero match limit, or an empty library name
    pub fn validate(&self) -> Result<()> {
        if !self.default_threshold.is_finite() || self.default_threshold <= 0.0 {
            return Err(LibraryError::invalid_parameter(
                "default_threshold",
                self.default_threshold,
            ));
        }
        if self.max_matches_per_library == 0 {
            return Err(LibraryError::invalid_parameter("max_matches_per_library", 0));
        }
        if self.default_libraries.iter().any(|name| name.trim().is_empty()) {
            return Err(LibraryError::invalid_parameter("default_libraries", "(empty name)"));
        }
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LibraryError::io(format!("failed to read {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| LibraryError::config(format!("malformed config {}", path.display()), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LibraryError::config("failed to serialize config", e))?;
        std::fs::write(path, json)
            .map_err(|e| LibraryError::io(format!("failed to write {}", path.display()), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LibraryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_threshold, 5.0);
        assert_eq!(config.max_matches_per_library, 3);
        assert_eq!(config.libraries_dir(), Path::new("data/color_libraries"));
    }

    #[test]
    fn test_data_root() {
        let config = LibraryConfig::with_data_root(Some(Path::new("/opt/stampz")));
        assert_eq!(config.data_dir, Path::new("/opt/stampz/data"));
        assert_eq!(
            config.libraries_dir(),
            Path::new("/opt/stampz/data/color_libraries")
        );
        assert_eq!(LibraryConfig::with_data_root(None).data_dir, Path::new("data"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = LibraryConfig::default();
        config.default_threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = LibraryConfig::default();
        config.default_threshold = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = LibraryConfig::default();
        config.max_matches_per_library = 0;
        assert!(config.validate().is_err());

        let mut config = LibraryConfig::default();
        config.default_libraries.push(" ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = LibraryConfig {
            delta_e: DeltaEPreference::Cie76,
            default_threshold: 2.5,
            ..LibraryConfig::default()
        };
        config.to_json_file(&path).unwrap();
        assert_eq!(LibraryConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LibraryConfig = serde_json::from_str(r#"{"data_dir": "/tmp/x"}"#).unwrap();
        assert_eq!(config.delta_e, DeltaEPreference::Auto);
        assert_eq!(config.default_threshold, 5.0);
        assert_eq!(config.max_matches_per_library, 3);
        assert!(config.default_libraries.is_empty());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            LibraryConfig::from_json_file(&path),
            Err(LibraryError::Config { .. })
        ));
    }
}
