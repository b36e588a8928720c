//! Error types for the stamp_colors library

use std::fmt;

use thiserror::Error;

/// Result type alias for stamp_colors operations
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Naming rule a color name can violate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    /// Name is empty or only whitespace
    NotEmpty,
    /// Name contains a space (underscores separate words)
    NoSpaces,
    /// Name has an empty underscore-delimited segment (`a__b`, `_a`, `a_`)
    NoEmptySegments,
    /// A digit run is not immediately preceded by an uppercase letter
    DigitsAfterUppercase,
}

impl fmt::Display for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NameRule::NotEmpty => "color name cannot be empty",
            NameRule::NoSpaces => "use underscores between words, spaces are not allowed",
            NameRule::NoEmptySegments => {
                "underscores must separate non-empty words (no leading, trailing or doubled underscores)"
            }
            NameRule::DigitsAfterUppercase => {
                "numbers must be immediately preceded by a capital letter (e.g. F137_crimson)"
            }
        };
        f.write_str(text)
    }
}

/// Error types for color library operations
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Supplied color name violates the naming rules
    #[error("Invalid color name '{name}': {rule}")]
    InvalidColorName { name: String, rule: NameRule },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Rename would collide with an existing color
    #[error("A color named '{name}' already exists in this library")]
    DuplicateName { name: String },

    /// Underlying SQLite failure
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Filesystem failure
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV could not be read or written
    #[error("CSV error: {message}")]
    Csv {
        message: String,
        #[source]
        source: csv::Error,
    },

    /// CSV schema is unusable; raised before any row is processed
    #[error("Import format error: {reason}")]
    ImportFormat { reason: String },

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LibraryError {
    /// Create a storage error with context
    pub fn storage(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Storage {
            message: message.into(),
            source,
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV error with context
    pub fn csv(message: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error with an underlying cause
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Check if this error is caused by caller input rather than the environment
    ///
    /// Validation failures leave the store untouched, so the caller can fix the
    /// input and retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LibraryError::InvalidColorName { .. }
                | LibraryError::InvalidParameter { .. }
                | LibraryError::DuplicateName { .. }
                | LibraryError::ImportFormat { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            LibraryError::InvalidColorName { rule, .. } => {
                format!("Invalid color name: {}.", rule)
            }
            LibraryError::DuplicateName { name } => {
                format!("The name '{}' is already used in this library. Please choose another.", name)
            }
            LibraryError::ImportFormat { reason } => {
                format!("The CSV file cannot be imported: {}.", reason)
            }
            LibraryError::Storage { .. } | LibraryError::Io { .. } => {
                "The color library could not be read or written. Please check disk space and permissions."
                    .to_string()
            }
            _ => "The color library operation failed. Please check the input and try again.".to_string(),
        }
    }
}
