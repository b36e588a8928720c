//! Records stored in a color library

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    color::{ColorInput, LabColor, RgbColor},
    constants::defaults,
    LibraryError, Result,
};

/// A named reference color
///
/// `lab` is the authoritative definition; `rgb` is its display projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryColor {
    /// Store-assigned id, never reused
    pub id: i64,
    /// Unique within the library
    pub name: String,
    pub description: String,
    pub lab: LabColor,
    pub rgb: RgbColor,
    pub category: String,
    pub source: String,
    pub notes: Option<String>,
    /// Geometry of the sample area, for colors captured from an image
    pub geometry: Option<SampleGeometry>,
    /// Set on insert, never changed afterwards
    pub date_added: DateTime<Utc>,
}

impl LibraryColor {
    /// Display hex of the RGB projection
    pub fn hex(&self) -> String {
        self.rgb.to_hex()
    }
}

/// Shape of a sample area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleShape {
    Rectangle,
    Circle,
}

/// Anchor point of a sample area relative to the sampled pixel position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = LibraryError;

            fn from_str(value: &str) -> Result<Self> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(LibraryError::invalid_parameter(stringify!($ty), value)),
                }
            }
        }
    };
}

text_enum!(SampleShape {
    Rectangle => "rectangle",
    Circle => "circle",
});

text_enum!(Anchor {
    Center => "center",
    TopLeft => "top_left",
    TopRight => "top_right",
    BottomLeft => "bottom_left",
    BottomRight => "bottom_right",
});

/// Geometry of the area a sample color was averaged over
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleGeometry {
    shape: SampleShape,
    width: f64,
    height: f64,
    anchor: Anchor,
}

impl SampleGeometry {
    /// Validate and build a sample geometry
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if a dimension is not a positive finite
    /// number, or a circle is given unequal width and height
    pub fn new(shape: SampleShape, width: f64, height: f64, anchor: Anchor) -> Result<Self> {
        for (parameter, value) in [("width", width), ("height", height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LibraryError::invalid_parameter(parameter, value));
            }
        }
        if shape == SampleShape::Circle && (width - height).abs() > f64::EPSILON {
            return Err(LibraryError::invalid_parameter(
                "height",
                format!("{height} (circle diameter is {width})"),
            ));
        }
        Ok(Self {
            shape,
            width,
            height,
            anchor,
        })
    }

    pub fn shape(&self) -> SampleShape {
        self.shape
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }
}

/// A color to insert, built from a name and one authoritative color form
#[derive(Debug, Clone, PartialEq)]
pub struct NewLibraryColor {
    pub(crate) name: String,
    pub(crate) color: ColorInput,
    pub(crate) description: String,
    pub(crate) category: String,
    pub(crate) source: String,
    pub(crate) notes: Option<String>,
    pub(crate) geometry: Option<SampleGeometry>,
}

impl NewLibraryColor {
    pub fn new(name: impl Into<String>, color: impl Into<ColorInput>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            description: String::new(),
            category: defaults::CATEGORY.to_string(),
            source: defaults::SOURCE.to_string(),
            notes: None,
            geometry: None,
        }
    }

    /// Lab-defined color (preferred)
    pub fn from_lab(name: impl Into<String>, lab: LabColor) -> Self {
        Self::new(name, ColorInput::Lab(lab))
    }

    /// RGB-defined color; Lab is derived at insert time
    pub fn from_rgb(name: impl Into<String>, rgb: RgbColor) -> Self {
        Self::new(name, ColorInput::Rgb(rgb))
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|n| !n.is_empty());
        self
    }

    pub fn geometry(mut self, geometry: Option<SampleGeometry>) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Fields to change on an existing color; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
    /// New authoritative Lab; RGB is recomputed
    pub lab: Option<LabColor>,
    /// New RGB; Lab is recomputed. Ignored when `lab` is also set
    pub rgb: Option<RgbColor>,
}

impl ColorUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ColorUpdate::default()
    }
}
