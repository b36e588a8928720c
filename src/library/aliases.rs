//! CSV header alias table
//!
//! Maps the many spellings found in third-party color CSVs onto canonical
//! fields. Lookups are case-insensitive, except for the one alias shared by
//! two fields (`b`: Lab b* vs RGB blue), which is resolved from the exact
//! header text and the other columns present. The table is mirrored in
//! `tests/fixtures/header_aliases_v1.csv`; bump [`ALIAS_TABLE_VERSION`] and
//! add a new fixture when aliases change.

use std::{collections::HashMap, fmt, str::FromStr, sync::LazyLock};

use crate::{LibraryError, Result};

/// Version of the alias table
pub const ALIAS_TABLE_VERSION: u32 = 1;

/// Canonical CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnField {
    Name,
    Description,
    Category,
    Source,
    Notes,
    LabL,
    LabA,
    LabB,
    RgbR,
    RgbG,
    RgbB,
}

impl ColumnField {
    pub const ALL: [ColumnField; 11] = [
        ColumnField::Name,
        ColumnField::Description,
        ColumnField::Category,
        ColumnField::Source,
        ColumnField::Notes,
        ColumnField::LabL,
        ColumnField::LabA,
        ColumnField::LabB,
        ColumnField::RgbR,
        ColumnField::RgbG,
        ColumnField::RgbB,
    ];

    pub const LAB: [ColumnField; 3] = [ColumnField::LabL, ColumnField::LabA, ColumnField::LabB];
    pub const RGB: [ColumnField; 3] = [ColumnField::RgbR, ColumnField::RgbG, ColumnField::RgbB];

    /// Canonical column name, as written on export
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnField::Name => "name",
            ColumnField::Description => "description",
            ColumnField::Category => "category",
            ColumnField::Source => "source",
            ColumnField::Notes => "notes",
            ColumnField::LabL => "lab_l",
            ColumnField::LabA => "lab_a",
            ColumnField::LabB => "lab_b",
            ColumnField::RgbR => "rgb_r",
            ColumnField::RgbG => "rgb_g",
            ColumnField::RgbB => "rgb_b",
        }
    }
}

impl fmt::Display for ColumnField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnField {
    type Err = LibraryError;

    fn from_str(value: &str) -> Result<Self> {
        ColumnField::ALL
            .into_iter()
            .find(|field| field.as_str() == value)
            .ok_or_else(|| LibraryError::invalid_parameter("column_field", value))
    }
}

/// Unambiguous aliases, lowercase
const ALIASES: &[(&str, ColumnField)] = &[
    ("name", ColumnField::Name),
    ("color_name", ColumnField::Name),
    ("color", ColumnField::Name),
    ("description", ColumnField::Description),
    ("desc", ColumnField::Description),
    ("comment", ColumnField::Description),
    ("category", ColumnField::Category),
    ("type", ColumnField::Category),
    ("group", ColumnField::Category),
    ("source", ColumnField::Source),
    ("origin", ColumnField::Source),
    ("reference", ColumnField::Source),
    ("notes", ColumnField::Notes),
    ("note", ColumnField::Notes),
    ("remarks", ColumnField::Notes),
    ("lab_l", ColumnField::LabL),
    ("l*", ColumnField::LabL),
    ("l_star", ColumnField::LabL),
    ("l", ColumnField::LabL),
    ("lightness", ColumnField::LabL),
    ("lab_a", ColumnField::LabA),
    ("a*", ColumnField::LabA),
    ("a_star", ColumnField::LabA),
    ("a", ColumnField::LabA),
    ("green_red", ColumnField::LabA),
    ("lab_b", ColumnField::LabB),
    ("b*", ColumnField::LabB),
    ("b_star", ColumnField::LabB),
    ("blue_yellow", ColumnField::LabB),
    ("rgb_r", ColumnField::RgbR),
    ("r", ColumnField::RgbR),
    ("red", ColumnField::RgbR),
    ("rgb_g", ColumnField::RgbG),
    ("g", ColumnField::RgbG),
    ("green", ColumnField::RgbG),
    ("rgb_b", ColumnField::RgbB),
    ("blue", ColumnField::RgbB),
];

/// Aliases shared by two fields: exact header text -> (preferred, alternative)
const SHARED_ALIASES: &[(&str, ColumnField, ColumnField)] = &[
    ("b", ColumnField::LabB, ColumnField::RgbB),
    ("B", ColumnField::RgbB, ColumnField::LabB),
];

static ALIAS_TABLE: LazyLock<HashMap<&'static str, ColumnField>> =
    LazyLock::new(|| ALIASES.iter().copied().collect());

/// Result of looking up one header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMatch {
    Field(ColumnField),
    /// Header text shared by two fields; `preferred` wins unless the other
    /// columns show it belongs to `alternative`
    Shared {
        preferred: ColumnField,
        alternative: ColumnField,
    },
}

/// Look up a single header
pub fn lookup(header: &str) -> Option<HeaderMatch> {
    let trimmed = header.trim();
    if let Some(&(_, preferred, alternative)) =
        SHARED_ALIASES.iter().find(|(text, _, _)| *text == trimmed)
    {
        return Some(HeaderMatch::Shared {
            preferred,
            alternative,
        });
    }
    ALIAS_TABLE
        .get(trimmed.to_lowercase().as_str())
        .copied()
        .map(HeaderMatch::Field)
}

/// Column index of each canonical field found in a header row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: HashMap<ColumnField, usize>,
}

impl HeaderMap {
    /// Resolve a header row
    ///
    /// Unambiguous headers are placed first (the first column wins when two
    /// headers alias the same field). Shared headers then take their
    /// preferred field, unless that would leave its own triple unusable while
    /// completing the alternative's triple.
    pub fn resolve<'h, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'h str>,
    {
        let mut map = HeaderMap::default();
        let mut shared = Vec::new();

        for (index, header) in headers.into_iter().enumerate() {
            match lookup(header) {
                Some(HeaderMatch::Field(field)) => {
                    map.columns.entry(field).or_insert(index);
                }
                Some(HeaderMatch::Shared {
                    preferred,
                    alternative,
                }) => shared.push((index, preferred, alternative)),
                None => {}
            }
        }

        for (index, preferred, alternative) in shared {
            let field = if map.fits_triple(alternative) && !map.fits_triple(preferred) {
                alternative
            } else {
                preferred
            };
            map.columns.entry(field).or_insert(index);
        }

        map
    }

    /// Column index of a field
    pub fn get(&self, field: ColumnField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Column indexes of a full triple, if every channel is present
    pub fn triple(&self, fields: [ColumnField; 3]) -> Option<[usize; 3]> {
        Some([self.get(fields[0])?, self.get(fields[1])?, self.get(fields[2])?])
    }

    /// Canonical fields found, in canonical order
    pub fn fields(&self) -> Vec<ColumnField> {
        ColumnField::ALL
            .into_iter()
            .filter(|field| self.columns.contains_key(field))
            .collect()
    }

    /// True if `field` is missing and the other two channels of its triple are present
    fn fits_triple(&self, field: ColumnField) -> bool {
        let triple = if ColumnField::LAB.contains(&field) {
            ColumnField::LAB
        } else if ColumnField::RGB.contains(&field) {
            ColumnField::RGB
        } else {
            return false;
        };
        !self.columns.contains_key(&field)
            && triple
                .iter()
                .filter(|other| **other != field)
                .all(|other| self.columns.contains_key(other))
    }
}
