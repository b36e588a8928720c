//! CSV export and import of library colors

use std::path::Path;

use chrono::Utc;
use csv::{ReaderBuilder, StringRecord, Terminator, Trim, WriterBuilder};
use log::{info, warn};
use rusqlite::{params, OptionalExtension};

use super::{
    aliases::{ColumnField, HeaderMap},
    insert_color, overwrite_color, resolve, unique_name, ColorLibrary, NewLibraryColor,
};
use crate::{
    color::{ColorInput, LabColor, RgbColor},
    constants::defaults,
    LibraryError, Result,
};

/// Header row written by [`ColorLibrary::export_library`]
pub const EXPORT_HEADER: [&str; 8] = [
    "name",
    "description",
    "lab_l",
    "lab_a",
    "lab_b",
    "category",
    "source",
    "notes",
];

/// Column positions of a validated import header
struct ImportLayout {
    name: usize,
    lab: Option<[usize; 3]>,
    rgb: Option<[usize; 3]>,
    description: Option<usize>,
    category: Option<usize>,
    source: Option<usize>,
    notes: Option<usize>,
}

impl ImportLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let map = HeaderMap::resolve(headers.iter());

        let name = map.get(ColumnField::Name).ok_or_else(|| LibraryError::ImportFormat {
            reason: "no name column".to_string(),
        })?;
        let lab = map.triple(ColumnField::LAB);
        let rgb = map.triple(ColumnField::RGB);
        if lab.is_none() && rgb.is_none() {
            return Err(LibraryError::ImportFormat {
                reason: "no complete Lab or RGB column triple".to_string(),
            });
        }

        Ok(Self {
            name,
            lab,
            rgb,
            description: map.get(ColumnField::Description),
            category: map.get(ColumnField::Category),
            source: map.get(ColumnField::Source),
            notes: map.get(ColumnField::Notes),
        })
    }

    /// Build the color for one data row, or say why it was skipped
    fn parse_row(&self, record: &StringRecord) -> std::result::Result<NewLibraryColor, String> {
        let name = field(record, Some(self.name)).ok_or("empty name")?;

        // Lab wins when both triples parse
        let color = self
            .lab
            .and_then(|cols| parse_triple(record, cols))
            .map(|(l, a, b)| ColorInput::Lab(LabColor::new(l, a, b)))
            .or_else(|| {
                self.rgb
                    .and_then(|cols| parse_triple(record, cols))
                    .map(|(r, g, b)| ColorInput::Rgb(RgbColor::new(r, g, b)))
            })
            .ok_or("no parseable Lab or RGB values")?;

        if let ColorInput::Lab(lab) = color {
            if !lab.is_nominal() {
                warn!("Color '{}' has Lab values outside the nominal range: {}", name, lab);
            }
        }

        Ok(NewLibraryColor::new(name, color)
            .description(field(record, self.description).unwrap_or(name))
            .category(field(record, self.category).unwrap_or(defaults::IMPORT_CATEGORY))
            .source(field(record, self.source).unwrap_or(defaults::IMPORT_SOURCE))
            .notes(field(record, self.notes).map(str::to_string)))
    }
}

/// Trimmed, non-empty cell
fn field(record: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_triple(record: &StringRecord, cols: [usize; 3]) -> Option<(f64, f64, f64)> {
    let parse = |i: usize| {
        field(record, Some(i))?
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    };
    Some((parse(cols[0])?, parse(cols[1])?, parse(cols[2])?))
}

/// Whole numbers keep a trailing `.0` so Lab columns always read as floats
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

impl ColorLibrary {
    /// Write every color to a CSV file, Lab as the color columns
    ///
    /// Rows are ordered as in [`ColorLibrary::get_all_colors`]. Returns the
    /// number of rows written.
    ///
    /// # Errors
    ///
    /// Returns `Csv` if the file cannot be written
    pub fn export_library(&self, path: &Path) -> Result<usize> {
        let colors = self.get_all_colors(None)?;
        let context = || format!("failed to write {}", path.display());

        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_path(path)
            .map_err(|e| LibraryError::csv(context(), e))?;

        writer
            .write_record(EXPORT_HEADER)
            .map_err(|e| LibraryError::csv(context(), e))?;
        for color in &colors {
            let (l, a, b) = (
                format_float(color.lab.l),
                format_float(color.lab.a),
                format_float(color.lab.b),
            );
            writer
                .write_record([
                    color.name.as_str(),
                    color.description.as_str(),
                    l.as_str(),
                    a.as_str(),
                    b.as_str(),
                    color.category.as_str(),
                    color.source.as_str(),
                    color.notes.as_deref().unwrap_or(""),
                ])
                .map_err(|e| LibraryError::csv(context(), e))?;
        }
        writer
            .flush()
            .map_err(|e| LibraryError::io(context(), e))?;

        info!("Exported {} colors from '{}' to {}", colors.len(), self.name, path.display());
        Ok(colors.len())
    }

    /// Import colors from a CSV file
    ///
    /// Headers are matched through the alias table. The file must carry a
    /// name column and at least one complete Lab or RGB triple; otherwise
    /// `ImportFormat` is returned before any row is read. Malformed rows are
    /// skipped with a warning. All accepted rows are committed in one
    /// transaction.
    ///
    /// With `replace_existing`, a row whose name already exists overwrites
    /// that color in place (id and date added are kept). Otherwise the name
    /// is auto-suffixed as in [`ColorLibrary::add_color`].
    ///
    /// Returns the number of rows committed.
    pub fn import_library(&mut self, path: &Path, replace_existing: bool) -> Result<usize> {
        let context = || format!("failed to read {}", path.display());

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|e| LibraryError::csv(context(), e))?;
        let headers = reader
            .headers()
            .map_err(|e| LibraryError::csv(context(), e))?
            .clone();
        let layout = ImportLayout::from_headers(&headers)?;

        let tx = self
            .conn
            .transaction()
            .map_err(|e| LibraryError::storage("failed to begin import", e))?;

        let mut imported = 0;
        let mut skipped = 0;

        for (row, record) in reader.records().enumerate() {
            // Header is line 1
            let line = row + 2;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping line {} of {}: {}", line, path.display(), e);
                    skipped += 1;
                    continue;
                }
            };
            let color = match layout.parse_row(&record) {
                Ok(color) => color,
                Err(reason) => {
                    warn!("Skipping line {} of {}: {}", line, path.display(), reason);
                    skipped += 1;
                    continue;
                }
            };

            let (lab, rgb) = resolve(&self.converter, color.color);
            let storage_err = |e| {
                LibraryError::storage(format!("failed to import color '{}'", color.name), e)
            };

            let existing = if replace_existing {
                tx.query_row(
                    "SELECT id FROM library_colors WHERE name = ?1",
                    params![color.name],
                    |r| r.get::<_, i64>(0),
                )
                .optional()
                .map_err(storage_err)?
            } else {
                None
            };

            match existing {
                Some(id) => {
                    overwrite_color(&tx, id, &color, lab, rgb).map_err(storage_err)?;
                }
                None => {
                    let name = unique_name(&tx, &color.name).map_err(storage_err)?;
                    insert_color(&tx, &name, &color, lab, rgb, Utc::now()).map_err(storage_err)?;
                }
            }
            imported += 1;
        }

        tx.commit()
            .map_err(|e| LibraryError::storage("failed to commit import", e))?;

        info!(
            "Imported {} colors into '{}' from {} ({} skipped)",
            imported,
            self.name,
            path.display(),
            skipped
        );
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("colors.csv");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_export_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut lib = ColorLibrary::open_in_memory("export").unwrap();
        lib.add_color(
            NewLibraryColor::from_lab("Vermillion", LabColor::new(62.0, 70.0, 65.0))
                .description("Bright red-orange")
                .category("Reds")
                .source("StampZ Standard"),
        )
        .unwrap();

        let path = dir.path().join("out.csv");
        assert_eq!(lib.export_library(&path).unwrap(), 1);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "name,description,lab_l,lab_a,lab_b,category,source,notes\n\
             Vermillion,Bright red-orange,62.0,70.0,65.0,Reds,StampZ Standard,\n"
        );
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(62.0), "62.0");
        assert_eq!(format_float(-0.5), "-0.5");
        assert_eq!(format_float(53.2408), "53.2408");
    }

    #[test]
    fn test_import_with_aliases_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "Color,L*,a*,b*\nRose,70,45,12\n");

        let mut lib = ColorLibrary::open_in_memory("import").unwrap();
        assert_eq!(lib.import_library(&path, false).unwrap(), 1);

        let rose = lib.get_color_by_name("Rose").unwrap().unwrap();
        assert_eq!(rose.lab, LabColor::new(70.0, 45.0, 12.0));
        assert_eq!(rose.description, "Rose");
        assert_eq!(rose.category, "Imported");
        assert_eq!(rose.source, "CSV Import");
        assert!(rose.notes.is_none());
    }

    #[test]
    fn test_import_rgb_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "name,red,green,blue\nPure_Red,255,0,0\n");

        let mut lib = ColorLibrary::open_in_memory("import").unwrap();
        assert_eq!(lib.import_library(&path, false).unwrap(), 1);

        let red = lib.get_color_by_name("Pure_Red").unwrap().unwrap();
        assert_eq!(red.rgb, RgbColor::new(255.0, 0.0, 0.0));
        assert!((red.lab.l - 53.24).abs() < 0.01);
    }

    #[test]
    fn test_import_prefers_lab_over_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "name,lab_l,lab_a,lab_b,r,g,B\nGray,50,0,0,255,255,255\n");

        let mut lib = ColorLibrary::open_in_memory("import").unwrap();
        lib.import_library(&path, false).unwrap();
        let gray = lib.get_color_by_name("Gray").unwrap().unwrap();
        assert_eq!(gray.lab, LabColor::new(50.0, 0.0, 0.0));
    }

    #[test]
    fn test_import_keeps_out_of_range_lab() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "name,lab_l,lab_a,lab_b\nHot,105,140,-150\n");

        let mut lib = ColorLibrary::open_in_memory("import").unwrap();
        assert_eq!(lib.import_library(&path, false).unwrap(), 1);

        let hot = lib.get_color_by_name("Hot").unwrap().unwrap();
        assert_eq!(hot.lab, LabColor::new(105.0, 140.0, -150.0));
        assert!(!hot.lab.is_nominal());
        for c in [hot.rgb.r, hot.rgb.g, hot.rgb.b] {
            assert!((0.0..=255.0).contains(&c), "channel {c} out of range");
        }
    }

    #[test]
    fn test_import_falls_back_to_rgb_when_lab_unparseable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "name,lab_l,lab_a,lab_b,r,g,B\nBlue,n/a,,x,0,0,255\nGray,50,0,0,255,255,255\n",
        );

        let mut lib = ColorLibrary::open_in_memory("import").unwrap();
        assert_eq!(lib.import_library(&path, false).unwrap(), 2);

        let blue = lib.get_color_by_name("Blue").unwrap().unwrap();
        assert_eq!(blue.rgb, RgbColor::new(0.0, 0.0, 255.0));
        assert!((blue.lab.l - 32.30).abs() < 0.01);
        assert!((blue.lab.b + 107.86).abs() < 0.01);

        let gray = lib.get_color_by_name("Gray").unwrap().unwrap();
        assert_eq!(gray.lab, LabColor::new(50.0, 0.0, 0.0));
    }

    #[test]
    fn test_import_skips_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "name,lab_l,lab_a,lab_b\nGood,50,1,2\n,50,1,2\nBad,fifty,1,2\nShort,50\nAlso_Good,60,3,4\n",
        );

        let mut lib = ColorLibrary::open_in_memory("import").unwrap();
        assert_eq!(lib.import_library(&path, false).unwrap(), 2);
        assert_eq!(lib.get_color_count().unwrap(), 2);
    }

    #[test]
    fn test_import_rejects_bad_schema() {
        let dir = tempfile::tempdir().unwrap();
        let mut lib = ColorLibrary::open_in_memory("import").unwrap();

        let path = write_csv(&dir, "name,lab_l,lab_a\nRed,50,10\n");
        assert!(matches!(
            lib.import_library(&path, false),
            Err(LibraryError::ImportFormat { .. })
        ));

        let path = write_csv(&dir, "lab_l,lab_a,lab_b\n50,10,10\n");
        assert!(matches!(
            lib.import_library(&path, false),
            Err(LibraryError::ImportFormat { .. })
        ));
        assert_eq!(lib.get_color_count().unwrap(), 0);
    }

    #[test]
    fn test_import_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "name,lab_l,lab_a,lab_b,category\nRed,40,60,50,Reds\n");

        let mut lib = ColorLibrary::open_in_memory("import").unwrap();
        let original = lib
            .add_color(NewLibraryColor::from_lab("Red", LabColor::new(53.0, 80.0, 67.0)))
            .unwrap();

        lib.import_library(&path, false).unwrap();
        assert!(lib.get_color_by_name("Red_1").unwrap().is_some());
        assert_eq!(lib.get_color_by_name("Red").unwrap().unwrap().lab, original.lab);

        lib.import_library(&path, true).unwrap();
        let replaced = lib.get_color_by_name("Red").unwrap().unwrap();
        assert_eq!(replaced.id, original.id);
        assert_eq!(replaced.date_added, original.date_added);
        assert_eq!(replaced.lab, LabColor::new(40.0, 60.0, 50.0));
        assert_eq!(replaced.category, "Reds");
        assert_eq!(lib.get_color_count().unwrap(), 2);
    }
}
