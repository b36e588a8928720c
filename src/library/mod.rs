//! Persisted color libraries
//!
//! Each library is a flat set of named reference colors stored in its own
//! SQLite database (`<dir>/<sanitized name>_library.db`). Libraries are
//! created on first open and never share storage.
//!
//! A `ColorLibrary` owns its connection. Mutations take `&mut self`, so
//! sharing one library between callers requires external serialization
//! (e.g. a `Mutex<ColorLibrary>` per library name).

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row, ToSql};

use crate::{
    color::{ColorConverter, ColorInput, LabColor, RgbColor},
    constants::storage,
    LibraryError, Result,
};

pub mod aliases;
mod csv_io;
mod migrations;
pub mod models;
pub mod naming;

pub use csv_io::EXPORT_HEADER;
pub use models::{Anchor, ColorUpdate, LibraryColor, NewLibraryColor, SampleGeometry, SampleShape};
pub use naming::{sanitize_library_name, validate_color_name};

use migrations::run_migrations;

const COLOR_COLUMNS: &str = "id, name, description, lab_l, lab_a, lab_b, rgb_r, rgb_g, rgb_b, \
     category, source, date_added, notes, shape_type, sample_width, sample_height, anchor_position";

/// One named, isolated collection of reference colors
#[derive(Debug)]
pub struct ColorLibrary {
    name: String,
    db_path: Option<PathBuf>,
    conn: Connection,
    converter: ColorConverter,
}

/// Database file for a library name inside `libraries_dir`
pub fn library_db_path(libraries_dir: &Path, library_name: &str) -> PathBuf {
    libraries_dir.join(format!(
        "{}{}",
        sanitize_library_name(library_name),
        storage::DB_FILE_SUFFIX
    ))
}

impl ColorLibrary {
    /// Open a library, creating its directory and database if needed
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an empty name, `Io` if the directory
    /// cannot be created, `Storage` if the database cannot be opened
    pub fn open(name: &str, libraries_dir: &Path) -> Result<Self> {
        ensure_library_name(name)?;
        std::fs::create_dir_all(libraries_dir).map_err(|e| {
            LibraryError::io(
                format!("failed to create library directory {}", libraries_dir.display()),
                e,
            )
        })?;

        let db_path = library_db_path(libraries_dir, name);
        let conn = Connection::open(&db_path).map_err(|e| {
            LibraryError::storage(format!("failed to open {}", db_path.display()), e)
        })?;

        let library = Self::from_connection(name, Some(db_path.clone()), conn)?;
        info!(
            "Opened color library '{}' at {} ({} colors)",
            library.name,
            db_path.display(),
            library.get_color_count()?
        );
        Ok(library)
    }

    /// Open a library that lives only as long as this value
    pub fn open_in_memory(name: &str) -> Result<Self> {
        ensure_library_name(name)?;
        let conn = Connection::open_in_memory()
            .map_err(|e| LibraryError::storage("failed to open in-memory database", e))?;
        Self::from_connection(name, None, conn)
    }

    fn from_connection(name: &str, db_path: Option<PathBuf>, mut conn: Connection) -> Result<Self> {
        run_migrations(&mut conn)?;
        Ok(Self {
            name: name.to_string(),
            db_path,
            conn,
            converter: ColorConverter::new(),
        })
    }

    /// Display name of the library
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Database file, `None` for in-memory libraries
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Add a color, auto-suffixing the name on collision
    ///
    /// The name must satisfy [`validate_color_name`]. If it is already taken,
    /// `name_1`, `name_2`, ... are tried until a free one is found; the
    /// existing record is never overwritten. Returns the stored record, whose
    /// name may differ from the requested one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidColorName` before touching storage, or `Storage` if
    /// the insert fails
    pub fn add_color(&mut self, color: NewLibraryColor) -> Result<LibraryColor> {
        validate_color_name(&color.name)?;
        self.insert_new(color)
    }

    /// Insert without the naming rules (imported and seeded colors)
    pub(crate) fn insert_new(&mut self, color: NewLibraryColor) -> Result<LibraryColor> {
        let (lab, rgb) = resolve(&self.converter, color.color);
        let date_added = Utc::now();

        let tx = self
            .conn
            .transaction()
            .map_err(|e| LibraryError::storage("failed to begin insert", e))?;
        let final_name = unique_name(&tx, &color.name)
            .map_err(|e| LibraryError::storage("failed to check existing names", e))?;
        let id = insert_color(&tx, &final_name, &color, lab, rgb, date_added)
            .map_err(|e| LibraryError::storage(format!("failed to insert color '{}'", final_name), e))?;
        tx.commit()
            .map_err(|e| LibraryError::storage("failed to commit insert", e))?;

        if final_name != color.name {
            debug!("Color '{}' already exists, stored as '{}'", color.name, final_name);
        }
        debug!("Added color '{}' to '{}' ({}, {})", final_name, self.name, lab, rgb);

        Ok(LibraryColor {
            id,
            name: final_name,
            description: color.description,
            lab,
            rgb,
            category: color.category,
            source: color.source,
            notes: color.notes,
            geometry: color.geometry,
            date_added,
        })
    }

    /// Exact-match lookup by name
    pub fn get_color_by_name(&self, name: &str) -> Result<Option<LibraryColor>> {
        self.conn
            .query_row(
                &format!("SELECT {COLOR_COLUMNS} FROM library_colors WHERE name = ?1"),
                params![name],
                row_to_color,
            )
            .optional()
            .map_err(|e| LibraryError::storage("failed to look up color by name", e))
    }

    /// Lookup by id
    pub fn get_color_by_id(&self, id: i64) -> Result<Option<LibraryColor>> {
        self.conn
            .query_row(
                &format!("SELECT {COLOR_COLUMNS} FROM library_colors WHERE id = ?1"),
                params![id],
                row_to_color,
            )
            .optional()
            .map_err(|e| LibraryError::storage("failed to look up color by id", e))
    }

    /// All colors, ordered by (category, name); or by name within one category
    pub fn get_all_colors(&self, category: Option<&str>) -> Result<Vec<LibraryColor>> {
        let map_err = |e| LibraryError::storage("failed to list colors", e);

        let (sql, args): (String, Vec<&dyn ToSql>) = match &category {
            Some(category) => (
                format!("SELECT {COLOR_COLUMNS} FROM library_colors WHERE category = ?1 ORDER BY name"),
                vec![category as &dyn ToSql],
            ),
            None => (
                format!("SELECT {COLOR_COLUMNS} FROM library_colors ORDER BY category, name"),
                Vec::new(),
            ),
        };

        let mut stmt = self.conn.prepare(&sql).map_err(map_err)?;
        let colors = stmt
            .query_map(args.as_slice(), row_to_color)
            .map_err(map_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_err)?;
        Ok(colors)
    }

    /// Distinct categories, sorted
    pub fn get_categories(&self) -> Result<Vec<String>> {
        let map_err = |e| LibraryError::storage("failed to list categories", e);
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT category FROM library_colors ORDER BY category")
            .map_err(map_err)?;
        let categories = stmt
            .query_map([], |row| row.get(0))
            .map_err(map_err)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(map_err)?;
        Ok(categories)
    }

    /// Update fields of an existing color
    ///
    /// A new `name` is revalidated. Setting `lab` recomputes RGB; setting only
    /// `rgb` recomputes Lab. Returns `Ok(true)` iff a row was changed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidColorName` or `DuplicateName` before touching storage
    pub fn update_color(&mut self, id: i64, update: ColorUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        if let Some(name) = &update.name {
            validate_color_name(name)?;
            let taken: bool = self
                .conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM library_colors WHERE name = ?1 AND id != ?2)",
                    params![name, id],
                    |row| row.get(0),
                )
                .map_err(|e| LibraryError::storage("failed to check existing names", e))?;
            if taken {
                return Err(LibraryError::DuplicateName { name: name.clone() });
            }
        }

        let mut updates: Vec<&str> = Vec::new();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        let text_fields = [
            ("name = ?", &update.name),
            ("description = ?", &update.description),
            ("category = ?", &update.category),
            ("source = ?", &update.source),
        ];
        for (clause, value) in text_fields {
            if let Some(value) = value {
                updates.push(clause);
                params_vec.push(Box::new(value.clone()));
            }
        }
        if let Some(notes) = &update.notes {
            updates.push("notes = ?");
            params_vec.push(Box::new(notes.clone()));
        }

        let color = match (update.lab, update.rgb) {
            (Some(lab), _) => Some(resolve(&self.converter, ColorInput::Lab(lab))),
            (None, Some(rgb)) => Some(resolve(&self.converter, ColorInput::Rgb(rgb))),
            (None, None) => None,
        };
        if let Some((lab, rgb)) = color {
            updates.extend(["lab_l = ?", "lab_a = ?", "lab_b = ?", "rgb_r = ?", "rgb_g = ?", "rgb_b = ?"]);
            params_vec.extend(
                [lab.l, lab.a, lab.b, rgb.r, rgb.g, rgb.b]
                    .into_iter()
                    .map(|v| Box::new(v) as Box<dyn ToSql>),
            );
        }

        params_vec.push(Box::new(id));
        let query = format!("UPDATE library_colors SET {} WHERE id = ?", updates.join(", "));

        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let rows_affected = self
            .conn
            .execute(&query, params_refs.as_slice())
            .map_err(|e| LibraryError::storage(format!("failed to update color {id}"), e))?;

        debug!("Updated color {} in '{}' ({} row(s))", id, self.name, rows_affected);
        Ok(rows_affected > 0)
    }

    /// Delete a color; true iff a row was removed
    pub fn remove_color(&mut self, id: i64) -> Result<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM library_colors WHERE id = ?1", params![id])
            .map_err(|e| LibraryError::storage(format!("failed to remove color {id}"), e))?;
        Ok(rows_affected > 0)
    }

    /// Number of colors in the library
    pub fn get_color_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM library_colors", [], |row| row.get(0))
            .map_err(|e| LibraryError::storage("failed to count colors", e))?;
        usize::try_from(count).map_err(|_| LibraryError::invalid_parameter("color_count", count))
    }

    /// Converter used for Lab/RGB projections
    pub fn converter(&self) -> &ColorConverter {
        &self.converter
    }
}

fn ensure_library_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LibraryError::invalid_parameter("library_name", "(empty)"));
    }
    Ok(())
}

/// Authoritative Lab and display RGB for a color input
fn resolve(converter: &ColorConverter, color: ColorInput) -> (LabColor, RgbColor) {
    match color {
        ColorInput::Lab(lab) => {
            if !converter.is_in_srgb_gamut(lab) {
                debug!("{} is outside sRGB; display RGB is clamped", lab);
            }
            (lab, converter.lab_to_rgb(lab))
        }
        ColorInput::Rgb(rgb) => {
            let rgb = rgb.clamped();
            (converter.rgb_to_lab(rgb), rgb)
        }
    }
}

/// First free name among `base`, `base_1`, `base_2`, ...
fn unique_name(conn: &Connection, base: &str) -> rusqlite::Result<String> {
    // One scan for the base name and every `base_` prefixed name
    let mut stmt = conn.prepare(
        "SELECT name FROM library_colors
         WHERE name = ?1 OR substr(name, 1, length(?1) + 1) = ?1 || '_'",
    )?;
    let taken = stmt
        .query_map(params![base], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<HashSet<String>>>()?;

    naming::candidate_names(base)
        .find(|candidate| !taken.contains(candidate))
        .ok_or(rusqlite::Error::QueryReturnedNoRows)
}

fn insert_color(
    conn: &Connection,
    name: &str,
    color: &NewLibraryColor,
    lab: LabColor,
    rgb: RgbColor,
    date_added: DateTime<Utc>,
) -> rusqlite::Result<i64> {
    let geometry = color.geometry.as_ref();
    conn.execute(
        "INSERT INTO library_colors (
            name, description, lab_l, lab_a, lab_b, rgb_r, rgb_g, rgb_b,
            category, source, date_added, notes,
            shape_type, sample_width, sample_height, anchor_position
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            name,
            color.description,
            lab.l,
            lab.a,
            lab.b,
            rgb.r,
            rgb.g,
            rgb.b,
            color.category,
            color.source,
            date_added.to_rfc3339(),
            color.notes,
            geometry.map(|g| g.shape().as_str()),
            geometry.map(|g| g.width()),
            geometry.map(|g| g.height()),
            geometry.map(|g| g.anchor().as_str()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite every user-visible field of an existing color, keeping id and date
fn overwrite_color(
    conn: &Connection,
    id: i64,
    color: &NewLibraryColor,
    lab: LabColor,
    rgb: RgbColor,
) -> rusqlite::Result<usize> {
    let geometry = color.geometry.as_ref();
    conn.execute(
        "UPDATE library_colors SET
            description = ?1, lab_l = ?2, lab_a = ?3, lab_b = ?4,
            rgb_r = ?5, rgb_g = ?6, rgb_b = ?7, category = ?8, source = ?9, notes = ?10,
            shape_type = ?11, sample_width = ?12, sample_height = ?13, anchor_position = ?14
         WHERE id = ?15",
        params![
            color.description,
            lab.l,
            lab.a,
            lab.b,
            rgb.r,
            rgb.g,
            rgb.b,
            color.category,
            color.source,
            color.notes,
            geometry.map(|g| g.shape().as_str()),
            geometry.map(|g| g.width()),
            geometry.map(|g| g.height()),
            geometry.map(|g| g.anchor().as_str()),
            id,
        ],
    )
}

fn conversion_failure<E>(index: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn row_to_color(row: &Row) -> rusqlite::Result<LibraryColor> {
    let date_added: String = row.get("date_added")?;
    let date_added = DateTime::parse_from_rfc3339(&date_added)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(11, e))?;

    Ok(LibraryColor {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        lab: LabColor::new(row.get("lab_l")?, row.get("lab_a")?, row.get("lab_b")?),
        rgb: RgbColor::new(row.get("rgb_r")?, row.get("rgb_g")?, row.get("rgb_b")?),
        category: row.get("category")?,
        source: row.get("source")?,
        notes: row.get("notes")?,
        geometry: row_to_geometry(row)?,
        date_added,
    })
}

fn row_to_geometry(row: &Row) -> rusqlite::Result<Option<SampleGeometry>> {
    let shape: Option<String> = row.get("shape_type")?;
    let width: Option<f64> = row.get("sample_width")?;
    let height: Option<f64> = row.get("sample_height")?;
    let anchor: Option<String> = row.get("anchor_position")?;

    let (Some(shape), Some(width), Some(height), Some(anchor)) = (shape, width, height, anchor) else {
        return Ok(None);
    };

    let shape: SampleShape = shape.parse().map_err(|e| conversion_failure(13, e))?;
    let anchor: Anchor = anchor.parse().map_err(|e| conversion_failure(16, e))?;
    SampleGeometry::new(shape, width, height, anchor)
        .map(Some)
        .map_err(|e| conversion_failure(14, e))
}
