//! Built-in reference libraries

use std::path::Path;

use log::info;

use crate::{
    color::LabColor,
    constants::defaults,
    library::{library_db_path, ColorLibrary, NewLibraryColor},
    Result,
};

pub const BASIC_COLORS_LIBRARY: &str = "basic_colors";
pub const PHILATELIC_COLORS_LIBRARY: &str = "philatelic_colors";

/// (name, description, Lab, category)
type StandardColor = (&'static str, &'static str, (f64, f64, f64), &'static str);

const BASIC_COLORS: &[StandardColor] = &[
    ("Red", "Pure red color", (55.0, 80.0, 70.0), "Primary"),
    ("Green", "Pure green color", (88.0, -86.0, 83.0), "Primary"),
    ("Blue", "Pure blue color", (32.0, 79.0, -108.0), "Primary"),
    ("Yellow", "Pure yellow color", (97.0, -22.0, 94.0), "Primary"),
    ("Cyan", "Pure cyan color", (91.0, -48.0, -14.0), "Secondary"),
    ("Magenta", "Pure magenta color", (60.0, 98.0, -61.0), "Secondary"),
    ("White", "Pure white color", (100.0, 0.0, 0.0), "Neutral"),
    ("Black", "Pure black color", (0.0, 0.0, 0.0), "Neutral"),
    ("Gray", "Mid gray color", (53.0, 0.0, 0.0), "Neutral"),
];

const PHILATELIC_COLORS: &[StandardColor] = &[
    ("Vermillion", "Bright red-orange used in early stamps", (62.0, 70.0, 65.0), "Reds"),
    ("Carmine", "Deep red color common in stamps", (47.0, 74.0, 37.0), "Reds"),
    ("Rose", "Pink-red color used in many stamps", (70.0, 45.0, 12.0), "Reds"),
    ("Ultramarine", "Deep blue color, very common in stamps", (29.0, 68.0, -112.0), "Blues"),
    ("Prussian_Blue", "Dark blue color used in early stamps", (25.0, 26.0, -47.0), "Blues"),
    ("Emerald", "Bright green color used in stamps", (75.0, -60.0, 57.0), "Greens"),
    ("Violet", "Purple color common in commemoratives", (42.0, 58.0, -51.0), "Purples"),
    ("Brown", "Earth tone used in many stamps", (37.0, 24.0, 57.0), "Browns"),
    ("Orange", "Bright orange used in stamps", (74.0, 23.0, 78.0), "Oranges"),
    ("Yellow_Green", "Yellow-green color in nature stamps", (85.0, -40.0, 85.0), "Greens"),
];

const STANDARD_LIBRARIES: &[(&str, &str, &[StandardColor])] = &[
    (BASIC_COLORS_LIBRARY, "Basic Colors", BASIC_COLORS),
    (PHILATELIC_COLORS_LIBRARY, "Philatelic Colors", PHILATELIC_COLORS),
];

/// Create the standard libraries that do not exist yet
///
/// A library whose database file is already present is left untouched.
/// Returns the display names of all standard libraries.
pub fn create_standard_libraries(libraries_dir: &Path) -> Result<Vec<String>> {
    let mut processed = Vec::with_capacity(STANDARD_LIBRARIES.len());

    for &(name, display_name, colors) in STANDARD_LIBRARIES {
        if library_db_path(libraries_dir, name).exists() {
            info!("{} library already exists", display_name);
        } else {
            let mut library = ColorLibrary::open(name, libraries_dir)?;
            for &(color_name, description, lab, category) in colors {
                library.add_color(
                    NewLibraryColor::from_lab(color_name, LabColor::from(lab))
                        .description(description)
                        .category(category)
                        .source(defaults::STANDARD_SOURCE),
                )?;
            }
            info!("Created {} library with {} colors", display_name, colors.len());
        }
        processed.push(display_name.to_string());
    }

    Ok(processed)
}
