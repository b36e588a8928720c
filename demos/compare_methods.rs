//! Compare CIEDE2000 and CIE76 on the same library
//!
//! Prints, for one Lab sample, the matches each Delta E method finds in a
//! library, so the effect of the fixed quality thresholds can be inspected.

use stamp_colors::{
    color::{select_strategy, DeltaEPreference},
    ColorConverter, ColorLibrary, ColorMatcher, LabColor, LibraryConfig,
};
use std::{env, process};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 5 {
        eprintln!("Usage: compare_methods <library> <L> <a> <b> [threshold]");
        eprintln!("Example: cargo run --example compare_methods philatelic_colors 61 69 64 15");
        process::exit(1);
    }

    let values: Option<Vec<f64>> = args[2..].iter().map(|v| v.parse().ok()).collect();
    let Some(values) = values else {
        eprintln!("Error: L, a, b and threshold must be numbers");
        process::exit(1);
    };
    let sample = LabColor::new(values[0], values[1], values[2]);
    let threshold = values.get(3).copied().unwrap_or(5.0);

    let config = LibraryConfig::from_env();
    let library = match ColorLibrary::open(&args[1], &config.libraries_dir()) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("Error opening library: {}", e.user_message());
            process::exit(1);
        }
    };

    for preference in [DeltaEPreference::Ciede2000, DeltaEPreference::Cie76] {
        let strategy = match select_strategy(preference) {
            Ok(strategy) => strategy,
            Err(e) => {
                eprintln!("Skipping {:?}: {}", preference, e);
                continue;
            }
        };
        let converter = ColorConverter::with_strategy(strategy);
        let matcher = ColorMatcher::with_converter(&library, &converter);

        println!("{} (threshold {:.1})", converter.delta_e_method(), threshold);
        match matcher.find_closest_matches(sample, threshold, 10) {
            Ok(matches) if matches.is_empty() => println!("  no matches"),
            Ok(matches) => {
                for m in matches {
                    println!(
                        "  {:<16} dE {:>6.2}  {}",
                        m.library_color.name, m.delta_e, m.quality
                    );
                }
            }
            Err(e) => {
                eprintln!("Error matching: {}", e);
                process::exit(1);
            }
        }
    }
}
