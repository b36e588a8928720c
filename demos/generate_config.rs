//! Generate a default library configuration file
//!
//! Creates a JSON config with all default parameters

use stamp_colors::LibraryConfig;
use std::{env, path::Path, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <output_config.json>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} data/library_config.json", args[0]);
        process::exit(1);
    }

    let output_path = Path::new(&args[1]);

    // Create parent directory if needed
    if let Some(parent) = output_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            process::exit(1);
        }
    }

    let config = LibraryConfig::from_env();

    match config.to_json_file(output_path) {
        Ok(_) => {
            eprintln!("Configuration saved to {}", output_path.display());
            eprintln!();
            eprintln!("Config summary:");
            eprintln!("  Libraries: {}", config.libraries_dir().display());
            eprintln!("  Delta E:   {:?}", config.delta_e);
            eprintln!(
                "  Matching:  threshold {:.1}, {} per library",
                config.default_threshold, config.max_matches_per_library
            );
            eprintln!("  Loaded:    {}", config.default_libraries.join(", "));
        }
        Err(e) => {
            eprintln!("Error saving config: {}", e);
            process::exit(1);
        }
    }
}
