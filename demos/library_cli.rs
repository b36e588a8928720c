//! Command-line interface for stamp_colors
//!
//! Small tool for seeding, inspecting, importing into and matching against
//! color libraries.

use stamp_colors::{
    create_standard_libraries, ColorLibrary, LabColor, LibraryConfig, LibraryIntegration,
    SampleAnalysisResult,
};
use std::{env, path::Path, process};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_help(&args[0]);
        process::exit(1);
    }

    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => match args.get(i + 1) {
            Some(path) => LibraryConfig::from_json_file(Path::new(path)).unwrap_or_else(|e| {
                eprintln!("Error: {}", e.user_message());
                process::exit(1);
            }),
            None => {
                eprintln!("Error: --config needs a path");
                process::exit(1);
            }
        },
        None => LibraryConfig::from_env(),
    };

    let libraries_dir = config.libraries_dir();
    let command: Vec<&str> = args[1..]
        .iter()
        .map(String::as_str)
        .take_while(|a| *a != "--config")
        .collect();

    let outcome = match command.as_slice() {
        ["init"] => create_standard_libraries(&libraries_dir).map(|names| {
            for name in names {
                println!("{}", name);
            }
        }),
        ["list", library] => ColorLibrary::open(library, &libraries_dir)
            .and_then(|lib| lib.get_all_colors(None))
            .map(|colors| {
                for color in colors {
                    println!(
                        "{:<16} {:<10} {}  {}",
                        color.name,
                        color.category,
                        color.lab,
                        color.hex()
                    );
                }
            }),
        ["import", library, csv_path] => ColorLibrary::open(library, &libraries_dir)
            .and_then(|mut lib| lib.import_library(Path::new(csv_path), false))
            .map(|count| println!("Imported {} colors", count)),
        ["export", library, csv_path] => ColorLibrary::open(library, &libraries_dir)
            .and_then(|lib| lib.export_library(Path::new(csv_path)))
            .map(|count| println!("Exported {} colors", count)),
        ["match", l, a, b] => match parse_lab(l, a, b) {
            Some(lab) => LibraryIntegration::from_config(&config).and_then(|integration| {
                integration
                    .analyze_sample_against_libraries(
                        lab,
                        None,
                        config.default_threshold,
                        config.max_matches_per_library,
                    )
                    .map(|result| print_analysis(&result))
            }),
            None => {
                eprintln!("Error: L, a and b must be numbers");
                process::exit(1);
            }
        },
        ["--help"] | ["-h"] => {
            print_help(&args[0]);
            return;
        }
        _ => {
            eprintln!("Unknown command");
            eprintln!("Use --help for usage information");
            process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e.user_message());
        process::exit(1);
    }
}

fn parse_lab(l: &str, a: &str, b: &str) -> Option<LabColor> {
    Some(LabColor::new(l.parse().ok()?, a.parse().ok()?, b.parse().ok()?))
}

fn print_analysis(result: &SampleAnalysisResult) {
    println!(
        "Sample {}  {}  ({})",
        result.sample_info.lab,
        result.sample_info.rgb.to_hex(),
        result.method
    );
    if result.best_matches.is_empty() {
        println!("No matches within tolerance");
    }
    for m in &result.best_matches {
        println!(
            "  {:<18} {:<16} dE {:>5.2}  {}",
            m.library_name, m.library_color.name, m.delta_e, m.quality
        );
    }
    if result.user_action_needed {
        println!("No excellent match: consider saving this sample to a library");
    }
}

fn print_help(program: &str) {
    eprintln!("Usage: {} <command> [--config <config.json>]", program);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  init                          Create the standard libraries");
    eprintln!("  list <library>                List colors in a library");
    eprintln!("  import <library> <file.csv>   Import colors from CSV");
    eprintln!("  export <library> <file.csv>   Export colors to CSV");
    eprintln!("  match <L> <a> <b>             Match a Lab sample against default libraries");
    eprintln!();
    eprintln!("Libraries live in $STAMPZ_DATA_DIR/data/color_libraries (or ./data/color_libraries)");
}
