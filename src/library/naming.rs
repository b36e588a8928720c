//! Color-name rules and library-name sanitizing

use crate::{error::NameRule, LibraryError, Result};

/// Validate a user-supplied color name
///
/// Rules:
/// - no spaces; underscores are the only word separator
/// - no empty underscore-delimited segments
/// - a run of digits must be immediately preceded by an uppercase letter in
///   the same segment (`F137_crimson` is valid, `137_crimson` and `f137` are not)
///
/// # Errors
///
/// Returns `InvalidColorName` naming the first violated rule
pub fn validate_color_name(name: &str) -> Result<()> {
    check_color_name(name).map_err(|rule| LibraryError::InvalidColorName {
        name: name.to_string(),
        rule,
    })
}

fn check_color_name(name: &str) -> std::result::Result<(), NameRule> {
    if name.trim().is_empty() {
        return Err(NameRule::NotEmpty);
    }
    if name.chars().any(char::is_whitespace) {
        return Err(NameRule::NoSpaces);
    }

    for segment in name.split('_') {
        if segment.is_empty() {
            return Err(NameRule::NoEmptySegments);
        }

        let mut previous: Option<char> = None;
        for c in segment.chars() {
            let starts_digit_run = c.is_ascii_digit() && !previous.is_some_and(|p| p.is_ascii_digit());
            if starts_digit_run && !previous.is_some_and(char::is_uppercase) {
                return Err(NameRule::DigitsAfterUppercase);
            }
            previous = Some(c);
        }
    }

    Ok(())
}

/// Map a library display name to a storage-safe identifier
///
/// Characters outside `[A-Za-z0-9_.-]` become underscores, runs of underscores
/// collapse to one, and leading/trailing underscores are dropped. A name with
/// nothing usable left maps to `library`.
pub fn sanitize_library_name(name: &str) -> String {
    let mut clean = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            c
        } else {
            '_'
        };
        if c == '_' && clean.ends_with('_') {
            continue;
        }
        clean.push(c);
    }

    let clean = clean.trim_matches('_');
    if clean.is_empty() {
        "library".to_string()
    } else {
        clean.to_string()
    }
}

/// Candidate names for disambiguation: `base`, `base_1`, `base_2`, ...
pub fn candidate_names(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string()).chain((1u64..).map(move |n| format!("{base}_{n}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_of(name: &str) -> Option<NameRule> {
        check_color_name(name).err()
    }

    #[test]
    fn test_valid_names() {
        for name in ["Vermillion", "Prussian_Blue", "F137_crimson", "F137_Crimson", "SG12a", "Rose_AB12"] {
            assert_eq!(rule_of(name), None, "{name} should be valid");
        }
    }

    #[test]
    fn test_space_rejected() {
        assert_eq!(rule_of("my color"), Some(NameRule::NoSpaces));
        assert_eq!(rule_of("tab\tname"), Some(NameRule::NoSpaces));
    }

    #[test]
    fn test_digit_rules() {
        assert_eq!(rule_of("137_crimson"), Some(NameRule::DigitsAfterUppercase));
        assert_eq!(rule_of("f137"), Some(NameRule::DigitsAfterUppercase));
        assert_eq!(rule_of("Red_1"), Some(NameRule::DigitsAfterUppercase));
        // The whole run counts, not each digit
        assert_eq!(rule_of("F1234"), None);
        assert_eq!(rule_of("F12a3"), Some(NameRule::DigitsAfterUppercase));
    }

    #[test]
    fn test_empty_segments() {
        assert_eq!(rule_of(""), Some(NameRule::NotEmpty));
        assert_eq!(rule_of("Red__Rose"), Some(NameRule::NoEmptySegments));
        assert_eq!(rule_of("_Red"), Some(NameRule::NoEmptySegments));
        assert_eq!(rule_of("Red_"), Some(NameRule::NoEmptySegments));
    }

    #[test]
    fn test_validate_reports_rule() {
        let err = validate_color_name("my color").unwrap_err();
        match err {
            LibraryError::InvalidColorName { name, rule } => {
                assert_eq!(name, "my color");
                assert_eq!(rule, NameRule::NoSpaces);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_sanitize_library_name() {
        assert_eq!(sanitize_library_name("philatelic_colors"), "philatelic_colors");
        assert_eq!(sanitize_library_name("My Stamps / 1890s!"), "My_Stamps_1890s");
        assert_eq!(sanitize_library_name("a  b"), "a_b");
        assert_eq!(sanitize_library_name("v1.2-beta"), "v1.2-beta");
        assert_eq!(sanitize_library_name("Größe"), "Gr_e");
        assert_eq!(sanitize_library_name("///"), "library");
    }

    #[test]
    fn test_candidate_names() {
        let names: Vec<String> = candidate_names("Red").take(3).collect();
        assert_eq!(names, ["Red", "Red_1", "Red_2"]);
    }
}
