use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const NAME_PUNCTUATION: [char; 6] = [' ', '-', '\'', '\u{2019}', '.', ','];

/// Canonical form used to compare names: diacritics dropped, lowercase, separators collapsed.
pub fn fold_name(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().collect::<String>()
            } else {
                " ".to_string()
            }
        })
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn names_match(left: &str, right: &str) -> bool {
    let left = fold_name(left);
    !left.is_empty() && left == fold_name(right)
}

/// Locale-aware name check used by the name-validity evaluator.
pub trait NameValidator: Send + Sync {
    fn is_valid_name(&self, name: &str) -> bool;
}

/// Accepts latin letters with diacritics and the usual name punctuation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatinNameValidator;

impl LatinNameValidator {
    fn is_latin_letter(c: char) -> bool {
        c.is_ascii_alphabetic() || (matches!(c, '\u{00C0}'..='\u{024F}') && c.is_alphabetic())
    }
}

impl NameValidator for LatinNameValidator {
    fn is_valid_name(&self, name: &str) -> bool {
        let mut has_letter = false;
        for c in name.nfd() {
            if Self::is_latin_letter(c) {
                has_letter = true;
            } else if !(is_combining_mark(c) || NAME_PUNCTUATION.contains(&c)) {
                return false;
            }
        }
        has_letter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folding_ignores_case_accents_and_separators() {
        assert_eq!(fold_name("  Hélène-Marie  D'Arc "), "helene marie d arc");
        assert!(names_match("JOSÉ", "jose"));
        assert!(names_match("Jean  Pierre", "jean-pierre"));
        assert!(!names_match("", ""));
        assert!(!names_match("Jean", "Jeanne"));
    }

    #[test]
    fn latin_names_are_accepted() {
        let validator = LatinNameValidator;
        for name in [
            "Ellingson",
            "Charles-Apollon",
            "John O'Wick",
            "John O\u{2019}Wick",
            "Martin king, Jr.",
            "a\u{e9}",
            "Søren",
        ] {
            assert!(validator.is_valid_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn other_scripts_and_symbols_are_rejected() {
        let validator = LatinNameValidator;
        for name in [
            "Ellingson2",
            "/",
            " ",
            "\u{10db}\u{10d0}\u{10e0}\u{10d8}\u{10d0}\u{10db}",
            "&",
            "a&",
            "1",
        ] {
            assert!(!validator.is_valid_name(name), "{name} should be rejected");
        }
    }
}
