use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Derives the URL slug for a display name.
///
/// Lowercases, decomposes accented characters and drops their combining
/// marks, collapses every run of other characters into a single hyphen, and
/// trims hyphens from both ends. Recomputed on every write, so renaming a
/// category changes its slug.
///
/// A name with no alphanumeric content yields an empty slug; callers decide
/// whether that is acceptable.
pub fn slugify(name: &str) -> String {
    let decomposed: String = name
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    NON_ALPHANUMERIC
        .replace_all(&decomposed, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn test_basic() {
        assert_eq!(slugify("Perfumes"), "perfumes");
        assert_eq!(slugify("Cuidados diarios"), "cuidados-diarios");
    }

    #[test]
    fn test_diacritics() {
        assert_eq!(slugify("Café & Té"), "cafe-te");
        assert_eq!(slugify("Maquillaje según piel"), "maquillaje-segun-piel");
    }

    #[test]
    fn test_idempotent_on_same_input() {
        let first = slugify("Café & Té");
        let second = slugify("Café & Té");
        assert_eq!(first, second);
    }

    #[test]
    fn test_leading_trailing_junk() {
        assert_eq!(slugify("  ¡Hogar!  "), "hogar");
        assert_eq!(slugify("--rostro--"), "rostro");
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!@#$%"), "");
    }
}
