//! Text normalization for synonym comparison.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize text for comparison: trim, lowercase, then decompose accented
/// characters (NFD) and discard the combining marks, so `"Cliente"`,
/// `"CLIENTE"`, and `"cliénte"` all normalize identically.
///
/// Total over all inputs; empty input yields the empty string.
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_normalize_case_and_whitespace() {
        assert_eq!(normalize("  Text  "), "text");
        assert_eq!(normalize("CLIENTE"), "cliente");
    }

    #[test]
    fn test_normalize_strips_diacritics() {
        assert_eq!(normalize("ÁÉÍÓÚáéíóú"), "aeiouaeiou");
        assert_eq!(normalize("número de recepción"), "numero de recepcion");
        assert_eq!(normalize("cliénte"), "cliente");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["  Fecha de Emisión  ", "ÁÉÍ", "already normal", ""] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_keeps_interior_spacing() {
        assert_eq!(normalize("Nombre  del   Cliente"), "nombre  del   cliente");
    }
}
