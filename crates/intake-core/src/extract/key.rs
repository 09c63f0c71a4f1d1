//! OCR key cleanup: separating a field-name candidate from an embedded value.

/// Split a raw OCR key into a field-name candidate and any value embedded
/// after a colon, e.g. `"Fecha: 2024-11-29"` -> `("Fecha", "2024-11-29")`.
///
/// Splits on the first colon only; both halves are trimmed. Keys without a
/// colon yield an empty embedded value. Total over all inputs.
pub fn split_key(raw_key: &str) -> (String, String) {
    match raw_key.split_once(':') {
        Some((name, embedded)) => (name.trim().to_string(), embedded.trim().to_string()),
        None => (raw_key.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_with_value() {
        assert_eq!(
            split_key("Key: Value"),
            ("Key".to_string(), "Value".to_string())
        );
        assert_eq!(
            split_key("Key : Value"),
            ("Key".to_string(), "Value".to_string())
        );
    }

    #[test]
    fn test_split_without_colon() {
        assert_eq!(split_key("Key"), ("Key".to_string(), String::new()));
        assert_eq!(split_key("  Key  "), ("Key".to_string(), String::new()));
    }

    #[test]
    fn test_split_trailing_colon() {
        assert_eq!(split_key("Fecha:"), ("Fecha".to_string(), String::new()));
    }

    #[test]
    fn test_split_first_colon_only() {
        assert_eq!(
            split_key("Hora: 10:30:00"),
            ("Hora".to_string(), "10:30:00".to_string())
        );
    }

    #[test]
    fn test_split_empty() {
        assert_eq!(split_key(""), (String::new(), String::new()));
        assert_eq!(split_key(":"), (String::new(), String::new()));
    }
}
