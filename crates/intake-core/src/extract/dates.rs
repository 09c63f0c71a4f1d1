//! Folding OCR-emitted invoice dates to ISO form for persistence.

use chrono::NaiveDate;

/// Accepted input layouts, tried in order.
const DATE_FORMATS: [&str; 6] = [
    "%d %m %Y", // 29 11 2024
    "%Y %m %d", // 2024 11 29
    "%d/%m/%Y", // 29/11/2024
    "%Y%m%d",   // 20241129
    "%d%m%Y",   // 29112024
    "%Y-%m-%d", // 2024-11-29
];

/// Parse a date string in any of the common layouts OCR emits.
///
/// `None` for unparseable input; callers persist that as NULL rather than
/// failing the request.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}
