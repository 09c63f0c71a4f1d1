//! Keyword matching against the synonym table.

use crate::models::record::CanonicalField;
use crate::synonyms::SynonymTable;

/// Map a field-name candidate to a canonical field via the synonym table.
///
/// The candidate is normalized and compared for equality against each
/// field's normalized synonym set, in the table's declared order; the
/// first match wins. `None` means the candidate is unmapped OCR noise,
/// which is a common, non-exceptional outcome.
pub fn find_matching_field(candidate: &str, table: &SynonymTable) -> Option<CanonicalField> {
    table.find(candidate)
}
