//! Field extraction over the full OCR key/value sequence.

use tracing::{debug, trace};

use crate::models::record::{CanonicalRecord, RawPair};
use crate::synonyms::SynonymTable;

use super::key::split_key;

/// Extract a canonical record from raw OCR pairs using the given table.
///
/// For each pair, in input order: the key is split into a candidate and any
/// embedded value, the candidate is matched against the table, and the
/// stored value is the embedded value if non-empty, else the pair's value,
/// trimmed. Empty values are stored as empty strings, not omitted.
/// Unmatched pairs are dropped silently; duplicate matches on the same
/// canonical field overwrite (last write wins, pending a merge policy).
pub fn extract_fields(pairs: &[RawPair], table: &SynonymTable) -> CanonicalRecord {
    let mut record = CanonicalRecord::new();

    for pair in pairs {
        let (candidate, embedded) = split_key(&pair.key);
        match table.find(&candidate) {
            Some(field) => {
                let value = if embedded.is_empty() {
                    pair.value.trim()
                } else {
                    embedded.as_str()
                };
                debug!("matched {:?} -> {} = {:?}", pair.key, field, value);
                record.insert(field, value);
            }
            None => trace!("dropped unmapped pair {:?}", pair.key),
        }
    }

    record
}

/// Reusable extractor owning its synonym table.
///
/// The table is immutable, so a single extractor is safe to share across
/// concurrent request handlers by reference.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    table: SynonymTable,
}

impl FieldExtractor {
    /// Create an extractor with the default (rich) table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with an explicit table.
    pub fn with_table(table: SynonymTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SynonymTable {
        &self.table
    }

    /// Extract a canonical record from raw OCR pairs.
    pub fn extract(&self, pairs: &[RawPair]) -> CanonicalRecord {
        extract_fields(pairs, &self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::CanonicalField;
    use pretty_assertions::assert_eq;

    fn toy_table() -> SynonymTable {
        SynonymTable::from_entries([(CanonicalField::InvoiceDate, vec!["key".to_string()])])
    }

    #[test]
    fn test_embedded_value_wins_over_pair_value() {
        let pairs = vec![RawPair::new("Key: Value", "Some value")];
        let record = extract_fields(&pairs, &toy_table());
        assert_eq!(record.get(CanonicalField::InvoiceDate), Some("Value"));
    }

    #[test]
    fn test_pair_value_used_when_no_embedded() {
        let pairs = vec![RawPair::new("KEY", "  Some value  ")];
        let record = extract_fields(&pairs, &toy_table());
        assert_eq!(record.get(CanonicalField::InvoiceDate), Some("Some value"));
    }

    #[test]
    fn test_empty_value_stored_as_empty_string() {
        let pairs = vec![RawPair::new("Key:", "")];
        let record = extract_fields(&pairs, &toy_table());
        assert_eq!(record.get(CanonicalField::InvoiceDate), Some(""));
    }

    #[test]
    fn test_unmatched_pairs_dropped() {
        let pairs = vec![
            RawPair::new("Unrelated", "noise"),
            RawPair::new("key", "kept"),
        ];
        let record = extract_fields(&pairs, &toy_table());
        assert_eq!(record.len(), 1);
        assert_eq!(record.get(CanonicalField::InvoiceDate), Some("kept"));
    }

    #[test]
    fn test_duplicate_match_last_write_wins() {
        let pairs = vec![
            RawPair::new("key", "first"),
            RawPair::new("Key: second", "ignored"),
        ];
        let record = extract_fields(&pairs, &toy_table());
        assert_eq!(record.get(CanonicalField::InvoiceDate), Some("second"));
    }

    #[test]
    fn test_full_document_with_rich_table() {
        let extractor = FieldExtractor::new();
        let pairs = vec![
            RawPair::new("Cliente", "Juan Pérez"),
            RawPair::new("Fecha: 2024-11-29", ""),
            RawPair::new("NÚMERO DE FACTURA", "F-0042"),
            RawPair::new("Subtotal", "900.00"),
            RawPair::new("TOTAL A PAGAR", "1,071.00"),
        ];
        let record = extractor.extract(&pairs);
        assert_eq!(record.get(CanonicalField::ClientName), Some("Juan Pérez"));
        assert_eq!(record.get(CanonicalField::InvoiceDate), Some("2024-11-29"));
        assert_eq!(record.get(CanonicalField::InvoiceNumber), Some("F-0042"));
        assert_eq!(record.get(CanonicalField::TotalInvoice), Some("1,071.00"));
        // "Subtotal" is not in the table and is dropped.
        assert_eq!(record.len(), 4);
    }
}
