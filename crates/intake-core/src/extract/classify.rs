//! Record classification: invoice vs. generic information.

use serde_json::Value;

use crate::error::ExtractionError;
use crate::models::record::{CanonicalField, CanonicalRecord, ClassifiedRecord, SchemaTag};

/// Fields whose presence routes a record to the invoice schema.
pub fn invoice_fields() -> [CanonicalField; 4] {
    [
        CanonicalField::InvoiceDate,
        CanonicalField::InvoiceNumber,
        CanonicalField::ClientName,
        CanonicalField::TotalInvoice,
    ]
}

/// Decide the target schema for a canonical record.
///
/// Any single invoice-indicating field is enough: partial or noisy
/// extraction of an invoice should still route to the invoice schema.
/// Everything else falls back to the generic information schema.
pub fn classify(record: &CanonicalRecord) -> SchemaTag {
    let invoice_keys = invoice_fields();
    if record.present_fields().any(|f| invoice_keys.contains(&f)) {
        SchemaTag::Invoice
    } else {
        SchemaTag::Information
    }
}

/// Classify a record, consuming it into a tagged form ready for the
/// persistence collaborator.
pub fn classify_record(record: CanonicalRecord) -> ClassifiedRecord {
    let tag = classify(&record);
    ClassifiedRecord { tag, record }
}

/// Classify an untyped JSON value from an external caller.
///
/// The value must be an object mapping canonical field identifiers to
/// strings; anything else is fatal for the current request. Unknown keys
/// are rejected rather than dropped, since a caller handing us a record
/// (as opposed to raw OCR pairs) is claiming it is already canonical.
pub fn classify_value(value: &Value) -> Result<ClassifiedRecord, ExtractionError> {
    let map = value
        .as_object()
        .ok_or_else(|| ExtractionError::InvalidRecord(format!("expected an object, got {value}")))?;

    let mut record = CanonicalRecord::new();
    for (key, raw) in map {
        let field = CanonicalField::parse(key)
            .ok_or_else(|| ExtractionError::UnknownField(key.clone()))?;
        let text = raw.as_str().ok_or_else(|| {
            ExtractionError::InvalidRecord(format!("value for {key} is not a string: {raw}"))
        })?;
        record.insert(field, text);
    }

    Ok(classify_record(record))
}
