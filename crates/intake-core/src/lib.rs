//! Core library for document-intake field extraction.
//!
//! This crate provides:
//! - Text normalization (case, whitespace, diacritics) for OCR output
//! - Key/value pair extraction against a synonym table
//! - Canonical record models with a closed field set
//! - Record classification (invoice vs. generic information)
//!
//! Everything here is pure computation: no I/O, no shared mutable state.
//! The surrounding service (OCR provider, persistence, object storage)
//! lives in `intake-server`.

pub mod error;
pub mod extract;
pub mod models;
pub mod synonyms;

pub use error::{ExtractionError, IntakeError, Result};
pub use extract::{
    FieldExtractor, classify, classify_record, classify_value, extract_fields,
    find_matching_field, normalize, normalize_date, split_key,
};
pub use models::record::{CanonicalField, CanonicalRecord, ClassifiedRecord, RawPair, SchemaTag};
pub use synonyms::SynonymTable;
