//! Canonical field identifiers and record types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of canonical output fields the system understands,
/// decoupled from the many raw synonym phrasings an OCR engine may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    ClientName,
    ClientAddress,
    SupplierName,
    SupplierAddress,
    InvoiceNumber,
    InvoiceDate,
    TotalInvoice,
    Products,
    Description,
    Summary,
}

impl CanonicalField {
    /// All canonical fields, in declared order.
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::ClientName,
        CanonicalField::ClientAddress,
        CanonicalField::SupplierName,
        CanonicalField::SupplierAddress,
        CanonicalField::InvoiceNumber,
        CanonicalField::InvoiceDate,
        CanonicalField::TotalInvoice,
        CanonicalField::Products,
        CanonicalField::Description,
        CanonicalField::Summary,
    ];

    /// Snake-case identifier, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::ClientName => "client_name",
            CanonicalField::ClientAddress => "client_address",
            CanonicalField::SupplierName => "supplier_name",
            CanonicalField::SupplierAddress => "supplier_address",
            CanonicalField::InvoiceNumber => "invoice_number",
            CanonicalField::InvoiceDate => "invoice_date",
            CanonicalField::TotalInvoice => "total_invoice",
            CanonicalField::Products => "products",
            CanonicalField::Description => "description",
            CanonicalField::Summary => "summary",
        }
    }

    /// Parse a snake-case identifier.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == s)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw (key, value) pair as produced by the OCR collaborator.
///
/// The key may itself encode a field name plus an embedded value,
/// e.g. `"Fecha: 2024-11-29"`. Pair sequences are ordered: the extractor
/// processes them front to back and later matches overwrite earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPair {
    pub key: String,
    pub value: String,
}

impl RawPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A canonical field -> value map extracted from one document.
///
/// Partial by construction: only fields that matched a synonym are present.
/// Values may be empty strings. Insertion overwrites, so feeding pairs in
/// order gives last-write-wins on duplicate field matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord {
    fields: BTreeMap<CanonicalField, String>,
}

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one if the field was present.
    pub fn insert(&mut self, field: CanonicalField, value: impl Into<String>) -> Option<String> {
        self.fields.insert(field, value.into())
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over (field, value) entries in declared field order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.fields.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// The fields present in this record, in declared order.
    pub fn present_fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        self.fields.keys().copied()
    }
}

impl FromIterator<(CanonicalField, String)> for CanonicalRecord {
    fn from_iter<I: IntoIterator<Item = (CanonicalField, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Target persistence schema for a classified record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaTag {
    /// Record carries at least one invoice-indicating field.
    Invoice,
    /// Generic fallback schema.
    Information,
}

impl SchemaTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaTag::Invoice => "invoice",
            SchemaTag::Information => "information",
        }
    }
}

impl fmt::Display for SchemaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical record tagged with its target schema.
///
/// The persisted identifier is attached by the storage collaborator; this
/// type only carries the classification decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub tag: SchemaTag,
    pub record: CanonicalRecord,
}
