//! Synonym table: the static mapping from canonical fields to accepted
//! raw phrasings.
//!
//! The table is a versioned configuration artifact loaded once at startup
//! and immutable for the process lifetime. Matching is by equality after
//! normalization, not substring, so normalized forms are precomputed here.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{IntakeError, Result};
use crate::extract::normalize;
use crate::models::record::CanonicalField;

/// Compact v1 table: one or two obvious phrasings per field.
const COMPACT: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::ClientName, &["cliente", "nombre del cliente"]),
    (CanonicalField::ClientAddress, &["dirección del cliente", "domicilio"]),
    (CanonicalField::SupplierName, &["proveedor"]),
    (CanonicalField::SupplierAddress, &["dirección del proveedor"]),
    (CanonicalField::InvoiceNumber, &["número de factura", "factura no"]),
    (CanonicalField::InvoiceDate, &["fecha"]),
    (CanonicalField::TotalInvoice, &["total", "monto total"]),
    (CanonicalField::Products, &["producto", "productos"]),
    (CanonicalField::Description, &["descripción", "detalle"]),
    (CanonicalField::Summary, &["resumen", "contenido"]),
];

/// Rich v2 table: the full phrase set observed in production documents.
/// Strictly improves recall over v1 with identical matching semantics.
const RICH: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::ClientName,
        &[
            "cliente",
            "nombre del cliente",
            "nombre cliente",
            "Apellidos y Nombres o Razon Social",
            "razón social",
            "nombre completo del cliente",
            "nombre y apellido",
            "nombre del comprador",
            "nombre del usuario",
        ],
    ),
    (
        CanonicalField::ClientAddress,
        &[
            "dirección del cliente",
            "domicilio",
            "dirección",
            "ubicación del cliente",
            "dirección de entrega",
            "domicilio del cliente",
            "dirección de residencia",
        ],
    ),
    (
        CanonicalField::SupplierName,
        &[
            "proveedor",
            "nombre del proveedor",
            "nombre proveedor",
            "razón social proveedor",
            "empresa proveedora",
            "nombre del vendedor",
        ],
    ),
    (
        CanonicalField::SupplierAddress,
        &[
            "dirección del proveedor",
            "domicilio proveedor",
            "ciudad",
            "ubicación del proveedor",
            "dirección de la empresa",
            "dirección del suministrador",
        ],
    ),
    (
        CanonicalField::InvoiceNumber,
        &[
            "número de factura",
            "factura no",
            "factura #",
            "NOTA CRÉDITO ELECTRÓNICA No.",
            "número de recibo",
            "código de factura",
            "número de documento",
            "referencia de factura",
        ],
    ),
    (
        CanonicalField::InvoiceDate,
        &[
            "fecha",
            "fecha de emisión",
            "fecha factura",
            "Fecha de Factura",
            "fecha de pago",
            "fecha de creación de la factura",
            "fecha de emisión de factura",
        ],
    ),
    (
        CanonicalField::TotalInvoice,
        &[
            "total",
            "monto total",
            "importe total",
            "total a pagar",
            "valor total",
            "monto a abonar",
            "total factura",
            "precio total",
            "VALOR A PAGAR",
        ],
    ),
    (
        CanonicalField::Products,
        &[
            "producto",
            "productos",
            "detalles de productos",
            "PROTECCION",
            "artículos",
            "mercancía",
            "línea de productos",
            "productos adquiridos",
            "bienes",
            "productos vendidos",
            "producto solicitado",
        ],
    ),
    (
        CanonicalField::Description,
        &[
            "descripción",
            "descripcion",
            "detalle",
            "detalles",
            "información adicional",
            "explicación",
            "resumen de producto",
            "especificaciones",
        ],
    ),
    (
        CanonicalField::Summary,
        &[
            "resumen",
            "resumen del contenido",
            "contenido",
            "sumario",
            "resumen ejecutivo",
            "extracto",
            "síntesis",
            "visión general",
            "resumen informativo",
        ],
    ),
];

/// One table entry: a canonical field and its accepted phrasings.
#[derive(Debug, Clone)]
struct SynonymEntry {
    field: CanonicalField,
    phrases: Vec<String>,
    /// Normalized forms of `phrases`, computed once at construction.
    normalized: Vec<String>,
}

/// On-disk form of a table entry. Arrays keep the declared field order,
/// which a JSON object would not guarantee.
#[derive(Debug, Serialize, Deserialize)]
struct EntrySpec {
    field: String,
    synonyms: Vec<String>,
}

/// Ordered, immutable synonym table.
///
/// Lookup iterates entries in declared field order and returns the first
/// field whose normalized phrase set contains the normalized candidate.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    entries: Vec<SynonymEntry>,
}

impl SynonymTable {
    /// The compact v1 built-in table.
    pub fn compact() -> Self {
        Self::from_static(COMPACT)
    }

    /// The rich v2 built-in table (the default).
    pub fn rich() -> Self {
        Self::from_static(RICH)
    }

    fn from_static(raw: &[(CanonicalField, &[&str])]) -> Self {
        let entries = raw
            .iter()
            .map(|(field, phrases)| {
                Self::build_entry(*field, phrases.iter().map(|p| p.to_string()).collect())
            })
            .collect();
        Self { entries }
    }

    fn build_entry(field: CanonicalField, phrases: Vec<String>) -> SynonymEntry {
        let normalized = phrases.iter().map(|p| normalize(p)).collect();
        SynonymEntry {
            field,
            phrases,
            normalized,
        }
    }

    /// Build a table from explicit (field, phrases) pairs, preserving order.
    pub fn from_entries<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (CanonicalField, P)>,
        P: IntoIterator<Item = String>,
    {
        let entries = entries
            .into_iter()
            .map(|(field, phrases)| Self::build_entry(field, phrases.into_iter().collect()))
            .collect();
        Self { entries }
    }

    /// Load a table artifact from a JSON file: an ordered array of
    /// `{"field": ..., "synonyms": [...]}` entries.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let specs: Vec<EntrySpec> = serde_json::from_str(&content)
            .map_err(|e| IntakeError::Config(format!("invalid synonym table: {e}")))?;

        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            let field = CanonicalField::parse(&spec.field).ok_or_else(|| {
                IntakeError::Config(format!("unknown canonical field: {}", spec.field))
            })?;
            entries.push(Self::build_entry(field, spec.synonyms));
        }
        Ok(Self { entries })
    }

    /// Find the first canonical field whose synonym set matches the
    /// candidate after normalization. `None` is an expected outcome for
    /// unmapped OCR noise, not an error.
    pub fn find(&self, candidate: &str) -> Option<CanonicalField> {
        let normalized = normalize(candidate);
        self.entries
            .iter()
            .find(|entry| entry.normalized.iter().any(|p| *p == normalized))
            .map(|entry| entry.field)
    }

    /// Iterate (field, phrases) entries in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &[String])> {
        self.entries.iter().map(|e| (e.field, e.phrases.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::rich()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_tables_cover_all_fields() {
        for table in [SynonymTable::compact(), SynonymTable::rich()] {
            let fields: Vec<_> = table.iter().map(|(f, _)| f).collect();
            assert_eq!(fields, CanonicalField::ALL.to_vec());
        }
    }

    #[test]
    fn test_find_exact_phrase() {
        let table = SynonymTable::rich();
        assert_eq!(table.find("cliente"), Some(CanonicalField::ClientName));
        assert_eq!(table.find("fecha"), Some(CanonicalField::InvoiceDate));
        assert_eq!(table.find("resumen"), Some(CanonicalField::Summary));
    }

    #[test]
    fn test_find_is_case_and_accent_insensitive() {
        let table = SynonymTable::rich();
        assert_eq!(table.find("CLIENTE"), Some(CanonicalField::ClientName));
        assert_eq!(table.find("cliénte"), Some(CanonicalField::ClientName));
        assert_eq!(table.find("Razon Social"), Some(CanonicalField::ClientName));
        assert_eq!(
            table.find("NÚMERO DE FACTURA"),
            Some(CanonicalField::InvoiceNumber)
        );
    }

    #[test]
    fn test_every_synonym_matches_its_own_field_uppercased() {
        let table = SynonymTable::rich();
        let entries: Vec<(CanonicalField, Vec<String>)> = table
            .iter()
            .map(|(f, phrases)| (f, phrases.to_vec()))
            .collect();
        for (field, phrases) in entries {
            for phrase in phrases {
                assert_eq!(
                    table.find(&phrase.to_uppercase()),
                    Some(field),
                    "synonym {phrase:?} should map to {field}"
                );
            }
        }
    }

    #[test]
    fn test_find_no_match() {
        let table = SynonymTable::rich();
        assert_eq!(table.find("totally-unknown-xyz"), None);
        assert_eq!(table.find(""), None);
    }

    #[test]
    fn test_no_substring_matching() {
        let table = SynonymTable::rich();
        assert_eq!(table.find("el cliente principal"), None);
    }

    #[test]
    fn test_from_file_rejects_unknown_field() {
        let dir = std::env::temp_dir().join("intake-synonyms-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad_table.json");
        std::fs::write(
            &path,
            r#"[{"field": "not_a_field", "synonyms": ["x"]}]"#,
        )
        .unwrap();
        let err = SynonymTable::from_file(&path).unwrap_err();
        assert!(matches!(err, IntakeError::Config(_)));
    }

    #[test]
    fn test_from_file_preserves_declared_order() {
        let dir = std::env::temp_dir().join("intake-synonyms-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ordered_table.json");
        std::fs::write(
            &path,
            r#"[
                {"field": "summary", "synonyms": ["nota"]},
                {"field": "description", "synonyms": ["nota"]}
            ]"#,
        )
        .unwrap();
        let table = SynonymTable::from_file(&path).unwrap();
        // First declared entry wins on overlap.
        assert_eq!(table.find("nota"), Some(CanonicalField::Summary));
    }
}
