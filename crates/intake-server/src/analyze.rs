//! Document analysis: OCR, field extraction, classification, persistence.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tracing::info;

use intake_core::{
    CanonicalField, CanonicalRecord, SchemaTag, SynonymTable, classify_record, extract_fields,
    normalize_date,
};

use crate::db::now_timestamp;
use crate::error::{ApiError, bad_request, internal};
use crate::ocr::{OcrClient, flatten_key_values};

/// File extensions the analysis endpoint accepts.
const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];

/// Result of a successful analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub message: String,
    pub schema: SchemaTag,
    pub id: i64,
}

fn extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// Run the full analysis pipeline for one uploaded document.
pub async fn analyze_document(
    pool: &SqlitePool,
    ocr: &Arc<dyn OcrClient>,
    table: &SynonymTable,
    filename: &str,
    bytes: &[u8],
) -> Result<AnalysisOutcome, ApiError> {
    let ext = extension(filename)
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(bad_request(
            "file type not allowed. Only PDF, JPG, or PNG files are accepted",
        ));
    }

    let response = ocr.analyze(bytes, filename).await?;
    let pairs = flatten_key_values(&response);
    let record = extract_fields(&pairs, table);
    let classified = classify_record(record);

    info!(
        "extracted {} fields from {filename}, routed to {}",
        classified.record.len(),
        classified.tag
    );

    let (id, message) = match classified.tag {
        SchemaTag::Invoice => {
            let id = insert_invoice(pool, &classified.record).await?;
            (id, "Invoice stored in the database.".to_string())
        }
        SchemaTag::Information => {
            let id = insert_information(pool, &classified.record).await?;
            (id, "Information stored in the database.".to_string())
        }
    };

    Ok(AnalysisOutcome {
        message,
        schema: classified.tag,
        id,
    })
}

/// Persist an invoice-tagged record, returning the generated row id.
async fn insert_invoice(pool: &SqlitePool, record: &CanonicalRecord) -> Result<i64, ApiError> {
    // The extracted date keeps its raw form in the record; only the
    // persisted column is folded to ISO.
    let invoice_date = record
        .get(CanonicalField::InvoiceDate)
        .and_then(normalize_date)
        .map(|d| d.to_string());

    let result = sqlx::query(
        "INSERT INTO invoices (client_name, client_address, supplier_name, supplier_address, \
         invoice_number, invoice_date, total_invoice, products, timestamp) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.get(CanonicalField::ClientName))
    .bind(record.get(CanonicalField::ClientAddress))
    .bind(record.get(CanonicalField::SupplierName))
    .bind(record.get(CanonicalField::SupplierAddress))
    .bind(record.get(CanonicalField::InvoiceNumber))
    .bind(invoice_date)
    .bind(record.get(CanonicalField::TotalInvoice))
    .bind(record.get(CanonicalField::Products))
    .bind(now_timestamp())
    .execute(pool)
    .await
    .map_err(|e| internal(format!("failed to store invoice: {e}")))?;

    Ok(result.last_insert_rowid())
}

/// Persist an information-tagged record, returning the generated row id.
async fn insert_information(pool: &SqlitePool, record: &CanonicalRecord) -> Result<i64, ApiError> {
    let result = sqlx::query(
        "INSERT INTO information (description, summary, timestamp) VALUES (?, ?, ?)",
    )
    .bind(record.get(CanonicalField::Description))
    .bind(record.get(CanonicalField::Summary))
    .bind(now_timestamp())
    .execute(pool)
    .await
    .map_err(|e| internal(format!("failed to store information: {e}")))?;

    Ok(result.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, init_schema};
    use crate::ocr::OcrResponse;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use sqlx::Row;

    /// OCR client returning a canned block graph.
    struct FixedOcr(&'static str);

    #[async_trait]
    impl OcrClient for FixedOcr {
        async fn analyze(&self, _bytes: &[u8], _filename: &str) -> Result<OcrResponse, ApiError> {
            Ok(serde_json::from_str(self.0).unwrap())
        }
    }

    const INVOICE_BLOCKS: &str = r#"{
        "Blocks": [
            {"Id": "k1", "BlockType": "KEY_VALUE_SET", "EntityTypes": ["KEY"],
             "Relationships": [
                {"Type": "CHILD", "Ids": ["w1"]}, {"Type": "VALUE", "Ids": ["v1"]}
             ]},
            {"Id": "k2", "BlockType": "KEY_VALUE_SET", "EntityTypes": ["KEY"],
             "Relationships": [
                {"Type": "CHILD", "Ids": ["w2", "w3", "w4"]}, {"Type": "VALUE", "Ids": ["v2"]}
             ]},
            {"Id": "v1", "BlockType": "KEY_VALUE_SET", "EntityTypes": ["VALUE"],
             "Relationships": [{"Type": "CHILD", "Ids": ["w5"]}]},
            {"Id": "v2", "BlockType": "KEY_VALUE_SET", "EntityTypes": ["VALUE"],
             "Relationships": [{"Type": "CHILD", "Ids": ["w6"]}]},
            {"Id": "w1", "BlockType": "WORD", "Text": "Cliente"},
            {"Id": "w2", "BlockType": "WORD", "Text": "Fecha"},
            {"Id": "w3", "BlockType": "WORD", "Text": "de"},
            {"Id": "w4", "BlockType": "WORD", "Text": "emisión"},
            {"Id": "w5", "BlockType": "WORD", "Text": "Juan"},
            {"Id": "w6", "BlockType": "WORD", "Text": "29/11/2024"}
        ]
    }"#;

    const NOTE_BLOCKS: &str = r#"{
        "Blocks": [
            {"Id": "k1", "BlockType": "KEY_VALUE_SET", "EntityTypes": ["KEY"],
             "Relationships": [
                {"Type": "CHILD", "Ids": ["w1"]}, {"Type": "VALUE", "Ids": ["v1"]}
             ]},
            {"Id": "v1", "BlockType": "KEY_VALUE_SET", "EntityTypes": ["VALUE"],
             "Relationships": [{"Type": "CHILD", "Ids": ["w2"]}]},
            {"Id": "w1", "BlockType": "WORD", "Text": "Resumen"},
            {"Id": "w2", "BlockType": "WORD", "Text": "acta"}
        ]
    }"#;

    #[tokio::test]
    async fn test_invoice_document_persisted_with_iso_date() {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        let ocr: Arc<dyn OcrClient> = Arc::new(FixedOcr(INVOICE_BLOCKS));
        let table = SynonymTable::rich();

        let outcome = analyze_document(&pool, &ocr, &table, "scan.pdf", b"%PDF-")
            .await
            .unwrap();
        assert_eq!(outcome.schema, SchemaTag::Invoice);
        assert_eq!(outcome.message, "Invoice stored in the database.");

        let row = sqlx::query("SELECT client_name, invoice_date FROM invoices WHERE id = ?")
            .bind(outcome.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.get::<String, _>("client_name"), "Juan");
        assert_eq!(row.get::<String, _>("invoice_date"), "2024-11-29");
    }

    #[tokio::test]
    async fn test_information_document_persisted() {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        let ocr: Arc<dyn OcrClient> = Arc::new(FixedOcr(NOTE_BLOCKS));
        let table = SynonymTable::rich();

        let outcome = analyze_document(&pool, &ocr, &table, "note.png", b"\x89PNG")
            .await
            .unwrap();
        assert_eq!(outcome.schema, SchemaTag::Information);

        let row = sqlx::query("SELECT summary FROM information WHERE id = ?")
            .bind(outcome.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.get::<String, _>("summary"), "acta");
    }

    #[tokio::test]
    async fn test_disallowed_extension_rejected() {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        let ocr: Arc<dyn OcrClient> = Arc::new(FixedOcr(NOTE_BLOCKS));
        let table = SynonymTable::rich();

        for name in ["macro.docx", "noext"] {
            let err = analyze_document(&pool, &ocr, &table, name, b"x")
                .await
                .unwrap_err();
            assert_eq!(err.code, "bad_request");
        }
    }
}
