//! CSV file intake: validation, row persistence, and blob storage.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;

use crate::audit::{AuditCategory, Severity, record};
use crate::error::{ApiError, bad_request, internal};
use crate::storage::ObjectStore;

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub message: String,
    pub stored_rows: usize,
    pub location: String,
}

/// Validate CSV contents, returning every violation found.
///
/// The file must parse as CSV with a header row, have exactly two columns,
/// contain no empty values, no duplicate rows, and no all-numeric columns
/// (the expected payload is textual).
pub fn validate_csv(contents: &[u8]) -> Result<Vec<String>, ApiError> {
    let text = std::str::from_utf8(contents)
        .map_err(|_| bad_request("file is not valid UTF-8"))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| bad_request(format!("failed to parse CSV: {e}")))?
        .clone();

    let mut issues = Vec::new();
    if headers.len() != 2 {
        issues.push("file does not have exactly 2 columns".to_string());
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| bad_request(format!("failed to parse CSV: {e}")))?;
        if row.len() != headers.len() {
            issues.push("file does not have exactly 2 columns".to_string());
            break;
        }
        rows.push(row.iter().map(|f| f.to_string()).collect());
    }

    if rows.iter().any(|row| row.iter().any(|v| v.trim().is_empty())) {
        issues.push("file contains empty values".to_string());
    }

    let mut seen = HashSet::new();
    if rows.iter().any(|row| !seen.insert(row.clone())) {
        issues.push("file contains duplicate rows".to_string());
    }

    // Textual payload expected: flag any column where every value is numeric.
    if !rows.is_empty() {
        for col in 0..headers.len() {
            let all_numeric = rows
                .iter()
                .filter_map(|row| row.get(col))
                .all(|v| v.trim().parse::<f64>().is_ok());
            if all_numeric {
                issues.push("file contains incorrect data types".to_string());
                break;
            }
        }
    }

    Ok(issues)
}

/// Parse the two-column rows out of validated CSV contents.
fn read_rows(contents: &[u8]) -> Result<Vec<(String, String)>, ApiError> {
    let text = std::str::from_utf8(contents)
        .map_err(|_| bad_request("file is not valid UTF-8"))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| bad_request(format!("failed to parse CSV: {e}")))?;
        rows.push((row[0].to_string(), row[1].to_string()));
    }
    Ok(rows)
}

/// Handle a CSV upload end to end: validate, persist rows, store the blob.
pub async fn handle_upload(
    pool: &SqlitePool,
    store: &Arc<dyn ObjectStore>,
    filename: &str,
    contents: &[u8],
) -> Result<UploadOutcome, ApiError> {
    if contents.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(bad_request("file is empty"));
    }
    if !filename.ends_with(".csv") {
        return Err(bad_request("file is not a CSV"));
    }

    let issues = validate_csv(contents)?;
    if !issues.is_empty() {
        let message = format!("validation errors: {}", issues.join("; "));
        record(pool, AuditCategory::DocumentUpload, Severity::Error, &message).await;
        return Err(bad_request(message));
    }

    let rows = read_rows(contents)?;
    let stored_rows = store_rows(pool, &rows).await?;

    let key = format!("files/{filename}");
    let location = store.put(&key, contents, "text/csv").await?;

    let message = format!("file stored at {location}");
    record(pool, AuditCategory::DocumentUpload, Severity::Info, &message).await;

    Ok(UploadOutcome {
        message,
        stored_rows,
        location,
    })
}

/// Insert the rows in one transaction.
async fn store_rows(pool: &SqlitePool, rows: &[(String, String)]) -> Result<usize, ApiError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| internal(format!("failed to store file rows: {e}")))?;

    for (column1, column2) in rows {
        sqlx::query("INSERT INTO uploaded_rows (column1, column2) VALUES (?, ?)")
            .bind(column1)
            .bind(column2)
            .execute(&mut *tx)
            .await
            .map_err(|e| internal(format!("failed to store file rows: {e}")))?;
    }

    tx.commit()
        .await
        .map_err(|e| internal(format!("failed to store file rows: {e}")))?;
    Ok(rows.len())
}
