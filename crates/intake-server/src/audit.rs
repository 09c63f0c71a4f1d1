//! Append-only audit log and its paginated query.
//!
//! Every request category writes here: uploads, analyses, and user
//! interactions. Entries are never mutated after insert; the `/history`
//! endpoint reads them back with optional filters and pagination.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tracing::error;

use crate::db::{TIMESTAMP_FORMAT, now_timestamp};
use crate::error::{ApiError, bad_request};

/// Audit entry category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    /// File upload endpoint activity.
    DocumentUpload,
    /// Document analysis activity.
    Analysis,
    /// Login, token refresh, permission checks.
    UserInteraction,
}

impl AuditCategory {
    pub const ALL: [AuditCategory; 3] = [
        AuditCategory::DocumentUpload,
        AuditCategory::Analysis,
        AuditCategory::UserInteraction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCategory::DocumentUpload => "document_upload",
            AuditCategory::Analysis => "analysis",
            AuditCategory::UserInteraction => "user_interaction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

/// Entry severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
        }
    }
}

/// Append an audit entry.
///
/// A failed audit write must never fail the request it describes, so the
/// error is traced and swallowed here.
pub async fn record(pool: &SqlitePool, category: AuditCategory, severity: Severity, message: &str) {
    let result = sqlx::query(
        "INSERT INTO logs (level, message, log_type, timestamp) VALUES (?, ?, ?, ?)",
    )
    .bind(category.as_str())
    .bind(message)
    .bind(severity.as_str())
    .bind(now_timestamp())
    .execute(pool)
    .await;

    if let Err(e) = result {
        error!("failed to store audit entry: {e}");
    }
}

/// Query parameters for the history endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Filter by audit category.
    pub category: Option<String>,
    /// Substring filter on the message.
    pub description: Option<String>,
    /// Inclusive lower timestamp bound.
    pub start_date: Option<String>,
    /// Inclusive upper timestamp bound.
    pub end_date: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub page_size: Option<u32>,
}

/// One audit entry as returned by the history endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: i64,
    pub category: String,
    pub description: String,
    pub severity: String,
    pub datetime: String,
}

/// A page of audit entries plus pagination totals.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub total_records: i64,
    pub total_pages: i64,
    pub current_page: u32,
    pub page_size: u32,
    pub records: Vec<AuditEntry>,
}

/// Accepted layouts for the date filters.
const QUERY_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a filter bound into the storage timestamp layout. Date-only input
/// means midnight.
fn parse_bound(raw: &str) -> Result<String, ApiError> {
    let raw = raw.trim();
    for fmt in QUERY_DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.format(TIMESTAMP_FORMAT).to_string());
        }
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
        return Ok(midnight.format(TIMESTAMP_FORMAT).to_string());
    }
    Err(bad_request(format!(
        "invalid date: {raw}. Accepted layouts: YYYY-MM-DD HH:MM:SS, YYYY-MM-DDTHH:MM:SS, YYYY-MM-DD"
    )))
}

/// Run the filtered, paginated history query.
pub async fn query_history(pool: &SqlitePool, query: &HistoryQuery) -> Result<HistoryPage, ApiError> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(10);
    if page < 1 {
        return Err(bad_request("page must be >= 1"));
    }
    if page_size < 1 {
        return Err(bad_request("page_size must be >= 1"));
    }

    // Build the shared WHERE clause; bind values in push order.
    let mut where_sql = String::from(" FROM logs WHERE 1=1");
    let mut binds: Vec<String> = Vec::new();

    if let Some(raw) = query.category.as_deref() {
        let category = AuditCategory::parse(raw).ok_or_else(|| {
            let allowed: Vec<&str> = AuditCategory::ALL.iter().map(|c| c.as_str()).collect();
            bad_request(format!(
                "invalid category: {raw}. Allowed categories: {}",
                allowed.join(", ")
            ))
        })?;
        where_sql.push_str(" AND level = ?");
        binds.push(category.as_str().to_string());
    }

    if let Some(description) = query.description.as_deref() {
        where_sql.push_str(" AND message LIKE ?");
        binds.push(format!("%{description}%"));
    }

    if let Some(raw) = query.start_date.as_deref() {
        where_sql.push_str(" AND timestamp >= ?");
        binds.push(parse_bound(raw)?);
    }

    if let Some(raw) = query.end_date.as_deref() {
        where_sql.push_str(" AND timestamp <= ?");
        binds.push(parse_bound(raw)?);
    }

    let count_sql = format!("SELECT COUNT(*){where_sql}");
    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind.as_str());
    }
    let (total_records,) = count_query.fetch_one(pool).await?;

    let total_pages = total_records / i64::from(page_size)
        + if total_records % i64::from(page_size) > 0 {
            1
        } else {
            0
        };

    let offset = i64::from(page - 1) * i64::from(page_size);
    let page_sql = format!(
        "SELECT id, level, message, log_type, timestamp{where_sql} \
         ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?"
    );
    let mut page_query = sqlx::query(&page_sql);
    for bind in &binds {
        page_query = page_query.bind(bind.as_str());
    }
    page_query = page_query.bind(i64::from(page_size)).bind(offset);

    let rows = page_query.fetch_all(pool).await?;
    let records = rows
        .into_iter()
        .map(|row| AuditEntry {
            id: row.get("id"),
            category: row.get("level"),
            description: row.get("message"),
            severity: row.get("log_type"),
            datetime: row.get("timestamp"),
        })
        .collect();

    Ok(HistoryPage {
        total_records,
        total_pages,
        current_page: page,
        page_size,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, init_schema};
    use pretty_assertions::assert_eq;

    async fn seeded_pool() -> SqlitePool {
        let pool = connect_in_memory().await.unwrap();
        init_schema(&pool).await.unwrap();
        // Insert with explicit timestamps so ordering is deterministic.
        for (i, (category, severity)) in [
            (AuditCategory::UserInteraction, Severity::Info),
            (AuditCategory::Analysis, Severity::Info),
            (AuditCategory::Analysis, Severity::Error),
            (AuditCategory::DocumentUpload, Severity::Info),
            (AuditCategory::Analysis, Severity::Info),
        ]
        .iter()
        .enumerate()
        {
            sqlx::query("INSERT INTO logs (level, message, log_type, timestamp) VALUES (?, ?, ?, ?)")
                .bind(category.as_str())
                .bind(format!("entry {i}"))
                .bind(severity.as_str())
                .bind(format!("2024-11-{:02} 10:00:00", i + 1))
                .execute(&pool)
                .await
                .unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_unfiltered_query_pages_newest_first() {
        let pool = seeded_pool().await;
        let page = query_history(
            &pool,
            &HistoryQuery {
                page_size: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(page.total_records, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].description, "entry 4");
        assert_eq!(page.records[1].description, "entry 3");
    }

    #[tokio::test]
    async fn test_category_filter() {
        let pool = seeded_pool().await;
        let page = query_history(
            &pool,
            &HistoryQuery {
                category: Some("analysis".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total_records, 3);
        assert!(page.records.iter().all(|r| r.category == "analysis"));
    }

    #[tokio::test]
    async fn test_invalid_category_rejected() {
        let pool = seeded_pool().await;
        let err = query_history(
            &pool,
            &HistoryQuery {
                category: Some("bogus".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "bad_request");
    }

    #[tokio::test]
    async fn test_description_and_date_filters() {
        let pool = seeded_pool().await;
        let page = query_history(
            &pool,
            &HistoryQuery {
                description: Some("entry".to_string()),
                start_date: Some("2024-11-02".to_string()),
                end_date: Some("2024-11-04T23:59:59".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total_records, 3);
        assert_eq!(page.records[0].description, "entry 3");
        assert_eq!(page.records[2].description, "entry 1");
    }

    #[tokio::test]
    async fn test_pagination_bounds_validated() {
        let pool = seeded_pool().await;
        let err = query_history(
            &pool,
            &HistoryQuery {
                page: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "bad_request");
    }

    #[tokio::test]
    async fn test_record_swallows_failures() {
        // A pool without the logs table: the insert fails but must not panic.
        let pool = connect_in_memory().await.unwrap();
        record(&pool, AuditCategory::Analysis, Severity::Info, "dropped").await;
    }

    #[test]
    fn test_parse_bound_layouts() {
        assert_eq!(parse_bound("2024-11-29").unwrap(), "2024-11-29 00:00:00");
        assert_eq!(
            parse_bound("2024-11-29T08:42:58").unwrap(),
            "2024-11-29 08:42:58"
        );
        assert!(parse_bound("29/11/2024").is_err());
    }
}
