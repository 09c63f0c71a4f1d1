//! HTTP surface of the intake service.
//!
//! # Endpoints
//!
//! | Method | Path                | Description                              |
//! |--------|---------------------|------------------------------------------|
//! | `POST` | `/login`            | Issue an access token                    |
//! | `POST` | `/refresh-token`    | Re-issue a token before it expires       |
//! | `POST` | `/analyze-document` | OCR, extract, classify, persist          |
//! | `POST` | `/upload`           | Validate and store a CSV file (admin)    |
//! | `GET`  | `/history`          | Paginated audit-log query                |
//! | `GET`  | `/health`           | Health check (returns version)           |
//!
//! All protected endpoints take a `Authorization: Bearer <token>` header.
//! Error responses follow the schema in [`crate::error`].

use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use intake_core::SynonymTable;

use crate::analyze::{AnalysisOutcome, analyze_document};
use crate::audit::{AuditCategory, HistoryPage, HistoryQuery, Severity, query_history, record};
use crate::auth::{AuthResponse, authenticate, bearer_token, refresh_token, require_auth};
use crate::config::{ServerConfig, StorageBackend};
use crate::db;
use crate::error::{ApiError, bad_request, forbidden};
use crate::ocr::{HttpOcrClient, OcrClient};
use crate::storage::{FsStore, ObjectStore, S3Store};
use crate::upload::{UploadOutcome, handle_upload};

/// Shared application state passed to all route handlers.
///
/// The OCR and object-store clients are trait objects so deployments and
/// tests can inject their own implementations.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub secret: Arc<String>,
    pub pool: SqlitePool,
    pub ocr: Arc<dyn OcrClient>,
    pub store: Arc<dyn ObjectStore>,
    pub table: Arc<SynonymTable>,
}

/// Build the router for the given state.
pub fn router(state: AppState) -> Router {
    let origin = state
        .config
        .server
        .cors_origin
        .parse::<HeaderValue>()
        .expect("cors_origin is a valid header value");

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/login", post(handle_login))
        .route("/refresh-token", post(handle_refresh))
        .route("/analyze-document", post(handle_analyze))
        .route("/upload", post(handle_upload_file))
        .route("/history", get(handle_history))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Start the intake API with clients built from configuration.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &ServerConfig) -> anyhow::Result<()> {
    let secret = config.auth.secret()?;

    let pool = db::connect(&config.database.path).await?;
    db::init_schema(&pool).await?;

    if let Some(password) = config.auth.seed_password() {
        let digest = crate::auth::password_digest(&password);
        if db::seed_admin(&pool, &config.auth.seed_username, &digest).await? {
            info!("seeded user {}", config.auth.seed_username);
        }
    }

    let ocr: Arc<dyn OcrClient> = Arc::new(HttpOcrClient::new(&config.ocr));
    let store: Arc<dyn ObjectStore> = match config.storage.backend {
        StorageBackend::Fs => Arc::new(FsStore::new(config.storage.root.clone())),
        StorageBackend::S3 => Arc::new(S3Store::new(&config.storage)),
    };

    let state = AppState {
        config: Arc::new(config.clone()),
        secret: Arc::new(secret),
        pool,
        ocr,
        store,
        table: Arc::new(SynonymTable::rich()),
    };

    let bind = state.config.server.bind.clone();
    let app = router(state);

    info!("intake API listening on http://{bind}");
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ POST /login ============

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = authenticate(
        &state.pool,
        &state.secret,
        state.config.auth.token_ttl_minutes,
        &request.username,
        &request.password,
    )
    .await?;
    Ok(Json(response))
}

// ============ POST /refresh-token ============

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
}

async fn handle_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let access_token = refresh_token(&state.secret, token, state.config.auth.token_ttl_minutes)?;
    record(
        &state.pool,
        AuditCategory::UserInteraction,
        Severity::Info,
        "successfully refreshed access token.",
    )
    .await;
    Ok(Json(TokenResponse { access_token }))
}

// ============ POST /analyze-document ============

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    status: String,
    data: AnalysisOutcome,
}

/// Read the first file field out of a multipart body.
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read file field: {e}")))?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(bad_request("no file field in request"))
}

async fn handle_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    require_auth(&headers, &state.secret)?;
    let (filename, bytes) = read_file_field(&mut multipart).await?;

    match analyze_document(&state.pool, &state.ocr, &state.table, &filename, &bytes).await {
        Ok(outcome) => {
            record(
                &state.pool,
                AuditCategory::Analysis,
                Severity::Info,
                &format!("{} ID: {}", outcome.message, outcome.id),
            )
            .await;
            Ok(Json(AnalyzeResponse {
                status: "success".to_string(),
                data: outcome,
            }))
        }
        Err(err) => {
            record(
                &state.pool,
                AuditCategory::Analysis,
                Severity::Error,
                &format!("failed to analyze document: {err}"),
            )
            .await;
            Err(err)
        }
    }
}

// ============ POST /upload ============

async fn handle_upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadOutcome>, ApiError> {
    let claims = require_auth(&headers, &state.secret)?;
    if claims.role != "admin" {
        record(
            &state.pool,
            AuditCategory::UserInteraction,
            Severity::Error,
            &format!("user {} denied upload: role {}", claims.sub, claims.role),
        )
        .await;
        return Err(forbidden("you do not have permission to perform this action"));
    }

    let (filename, bytes) = read_file_field(&mut multipart).await?;
    let outcome = handle_upload(&state.pool, &state.store, &filename, &bytes).await?;
    Ok(Json(outcome))
}

// ============ GET /history ============

#[derive(Debug, Serialize)]
struct HistoryResponse {
    status: String,
    total_records: i64,
    total_pages: i64,
    current_page: u32,
    page_size: u32,
    data: Vec<crate::audit::AuditEntry>,
}

impl From<HistoryPage> for HistoryResponse {
    fn from(page: HistoryPage) -> Self {
        Self {
            status: "success".to_string(),
            total_records: page.total_records,
            total_pages: page.total_pages,
            current_page: page.current_page,
            page_size: page.page_size,
            data: page.records,
        }
    }
}

async fn handle_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    require_auth(&headers, &state.secret)?;
    let page = query_history(&state.pool, &query).await?;
    Ok(Json(page.into()))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
