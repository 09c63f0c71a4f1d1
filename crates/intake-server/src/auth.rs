//! Bearer-token auth: HS256 token issuance, verification, and user login.
//!
//! Tokens use the JWT compact form signed with HMAC-SHA256. Claims carry
//! the username, role, and expiry; nothing else is trusted from the
//! client. Passwords are stored as SHA-256 digests.

use axum::http::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;

use crate::audit::{AuditCategory, Severity, record};
use crate::error::{ApiError, internal, unauthorized};

type HmacSha256 = Hmac<Sha256>;

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    /// Role, checked by the upload endpoint.
    pub role: String,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub access_token: String,
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// SHA-256 hex digest used for password storage and comparison.
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Issue a signed token for the given user.
pub fn issue_token(secret: &str, username: &str, role: &str, ttl_minutes: i64) -> String {
    let claims = Claims {
        sub: username.to_string(),
        role: role.to_string(),
        exp: Utc::now().timestamp() + ttl_minutes * 60,
    };
    encode_token(secret, &claims)
}

fn encode_token(secret: &str, claims: &Claims) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims serialize to JSON"));
    let signing_input = format!("{header}.{payload}");
    let signature = URL_SAFE_NO_PAD.encode(hmac_sha256(secret.as_bytes(), signing_input.as_bytes()));
    format!("{signing_input}.{signature}")
}

/// Verify a token's signature and expiry, returning its claims.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    let mut parts = token.split('.');
    let (header, payload, signature) = match (parts.next(), parts.next(), parts.next(), parts.next())
    {
        (Some(h), Some(p), Some(s), None) => (h, p, s),
        _ => return Err(unauthorized("invalid token")),
    };

    let signing_input = format!("{header}.{payload}");
    let provided = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| unauthorized("invalid token"))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(signing_input.as_bytes());
    if mac.verify_slice(&provided).is_err() {
        return Err(unauthorized("invalid token"));
    }

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| unauthorized("invalid token"))?;
    let claims: Claims =
        serde_json::from_slice(&claims_bytes).map_err(|_| unauthorized("invalid token"))?;

    if claims.sub.is_empty() || claims.role.is_empty() {
        return Err(unauthorized("invalid token"));
    }
    if Utc::now().timestamp() > claims.exp {
        return Err(unauthorized("token has expired"));
    }

    Ok(claims)
}

/// Verify an existing token and issue a fresh one for the same user.
pub fn refresh_token(secret: &str, token: &str, ttl_minutes: i64) -> Result<String, ApiError> {
    let claims = verify_token(secret, token)?;
    Ok(issue_token(secret, &claims.sub, &claims.role, ttl_minutes))
}

/// Check username/password against the users table and issue a token.
///
/// Both failure modes are logged distinctly but surfaced with one generic
/// message, so the response does not leak which usernames exist.
pub async fn authenticate(
    pool: &SqlitePool,
    secret: &str,
    ttl_minutes: i64,
    username: &str,
    password: &str,
) -> Result<AuthResponse, ApiError> {
    let row = sqlx::query("SELECT user_id, username, password_digest, role FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(|e| internal(format!("failed to authenticate user: {e}")))?;

    let Some(row) = row else {
        record(
            pool,
            AuditCategory::UserInteraction,
            Severity::Error,
            "Username does not exist",
        )
        .await;
        return Err(unauthorized("Username or password is incorrect"));
    };

    let stored_digest: String = row.get("password_digest");
    if stored_digest != password_digest(password) {
        record(
            pool,
            AuditCategory::UserInteraction,
            Severity::Error,
            &format!("Incorrect password for username: {username}"),
        )
        .await;
        return Err(unauthorized("Username or password is incorrect"));
    }

    let user_id: i64 = row.get("user_id");
    let username: String = row.get("username");
    let role: String = row.get("role");
    let access_token = issue_token(secret, &username, &role, ttl_minutes);

    record(
        pool,
        AuditCategory::UserInteraction,
        Severity::Info,
        &format!("user_id:{user_id}, successfully authenticated."),
    )
    .await;

    Ok(AuthResponse {
        user_id,
        username,
        role,
        access_token,
    })
}

/// Pull the bearer token out of the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("missing Authorization header"))?;
    let value = value
        .to_str()
        .map_err(|_| unauthorized("invalid Authorization header"))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("expected a bearer token"))
}

/// Verify the request's bearer token, returning its claims.
pub fn require_auth(headers: &HeaderMap, secret: &str) -> Result<Claims, ApiError> {
    verify_token(secret, bearer_token(headers)?)
}
