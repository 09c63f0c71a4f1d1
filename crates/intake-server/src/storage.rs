//! Object storage collaborator.
//!
//! Uploaded files are kept as opaque blobs. Two backends: a local
//! filesystem directory for development, and an S3-compatible bucket
//! reached through the REST API with AWS SigV4 signing (pure-Rust `hmac`
//! + `sha2`, no vendor SDK).

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::config::StorageConfig;
use crate::error::{ApiError, forbidden, internal};

type HmacSha256 = Hmac<Sha256>;

/// Injected blob store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a blob under `key`, returning the stored location.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, ApiError>;
}

// ============ Filesystem backend ============

/// Local-directory store.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<String, ApiError> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| internal(format!("failed to create storage directory: {e}")))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| internal(format!("failed to store file: {e}")))?;
        Ok(path.display().to_string())
    }
}

// ============ S3 backend ============

/// AWS credentials loaded from environment variables.
struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl AwsCredentials {
    /// Load credentials from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
    /// and optionally `AWS_SESSION_TOKEN`.
    fn from_env() -> Result<Self, ApiError> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| forbidden("AWS_ACCESS_KEY_ID environment variable not set"))?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| forbidden("AWS_SECRET_ACCESS_KEY environment variable not set"))?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }
}

/// S3-compatible store using signed PUT requests.
pub struct S3Store {
    client: reqwest::Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl S3Store {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    fn host(&self) -> String {
        if let Some(ref endpoint) = self.endpoint {
            // Custom endpoint (MinIO, LocalStack, etc.)
            endpoint
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string()
        } else {
            format!("{}.s3.{}.amazonaws.com", self.bucket, self.region)
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, ApiError> {
        let creds = AwsCredentials::from_env()?;

        let host = self.host();
        let encoded_key = key.split('/').map(uri_encode).collect::<Vec<_>>().join("/");
        let url = format!("https://{}/{}", host, encoded_key);

        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let payload_hash = hex_sha256(bytes);

        let mut headers = vec![
            ("content-type".to_string(), content_type.to_string()),
            ("host".to_string(), host.clone()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(ref token) = creds.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers: String = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v))
            .collect();

        let canonical_uri = format!("/{}", encoded_key);
        let canonical_request = format!(
            "PUT\n{}\n\n{}\n{}\n{}",
            canonical_uri, canonical_headers, signed_headers, payload_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key =
            derive_signing_key(&creds.secret_access_key, &date_stamp, &self.region, "s3");
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            creds.access_key_id, credential_scope, signed_headers, signature
        );

        let mut request = self
            .client
            .put(&url)
            .header("Authorization", &authorization)
            .header("content-type", content_type)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &amz_date)
            .body(bytes.to_vec());

        if let Some(ref token) = creds.session_token {
            request = request.header("x-amz-security-token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| internal(format!("failed to store s3://{}/{}: {e}", self.bucket, key)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(internal(format!(
                "S3 PutObject failed (HTTP {status}) for key '{key}': {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(format!("s3://{}/{}", self.bucket, key))
    }
}

// ============ SigV4 helpers ============

/// Compute the hex-encoded SHA-256 hash of data.
fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute HMAC-SHA256 of data with the given key.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Compute hex-encoded HMAC-SHA256.
fn hex_hmac_sha256(key: &[u8], data: &[u8]) -> String {
    hex::encode(hmac_sha256(key, data))
}

/// Derive the AWS SigV4 signing key for a given date, region, and service.
///
/// ```text
/// kDate    = HMAC("AWS4" + secret, dateStamp)
/// kRegion  = HMAC(kDate, region)
/// kService = HMAC(kRegion, service)
/// kSigning = HMAC(kService, "aws4_request")
/// ```
fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// URI-encode a string per RFC 3986 (used in SigV4 canonical requests).
///
/// Encodes all characters except unreserved characters:
/// `A-Z a-z 0-9 - _ . ~`
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_fs_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let location = store
            .put("files/report.csv", b"a,b\n1,2\n", "text/csv")
            .await
            .unwrap();
        let written = std::fs::read(dir.path().join("files/report.csv")).unwrap();
        assert_eq!(written, b"a,b\n1,2\n");
        assert!(location.ends_with("files/report.csv"));
    }

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("simple-key_1.csv"), "simple-key_1.csv");
        assert_eq!(uri_encode("a b"), "a%20b");
        assert_eq!(uri_encode("ñ"), "%C3%B1");
    }

    #[test]
    fn test_derive_signing_key_known_vector() {
        // Example from the AWS SigV4 documentation.
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_s3_host_derivation() {
        let config = StorageConfig {
            bucket: "intake-files".to_string(),
            region: "us-east-2".to_string(),
            ..Default::default()
        };
        assert_eq!(
            S3Store::new(&config).host(),
            "intake-files.s3.us-east-2.amazonaws.com"
        );

        let custom = StorageConfig {
            endpoint: Some("http://localhost:9000/".to_string()),
            ..config
        };
        assert_eq!(S3Store::new(&custom).host(), "localhost:9000");
    }
}
