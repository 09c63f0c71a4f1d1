//! Configuration structures for the intake service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the intake service.
///
/// Secrets are never stored here: the file only names the environment
/// variables they are read from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listener configuration.
    pub server: HttpConfig,

    /// Database configuration.
    pub database: DatabaseConfig,

    /// Auth token configuration.
    pub auth: AuthConfig,

    /// OCR provider configuration.
    pub ocr: OcrConfig,

    /// Object storage configuration.
    pub storage: StorageConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address, host:port.
    pub bind: String,

    /// Allowed CORS origin for the browser frontend.
    pub cors_origin: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("intake.db"),
        }
    }
}

/// Auth token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Access token lifetime in minutes.
    pub token_ttl_minutes: i64,

    /// Environment variable holding the token signing secret.
    pub secret_env: String,

    /// Username seeded on first start when the users table is empty.
    pub seed_username: String,

    /// Environment variable holding the seed user's password. Seeding is
    /// skipped when unset.
    pub seed_password_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 15,
            secret_env: "INTAKE_SECRET_KEY".to_string(),
            seed_username: "admin".to_string(),
            seed_password_env: "INTAKE_ADMIN_PASSWORD".to_string(),
        }
    }
}

impl AuthConfig {
    /// Resolve the signing secret from the environment.
    pub fn secret(&self) -> anyhow::Result<String> {
        std::env::var(&self.secret_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", self.secret_env))
    }

    /// Resolve the seed password, if configured.
    pub fn seed_password(&self) -> Option<String> {
        std::env::var(&self.seed_password_env).ok()
    }
}

/// OCR provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Endpoint that accepts a document and returns the block graph.
    pub endpoint: String,

    /// Environment variable holding the provider API key (optional).
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9000/analyze".to_string(),
            api_key_env: "INTAKE_OCR_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl OcrConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }
}

/// Object storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Local filesystem directory.
    Fs,
    /// S3-compatible bucket.
    S3,
}

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Which backend to construct.
    pub backend: StorageBackend,

    /// Root directory for the `fs` backend.
    pub root: PathBuf,

    /// Bucket name for the `s3` backend.
    pub bucket: String,

    /// Bucket region for the `s3` backend.
    pub region: String,

    /// Custom S3-compatible endpoint (MinIO, LocalStack). Standard AWS
    /// host derivation when unset.
    pub endpoint: Option<String>,

    /// Key prefix for stored uploads.
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Fs,
            root: PathBuf::from("storage"),
            bucket: String::new(),
            region: "us-east-2".to_string(),
            endpoint: None,
            prefix: "files".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_roundtrip() {
        let config = ServerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.server.bind, config.server.bind);
        assert_eq!(back.auth.token_ttl_minutes, 15);
        assert_eq!(back.storage.backend, StorageBackend::Fs);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"server": {"bind": "0.0.0.0:8080"}}"#).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.server.cors_origin, "http://localhost:3000");
        assert_eq!(config.database.path, PathBuf::from("intake.db"));
    }
}
