//! OCR provider collaborator.
//!
//! The provider is an opaque black box that takes document bytes and
//! returns a graph of text blocks. This module models the wire format,
//! flattens the key/value relationship graph into ordered [`RawPair`]s
//! for the extraction core, and provides the injected HTTP client.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use intake_core::RawPair;

use crate::config::OcrConfig;
use crate::error::{ApiError, internal};

/// One block of the provider's response graph.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OcrBlock {
    pub id: String,
    pub block_type: String,
    pub entity_types: Vec<String>,
    pub text: String,
    pub relationships: Vec<OcrRelationship>,
}

/// Typed edge from one block to others.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrRelationship {
    #[serde(rename = "Type")]
    pub rel_type: String,
    #[serde(rename = "Ids", default)]
    pub ids: Vec<String>,
}

/// Full provider response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OcrResponse {
    pub blocks: Vec<OcrBlock>,
}

/// Join the WORD children reached through a block's relationships of the
/// given type.
fn relationship_text(
    block: &OcrBlock,
    blocks_by_id: &HashMap<&str, &OcrBlock>,
    rel_type: &str,
) -> String {
    let mut text = String::new();
    for rel in &block.relationships {
        if rel.rel_type == rel_type {
            let words: Vec<&str> = rel
                .ids
                .iter()
                .filter_map(|id| blocks_by_id.get(id.as_str()))
                .filter(|child| child.block_type == "WORD")
                .map(|child| child.text.as_str())
                .collect();
            text = words.join(" ");
        }
    }
    text
}

/// Flatten the block graph into ordered key/value pairs.
///
/// Walks every KEY_VALUE_SET block carrying the KEY entity type, joins its
/// child words into the key text, follows the VALUE relationship for the
/// value text, and drops pairs where either side came back empty. Output
/// order follows block order, which downstream last-write-wins semantics
/// depend on.
pub fn flatten_key_values(response: &OcrResponse) -> Vec<RawPair> {
    let blocks_by_id: HashMap<&str, &OcrBlock> = response
        .blocks
        .iter()
        .map(|b| (b.id.as_str(), b))
        .collect();

    let mut pairs = Vec::new();
    for block in &response.blocks {
        if block.block_type != "KEY_VALUE_SET"
            || !block.entity_types.iter().any(|e| e == "KEY")
        {
            continue;
        }

        let key_text = relationship_text(block, &blocks_by_id, "CHILD");
        let value_text = block
            .relationships
            .iter()
            .filter(|rel| rel.rel_type == "VALUE")
            .filter_map(|rel| rel.ids.first())
            .filter_map(|id| blocks_by_id.get(id.as_str()))
            .map(|value_block| relationship_text(value_block, &blocks_by_id, "CHILD"))
            .next_back()
            .unwrap_or_default();

        if !key_text.is_empty() && !value_text.is_empty() {
            pairs.push(RawPair::new(key_text.trim(), value_text.trim()));
        }
    }

    debug!("flattened {} key/value pairs from OCR response", pairs.len());
    pairs
}

/// Injected OCR provider client.
#[async_trait]
pub trait OcrClient: Send + Sync {
    /// Submit a document for analysis and return the block graph.
    async fn analyze(&self, bytes: &[u8], filename: &str) -> Result<OcrResponse, ApiError>;
}

/// HTTP client for an OCR provider endpoint.
pub struct HttpOcrClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpOcrClient {
    pub fn new(config: &OcrConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("reqwest client builds with static options");
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key(),
        }
    }
}

#[async_trait]
impl OcrClient for HttpOcrClient {
    async fn analyze(&self, bytes: &[u8], filename: &str) -> Result<OcrResponse, ApiError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/octet-stream")
            .header("x-intake-filename", filename)
            .body(bytes.to_vec());

        if let Some(ref key) = self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| internal(format!("failed to analyze document with OCR provider: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(internal(format!(
                "OCR provider returned HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json::<OcrResponse>()
            .await
            .map_err(|e| internal(format!("invalid OCR provider response: {e}")))
    }
}
