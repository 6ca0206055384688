//! Text-generation forwarding.
//!
//! Payloads are relayed to one fixed endpoint without transformation and
//! without retries. Upstream error bodies are handed back to the caller as
//! `details`, unlike every other route.

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;

use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// Upstream answered with a non-success status.
    #[error("generation endpoint returned HTTP {status}")]
    Upstream { status: u16, details: Value },

    /// The endpoint could not be reached or the body could not be read.
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Successful upstream reply, relayed verbatim.
#[derive(Debug)]
pub struct GenerationReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct GenerationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GenerationClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    pub async fn forward(&self, payload: &Value) -> Result<GenerationReply, GenerationError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .inspect_err(|_| metrics::record_upstream_error("generation"))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            metrics::record_upstream_error("generation");
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                details: details_from_body(&body),
            });
        }

        Ok(GenerationReply {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Upstream error body as JSON when it parses, otherwise as a string.
fn details_from_body(body: &[u8]) -> Value {
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}
