//! HTTP client for the remote duplicate-check endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use cellwatch_core::defaults::{CLASSIFY_PATH, REMOTE_TIMEOUT_SECS};
use cellwatch_core::{
    CheckItem, CheckRequest, CheckResponse, Classification, DedupConfig, DedupError,
    DuplicateClassifier, Result,
};
use reqwest::Client;
use tracing::debug;

/// Longest slice of an error body kept in a `DedupError::Remote` message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Classifies files by POSTing them to `{base_url}/api/duplicates/check`.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpClassifier {
    /// Create a classifier for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(REMOTE_TIMEOUT_SECS))
    }

    /// Create a classifier whose HTTP client gives up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CLASSIFY_PATH),
            timeout,
        })
    }

    pub fn from_config(config: &DedupConfig) -> Result<Self> {
        Self::with_timeout(
            config.classify_url.clone(),
            Duration::from_secs(config.remote_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_error(&self, err: reqwest::Error) -> DedupError {
        if err.is_timeout() {
            DedupError::RemoteTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            DedupError::Remote(format!("request to {} failed: {}", self.endpoint, err))
        }
    }
}

#[async_trait]
impl DuplicateClassifier for HttpClassifier {
    async fn classify(
        &self,
        items: Vec<CheckItem>,
    ) -> std::result::Result<Vec<Classification>, DedupError> {
        let start = Instant::now();
        let expected = items.len();
        let request = CheckRequest { files: items };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(DedupError::Remote(format!(
                "duplicate check returned {}: {}",
                status, body
            )));
        }

        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        let decoded: CheckResponse = serde_json::from_slice(&body)
            .map_err(|e| DedupError::RemoteProtocol(format!("undecodable response: {}", e)))?;

        if decoded.results.len() != expected {
            return Err(DedupError::RemoteProtocol(format!(
                "expected {} results, got {}",
                expected,
                decoded.results.len()
            )));
        }

        debug!(
            result_count = expected,
            duration_ms = start.elapsed().as_millis() as u64,
            "remote: duplicate check answered"
        );

        Ok(decoded
            .results
            .into_iter()
            .map(|item| item.into_classification().unwrap_or_else(Classification::failed))
            .collect())
    }

    fn name(&self) -> &str {
        "http"
    }
}
