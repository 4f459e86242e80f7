//! HTTP client helpers for tests.

use rerank::{ErrorResponse, RerankRequest, RerankResponse};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    pub async fn rerank(&self, query: &str, docs: &[&str]) -> Result<Vec<f32>, TestClientError> {
        let request = RerankRequest {
            query: query.to_string(),
            docs: docs.iter().map(|d| d.to_string()).collect(),
        };
        let body = serde_json::to_value(&request).map_err(TestClientError::Encode)?;
        let response: RerankResponse = self.rerank_raw(&body).await?;
        Ok(response.scores)
    }

    /// Posts an arbitrary JSON body to `/rerank`.
    pub async fn rerank_raw(
        &self,
        body: &serde_json::Value,
    ) -> Result<RerankResponse, TestClientError> {
        let resp = self.client.post(self.url("/rerank")).json(body).send().await?;

        match resp.status().as_u16() {
            200 => Ok(resp.json().await?),
            400 | 413 | 415 => {
                let status = resp.status().as_u16();
                let body: ErrorResponse = resp.json().await?;
                Err(TestClientError::BadRequest(status, body.error))
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(TestClientError::UnexpectedStatus(status, body))
            }
        }
    }

    pub async fn health(&self) -> Result<HealthResponse, TestClientError> {
        let resp = self.client.get(self.url("/health")).send().await?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(TestClientError::UnexpectedStatus(status, body))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to encode request: {0}")]
    Encode(serde_json::Error),
    #[error("bad request ({0}): {1}")]
    BadRequest(u16, String),
    #[error("unexpected status {0}: {1}")]
    UnexpectedStatus(u16, String),
}
