use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::DocumentLayout;
use crate::errors::{EvalError, EvalResult};

const API_VERSION: &str = "2024-11-30";
const MODEL_ID: &str = "prebuilt-layout";

#[derive(Debug, Clone)]
pub struct DocumentIntelligenceConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Delay between polls of a running analysis
    pub poll_interval: Duration,
}

impl DocumentIntelligenceConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Layout analysis through the Document Intelligence REST API.
///
/// Analysis is a long-running operation: the document is submitted once, then the
/// `Operation-Location` returned by the service is polled until it settles.
pub struct DocumentIntelligenceClient {
    client: Client,
    config: DocumentIntelligenceConfig,
}

impl DocumentIntelligenceClient {
    pub fn new(config: DocumentIntelligenceConfig) -> EvalResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    async fn begin_analyze(&self, bytes: Vec<u8>) -> EvalResult<String> {
        let url = format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            MODEL_ID,
            API_VERSION
        );
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::ACCEPTED && status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(EvalError::Service(format!(
                "Layout analysis request failed: {} {}",
                status, body
            )));
        }

        response
            .headers()
            .get("Operation-Location")
            .and_then(|value| value.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                EvalError::Service("Layout analysis response has no Operation-Location".into())
            })
    }

    async fn poll_result(&self, operation_url: &str) -> EvalResult<String> {
        loop {
            tokio::time::sleep(self.config.poll_interval).await;

            let response = self
                .client
                .get(operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(EvalError::Service(format!(
                    "Layout analysis poll failed: {}",
                    response.status()
                )));
            }

            let body: Value = response.json().await?;
            let status = body.get("status").and_then(|s| s.as_str()).unwrap_or("");
            debug!("Layout analysis status: {}", status);

            match status {
                "succeeded" => {
                    return body
                        .pointer("/analyzeResult/content")
                        .and_then(|c| c.as_str())
                        .map(String::from)
                        .ok_or_else(|| {
                            EvalError::Service("Layout analysis result has no content".into())
                        })
                }
                "failed" | "canceled" => {
                    let error = body.get("error").cloned().unwrap_or(Value::Null);
                    return Err(EvalError::Service(format!(
                        "Layout analysis {}: {}",
                        status, error
                    )));
                }
                "notStarted" | "running" => continue,
                other => {
                    return Err(EvalError::Service(format!(
                        "Unexpected layout analysis status: {:?}",
                        other
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl DocumentLayout for DocumentIntelligenceClient {
    async fn extract_text(&self, path: &Path) -> EvalResult<String> {
        let bytes = tokio::fs::read(path).await?;
        let operation_url = self.begin_analyze(bytes).await?;
        self.poll_result(&operation_url).await
    }
}
