use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{SearchClient, SearchHit, SearchQuery};
use crate::errors::{EvalError, EvalResult};

const API_VERSION: &str = "2024-07-01";

#[derive(Debug, Clone)]
pub struct AzureSearchConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// Client for the Azure AI Search documents API
pub struct AzureSearchClient {
    client: Client,
    config: AzureSearchConfig,
}

impl AzureSearchClient {
    pub fn new(config: AzureSearchConfig) -> EvalResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn request_body(query: &SearchQuery) -> Value {
        let mut body = json!({
            "search": query.text,
            "vectorQueries": [{
                "kind": "text",
                "text": query.text,
                "fields": query.vector_field,
                "k": query.k_nearest_neighbors,
                "exhaustive": true
            }],
            "select": query.select.join(","),
            "top": query.top,
        });

        if let Some(configuration) = &query.semantic_configuration {
            body["queryType"] = json!("semantic");
            body["semanticConfiguration"] = json!(configuration);
            body["captions"] = json!("extractive");
            body["answers"] = json!("extractive");
        }

        body
    }
}

#[async_trait]
impl SearchClient for AzureSearchClient {
    async fn search(&self, index: &str, query: &SearchQuery) -> EvalResult<Vec<SearchHit>> {
        let url = format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            index,
            API_VERSION
        );
        debug!(index, top = query.top, "POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&Self::request_body(query))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EvalError::Service(format!(
                "Search on index {} failed: {} {}",
                index, status, body
            )));
        }

        let body: Value = response.json().await?;
        let hits = body
            .get("value")
            .and_then(|v| v.as_array())
            .ok_or_else(|| EvalError::Service("Search response has no value array".into()))?
            .iter()
            .filter_map(|hit| hit.as_object().cloned())
            .collect();

        Ok(hits)
    }
}
