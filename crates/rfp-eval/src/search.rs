//! Hybrid keyword and vector retrieval over managed search indexes.
pub mod azure;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::EvalResult;

pub use azure::{AzureSearchClient, AzureSearchConfig};

/// One document returned by a search, restricted to the selected fields
pub type SearchHit = Map<String, Value>;

/// A combined keyword and vector query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Used both as the keyword query and as the text to vectorize
    pub text: String,
    pub select: Vec<String>,
    pub top: usize,
    pub k_nearest_neighbors: usize,
    pub vector_field: String,
    pub semantic_configuration: Option<String>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            select: Vec::new(),
            top: 1,
            k_nearest_neighbors: 1,
            vector_field: "text_vector".to_string(),
            semantic_configuration: None,
        }
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    pub fn k_nearest_neighbors(mut self, k: usize) -> Self {
        self.k_nearest_neighbors = k;
        self
    }

    pub fn semantic_configuration(mut self, name: impl Into<String>) -> Self {
        self.semantic_configuration = Some(name.into());
        self
    }
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run `query` against `index` and return the hits in ranking order
    async fn search(&self, index: &str, query: &SearchQuery) -> EvalResult<Vec<SearchHit>>;
}
