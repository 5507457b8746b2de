use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::InsightProvider;
use crate::errors::EvalResult;
use crate::search::{SearchClient, SearchQuery};

pub const NO_POLICIES_FOUND: &str =
    "No relevant legal policies found. Ensure the policies are indexed correctly.";

/// Retrieves the company policies relevant to a vendor's legal commitments
pub struct LegalInsights {
    client: Arc<dyn SearchClient>,
    index: String,
}

impl LegalInsights {
    pub fn new(client: Arc<dyn SearchClient>, index: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
        }
    }

    pub async fn check_compliance(&self, legal_summary: &str) -> EvalResult<String> {
        let query = SearchQuery::new(legal_summary)
            .select(&["chunk"])
            .top(5)
            .k_nearest_neighbors(50)
            .semantic_configuration(format!("{}-semantic-configuration", self.index));

        let hits = self.client.search(&self.index, &query).await?;
        debug!("{} policy chunks retrieved", hits.len());

        let policy_context = hits
            .iter()
            .filter_map(|hit| hit.get("chunk").and_then(|c| c.as_str()))
            .collect::<Vec<_>>()
            .join("\n\n");

        if policy_context.is_empty() {
            return Ok(NO_POLICIES_FOUND.to_string());
        }
        Ok(policy_context)
    }
}

#[async_trait]
impl InsightProvider for LegalInsights {
    fn name(&self) -> &str {
        "legal"
    }

    async fn insights(&self, topic: &str) -> EvalResult<String> {
        self.check_compliance(topic).await
    }
}
