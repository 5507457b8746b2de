use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::InsightProvider;
use crate::errors::EvalResult;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndustryInsights {
    #[serde(default)]
    pub trends: Vec<String>,
    #[serde(default)]
    pub competitor_insights: Vec<String>,
    #[serde(default)]
    pub supply_chain_risks: Vec<String>,
    #[serde(default)]
    pub regulatory_changes: Vec<String>,
}

/// The `market-intelligence.json` dataset, keyed by industry name
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MarketDataset {
    #[serde(default)]
    pub industries: HashMap<String, IndustryInsights>,
}

/// Market intelligence from a static local dataset, loaded once
#[derive(Debug, Clone, Default)]
pub struct MarketInsights {
    dataset: MarketDataset,
}

impl MarketInsights {
    pub fn new(dataset: MarketDataset) -> Self {
        Self { dataset }
    }

    /// Load the dataset at `path`. A missing or malformed file leaves the dataset empty.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Market intelligence dataset not found at {}: {}",
                    path.display(),
                    e
                );
                return Self::default();
            }
        };

        match serde_json::from_str::<MarketDataset>(&content) {
            Ok(dataset) => {
                info!(
                    "Loaded market intelligence for {} industries",
                    dataset.industries.len()
                );
                Self::new(dataset)
            }
            Err(e) => {
                warn!("Failed to parse market intelligence dataset: {}", e);
                Self::default()
            }
        }
    }

    pub fn industries(&self) -> impl Iterator<Item = &str> {
        self.dataset.industries.keys().map(String::as_str)
    }

    pub fn get_market_insights(&self, industry: &str) -> String {
        let data = match self.dataset.industries.get(industry) {
            Some(data) if *data != IndustryInsights::default() => data,
            _ => return format!("No market intelligence data available for {}.", industry),
        };

        let section = |items: &[String]| format!("- {}", items.join("\n- "));
        format!(
            "### Market Intelligence Report for {}\n\n\
             **Industry Trends:**\n{}\n\n\
             **Competitor Insights:**\n{}\n\n\
             **Supply Chain Risks:**\n{}\n\n\
             **Regulatory Changes:**\n{}\n",
            industry,
            section(&data.trends),
            section(&data.competitor_insights),
            section(&data.supply_chain_risks),
            section(&data.regulatory_changes),
        )
    }
}

#[async_trait]
impl InsightProvider for MarketInsights {
    fn name(&self) -> &str {
        "market"
    }

    async fn insights(&self, topic: &str) -> EvalResult<String> {
        Ok(self.get_market_insights(topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const DATASET: &str = r#"{
        "industries": {
            "Cloud Computing": {
                "trends": ["Hybrid cloud adoption", "AI workloads"],
                "competitor_insights": ["Hyperscalers cut storage prices"],
                "supply_chain_risks": ["GPU shortages"],
                "regulatory_changes": ["EU Data Act"]
            }
        }
    }"#;

    fn write_dataset(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn test_known_industry() {
        let file = write_dataset(DATASET);
        let market = MarketInsights::load(file.path());

        assert_eq!(
            market.get_market_insights("Cloud Computing"),
            indoc! {"
                ### Market Intelligence Report for Cloud Computing

                **Industry Trends:**
                - Hybrid cloud adoption
                - AI workloads

                **Competitor Insights:**
                - Hyperscalers cut storage prices

                **Supply Chain Risks:**
                - GPU shortages

                **Regulatory Changes:**
                - EU Data Act
            "}
        );
    }

    #[test]
    fn test_unknown_industry() {
        let file = write_dataset(DATASET);
        let market = MarketInsights::load(file.path());
        assert_eq!(
            market.get_market_insights("Unknown"),
            "No market intelligence data available for Unknown."
        );
    }

    #[test]
    fn test_missing_or_malformed_dataset_is_empty() {
        let market = MarketInsights::load("no/such/market-intelligence.json");
        assert_eq!(market.industries().count(), 0);

        let file = write_dataset("{\"industries\": [");
        let market = MarketInsights::load(file.path());
        assert_eq!(market.industries().count(), 0);
        assert_eq!(
            market.get_market_insights("Cloud Computing"),
            "No market intelligence data available for Cloud Computing."
        );
    }

    #[tokio::test]
    async fn test_insight_provider() {
        let file = write_dataset(DATASET);
        let market = MarketInsights::load(file.path());
        let text = market.insights("Cloud Computing").await.unwrap();
        assert!(text.contains("- GPU shortages"));
    }
}
