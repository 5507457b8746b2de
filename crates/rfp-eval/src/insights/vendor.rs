use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::InsightProvider;
use crate::errors::EvalResult;
use crate::search::{SearchClient, SearchHit, SearchQuery};

pub const NO_VENDOR_DATA: &str =
    "No historical data found for this vendor. Ensure the index is correctly populated.";

const FIELDS: [&str; 10] = [
    "chunk",
    "past_clients",
    "industries_served",
    "customer_satisfaction_avg",
    "financial_growth_5y",
    "compliance_issues",
    "market_growth",
    "bbb_accreditation",
    "contract_disputes",
    "notes",
];

/// Looks up the historical record of a vendor in the supplier index
pub struct VendorInsights {
    client: Arc<dyn SearchClient>,
    index: String,
}

impl VendorInsights {
    pub fn new(client: Arc<dyn SearchClient>, index: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
        }
    }

    pub async fn get_vendor_insights(&self, vendor_name: &str) -> EvalResult<String> {
        let query = SearchQuery::new(vendor_name)
            .select(&FIELDS)
            .top(1)
            .k_nearest_neighbors(1)
            .semantic_configuration(format!("{}-semantic-configuration", self.index));

        let hits = self.client.search(&self.index, &query).await?;
        match hits.first() {
            Some(record) => Ok(format_record(record)),
            None => Ok(NO_VENDOR_DATA.to_string()),
        }
    }
}

fn field(record: &SearchHit, name: &str) -> String {
    match record.get(name) {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

fn format_record(record: &SearchHit) -> String {
    let satisfaction = match record.get("customer_satisfaction_avg") {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(_) => format!("{}%", field(record, "customer_satisfaction_avg")),
    };

    format!(
        "### **Vendor:** {}\n\
         - **Past Clients:** {}\n\
         - **Industries Served:** {}\n\
         - **Customer Satisfaction:** {}\n\
         - **Financial Growth (5y):** {}\n\
         - **Compliance Issues:** {}\n\
         - **Market Growth:** {}\n\
         - **BBB Accreditation:** {}\n\
         - **Contract Disputes:** {}\n\
         - **Additional Notes:** {}\n",
        field(record, "chunk"),
        field(record, "past_clients"),
        field(record, "industries_served"),
        satisfaction,
        field(record, "financial_growth_5y"),
        field(record, "compliance_issues"),
        field(record, "market_growth"),
        field(record, "bbb_accreditation"),
        field(record, "contract_disputes"),
        field(record, "notes"),
    )
}

#[async_trait]
impl InsightProvider for VendorInsights {
    fn name(&self) -> &str {
        "vendor"
    }

    async fn insights(&self, topic: &str) -> EvalResult<String> {
        self.get_vendor_insights(topic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use serde_json::json;

    struct OneHit(Option<SearchHit>);

    #[async_trait]
    impl SearchClient for OneHit {
        async fn search(&self, index: &str, query: &SearchQuery) -> EvalResult<Vec<SearchHit>> {
            assert_eq!(index, "supplier-insights-index");
            assert_eq!(query.top, 1);
            assert_eq!(query.select.len(), 10);
            Ok(self.0.iter().cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_formats_vendor_record() {
        let record = json!({
            "chunk": "Fourth Coffee",
            "past_clients": ["Contoso", "Fabrikam"],
            "industries_served": ["Retail"],
            "customer_satisfaction_avg": 92,
            "financial_growth_5y": "18%",
            "compliance_issues": "None reported",
            "market_growth": "Stable",
            "bbb_accreditation": true,
            "contract_disputes": 0,
        });
        let vendor = VendorInsights::new(
            Arc::new(OneHit(record.as_object().cloned())),
            "supplier-insights-index",
        );

        let insights = vendor.get_vendor_insights("Fourth Coffee").await.unwrap();
        assert_eq!(
            insights,
            indoc! {"
                ### **Vendor:** Fourth Coffee
                - **Past Clients:** Contoso, Fabrikam
                - **Industries Served:** Retail
                - **Customer Satisfaction:** 92%
                - **Financial Growth (5y):** 18%
                - **Compliance Issues:** None reported
                - **Market Growth:** Stable
                - **BBB Accreditation:** true
                - **Contract Disputes:** 0
                - **Additional Notes:** N/A
            "}
        );
    }

    #[tokio::test]
    async fn test_unknown_vendor() {
        let vendor = VendorInsights::new(Arc::new(OneHit(None)), "supplier-insights-index");
        assert_eq!(vendor.insights("Nobody").await.unwrap(), NO_VENDOR_DATA);
    }
}
