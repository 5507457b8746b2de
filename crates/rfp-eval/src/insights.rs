//! Context blocks injected into agent instructions.
//!
//! Legal policy and vendor history come from search indexes, market intelligence from
//! a static dataset. Each provider turns a topic into a Markdown text block.
pub mod legal;
pub mod market;
pub mod vendor;

use async_trait::async_trait;

use crate::errors::EvalResult;

pub use legal::LegalInsights;
pub use market::{IndustryInsights, MarketDataset, MarketInsights};
pub use vendor::VendorInsights;

#[async_trait]
pub trait InsightProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Format the insights relevant to `topic` as a text block
    async fn insights(&self, topic: &str) -> EvalResult<String>;
}
