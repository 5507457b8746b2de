use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::configuration::Settings;
use rfp_eval::agents::AgentPrompts;
use rfp_eval::document::{DocumentIntelligenceClient, DocumentLayout, PlainTextLayout};
use rfp_eval::insights::{LegalInsights, MarketInsights, VendorInsights};
use rfp_eval::providers::base::Provider;
use rfp_eval::providers::factory::get_provider;
use rfp_eval::search::{AzureSearchClient, SearchClient};
use rfp_eval::session::Evaluator;
use rfp_eval::summarizer::{Summarizer, SummaryStore};

pub fn provider(settings: &Settings) -> Result<Arc<dyn Provider>> {
    let config = settings.provider_config()?;
    info!(
        "Using {} provider with model {}",
        config.provider_type(),
        config.model()
    );
    let provider = get_provider(config).context("Failed to create the chat provider")?;
    Ok(Arc::from(provider))
}

/// Text files are read directly, everything else goes through Document Intelligence
pub fn document_layout(settings: &Settings) -> Result<Arc<dyn DocumentLayout>> {
    match settings.document_intelligence() {
        Some(config) => {
            let client = DocumentIntelligenceClient::new(config)?;
            Ok(Arc::new(PlainTextLayout::with_fallback(Arc::new(client))))
        }
        None => {
            debug!("Document Intelligence is not configured, only text documents can be read");
            Ok(Arc::new(PlainTextLayout::new()))
        }
    }
}

pub fn summarizer(settings: &Settings, provider: Arc<dyn Provider>) -> Result<Summarizer> {
    Ok(Summarizer::new(provider, document_layout(settings)?).with_config(settings.summarizer()))
}

pub fn summary_store(settings: &Settings) -> SummaryStore {
    SummaryStore::new(&settings.rfp_eval_documents_dir)
}

pub fn evaluator(settings: &Settings, provider: Arc<dyn Provider>) -> Result<Evaluator> {
    let search: Arc<dyn SearchClient> = Arc::new(AzureSearchClient::new(settings.search()?)?);
    let legal = LegalInsights::new(Arc::clone(&search), settings.legal_policy_index.clone());
    let vendor = VendorInsights::new(search, settings.supplier_index.clone());
    let market = MarketInsights::load(settings.market_dataset());

    let prompts = AgentPrompts::load(&settings.rfp_eval_agent_prompts);
    if prompts.is_empty() {
        anyhow::bail!(
            "No agent prompts could be loaded from {}",
            settings.rfp_eval_agent_prompts.display()
        );
    }

    Ok(Evaluator::new(
        provider,
        prompts,
        Arc::new(legal),
        Arc::new(vendor),
        Arc::new(market),
    )
    .with_settings(settings.evaluation()?))
}
