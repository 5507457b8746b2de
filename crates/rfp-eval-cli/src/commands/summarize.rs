use anyhow::{bail, Context, Result};
use cliclack::spinner;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;

use crate::configuration::Settings;
use crate::services;
use rfp_eval::providers::base::Provider;
use rfp_eval::session::EvaluationSession;

pub async fn run(settings: &Settings, rfp: Option<PathBuf>, proposals: Vec<PathBuf>) -> Result<()> {
    let provider = services::provider(settings)?;
    summarize_documents(settings, provider, rfp, proposals)
        .await?
        .close();
    Ok(())
}

/// Summarize and persist the given documents, returning the session that holds the summaries
pub async fn summarize_documents(
    settings: &Settings,
    provider: Arc<dyn Provider>,
    rfp: Option<PathBuf>,
    proposals: Vec<PathBuf>,
) -> Result<EvaluationSession> {
    if rfp.is_none() && proposals.is_empty() {
        bail!("Nothing to summarize, pass --rfp and/or --proposal");
    }

    let summarizer = services::summarizer(settings, provider)?;
    let mut session = EvaluationSession::start(services::summary_store(settings))
        .with_documents(rfp, proposals);

    let spin = spinner();
    spin.start("Summarizing documents...");
    let result = session.summarize_all(&summarizer).await;
    spin.stop("");
    result.context("Failed to summarize documents")?;

    for path in session.saved_summaries() {
        println!("Summary saved to {}", style(path.display()).green());
    }
    for proposal in session.proposal_summaries() {
        println!("Proposal from {}", style(&proposal.vendor_name).bold());
    }
    Ok(session)
}
