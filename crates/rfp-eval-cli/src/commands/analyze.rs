use anyhow::Result;
use std::path::PathBuf;

use super::{chat, summarize};
use crate::configuration::Settings;
use crate::services;
use rfp_eval::report::EVALUATION_REQUEST;

/// Summarize one RFP and proposal, then evaluate the proposal interactively
pub async fn run(settings: &Settings, rfp: PathBuf, proposal: PathBuf) -> Result<()> {
    let provider = services::provider(settings)?;
    let evaluator = services::evaluator(settings, provider.clone())?;
    let session =
        summarize::summarize_documents(settings, provider, Some(rfp), vec![proposal]).await?;

    let vendor = session
        .proposal_summaries()
        .first()
        .map(|proposal| proposal.vendor_name.clone());
    chat::open_chat(
        settings,
        &evaluator,
        session,
        vendor.as_deref(),
        Some(EVALUATION_REQUEST),
    )
    .await
}
