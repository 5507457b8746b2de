use anyhow::{Context, Result};
use console::style;

use crate::configuration::Settings;
use crate::prompt::rustyline::RustylinePrompt;
use crate::services;
use crate::session::transcript_file::TranscriptFile;
use crate::session::ChatSession;
use rfp_eval::session::{EvaluationSession, Evaluator};

pub async fn run(settings: &Settings, vendor: Option<String>) -> Result<()> {
    let provider = services::provider(settings)?;
    let evaluator = services::evaluator(settings, provider)?;
    let session = EvaluationSession::start(services::summary_store(settings));
    open_chat(settings, &evaluator, session, vendor.as_deref(), None).await
}

/// Prepare the group chat for `vendor` and hand the console to the user. With an
/// `opening` request the agents answer it before the first prompt.
pub async fn open_chat(
    settings: &Settings,
    evaluator: &Evaluator,
    mut session: EvaluationSession,
    vendor: Option<&str>,
    opening: Option<&str>,
) -> Result<()> {
    session
        .prepare_chat(evaluator, vendor)
        .await
        .context("Failed to prepare the evaluation chat")?;
    if let Some(vendor) = session.vendor() {
        println!("Evaluating the proposal from {}", style(vendor).bold());
    }

    let transcript =
        TranscriptFile::create(&settings.rfp_eval_documents_dir, &session.id().to_string())?;
    let mut chat = ChatSession::new(session, Box::new(RustylinePrompt::new()), transcript);
    if let Some(request) = opening {
        chat.headless(request).await?;
    }
    chat.start().await?;
    chat.into_session().close();
    Ok(())
}
