use anyhow::{Context, Result};
use cliclack::spinner;
use console::style;

use crate::configuration::Settings;
use crate::prompt::rustyline::print_markdown;
use crate::services;
use rfp_eval::report::compare_vendors;

/// Evaluate every summarized proposal and write the comparison report
pub async fn run(settings: &Settings) -> Result<()> {
    let provider = services::provider(settings)?;
    let evaluator = services::evaluator(settings, provider)?;
    let store = services::summary_store(settings);

    println!("Starting vendor evaluation...");
    let spin = spinner();
    spin.start("Evaluating proposals...");
    let report = compare_vendors(&evaluator, &store).await;
    spin.stop("");
    let report = report.context("Failed to compare vendors")?;

    let path = report.save(&settings.rfp_eval_documents_dir)?;
    print_markdown(&report.to_string(), "zenburn");
    println!("Evaluation complete. Report saved to {}", style(path.display()).green());
    Ok(())
}
