//! Batch comparison of every summarized proposal.
//!
//! Each vendor gets its own agents, and every agent answers once over a history shared
//! by that vendor's agents. The answers are collected into one Markdown report.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::errors::{EvalError, EvalResult};
use crate::models::agent_role::AgentRole;
use crate::models::message::Message;
use crate::models::summary::ProposalSummary;
use crate::session::Evaluator;
use crate::summarizer::SummaryStore;

pub const REPORTS_DIR: &str = "generated_reports";
pub const REPORT_FILE: &str = "final_report.md";

/// Opening user turn of every vendor evaluation
pub const EVALUATION_REQUEST: &str = "Evaluate the vendor proposal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorReport {
    pub vendor_name: String,
    /// One answer per agent, in evaluation order. Agents that gave no answer are absent.
    pub sections: Vec<(AgentRole, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonReport {
    pub vendors: Vec<VendorReport>,
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Final Vendor Comparison:\n\n")?;
        for vendor in &self.vendors {
            write!(f, "Vendor: {}\n\n", vendor.vendor_name)?;
            for (role, content) in &vendor.sections {
                write!(f, "## {}\n{}\n\n", role.key().to_uppercase(), content)?;
            }
        }
        Ok(())
    }
}

impl ComparisonReport {
    pub fn path(documents_dir: impl AsRef<Path>) -> PathBuf {
        documents_dir.as_ref().join(REPORTS_DIR).join(REPORT_FILE)
    }

    /// Write the rendered report to `<documents>/generated_reports/final_report.md`
    pub fn save(&self, documents_dir: impl AsRef<Path>) -> EvalResult<PathBuf> {
        let path = Self::path(documents_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.to_string())?;
        info!("Saved comparison report to {}", path.display());
        Ok(path)
    }
}

/// Let every agent answer once for a single proposal
pub async fn evaluate_vendor(
    evaluator: &Evaluator,
    rfp_summary: &str,
    proposal: &ProposalSummary,
) -> EvalResult<VendorReport> {
    info!("Analyzing proposal for {}", proposal.vendor_name);
    let registry = evaluator.registry_for(rfp_summary, proposal).await?;
    for role in registry.missing_roles() {
        warn!("No {} agent configured, its section is left out", role);
    }

    let provider = evaluator.provider();
    let mut history = vec![Message::user().with_text(EVALUATION_REQUEST)];
    let mut sections = Vec::with_capacity(registry.len());
    for agent in registry.iter() {
        let reply = agent.respond(provider.as_ref(), &history).await?;
        if !reply.text().is_empty() {
            sections.push((agent.role(), reply.text().to_string()));
        }
        history.push(reply);
    }

    Ok(VendorReport {
        vendor_name: proposal.vendor_name.clone(),
        sections,
    })
}

/// Evaluate every proposal summary in `store` against the stored RFP summary
pub async fn compare_vendors(
    evaluator: &Evaluator,
    store: &SummaryStore,
) -> EvalResult<ComparisonReport> {
    let rfp_summary = store.load_rfp_summary()?;
    let proposals = store.load_proposal_summaries()?;
    if proposals.is_empty() {
        return Err(EvalError::Configuration(format!(
            "No proposal summaries in {}",
            store.dir().display()
        )));
    }

    let mut report = ComparisonReport::default();
    for proposal in &proposals {
        report
            .vendors
            .push(evaluate_vendor(evaluator, &rfp_summary, proposal).await?);
    }
    Ok(report)
}
