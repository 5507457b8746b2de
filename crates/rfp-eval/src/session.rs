//! One user's evaluation: which documents were summarized and the chat opened over them.
use std::path::PathBuf;
use std::sync::Arc;
use strum_macros::{Display, EnumString};
use tracing::info;
use uuid::Uuid;

use crate::agents::{AgentContext, AgentPrompts, AgentRegistry};
use crate::errors::{EvalError, EvalResult};
use crate::insights::InsightProvider;
use crate::models::summary::{DocumentSummary, DocumentType, ProposalSummary, NOT_SPECIFIED};
use crate::orchestration::{
    GroupChat, HistoryReducer, PromptClassifier, PromptJudge, SelectionStrategy,
    TerminationStrategy, DEFAULT_HISTORY_WINDOW, DEFAULT_MAXIMUM_ITERATIONS,
};
use crate::providers::base::Provider;
use crate::summarizer::{Summarizer, SummaryStore};

/// How free-form turns are routed and judged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Routing {
    /// Ask the model who speaks next and whether the evaluation is complete
    #[default]
    Model,
    /// Route by topic keywords, finish on a final recommendation
    Keyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationSettings {
    pub industry: String,
    pub maximum_iterations: usize,
    pub history_window: usize,
    pub routing: Routing,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            industry: "Cloud Computing".to_string(),
            maximum_iterations: DEFAULT_MAXIMUM_ITERATIONS,
            history_window: DEFAULT_HISTORY_WINDOW,
            routing: Routing::default(),
        }
    }
}

/// Builds the agents and group chat for a vendor from the shared services
pub struct Evaluator {
    provider: Arc<dyn Provider>,
    prompts: AgentPrompts,
    legal: Arc<dyn InsightProvider>,
    vendor: Arc<dyn InsightProvider>,
    market: Arc<dyn InsightProvider>,
    settings: EvaluationSettings,
}

impl Evaluator {
    pub fn new(
        provider: Arc<dyn Provider>,
        prompts: AgentPrompts,
        legal: Arc<dyn InsightProvider>,
        vendor: Arc<dyn InsightProvider>,
        market: Arc<dyn InsightProvider>,
    ) -> Self {
        Self {
            provider,
            prompts,
            legal,
            vendor,
            market,
            settings: EvaluationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EvaluationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn provider(&self) -> Arc<dyn Provider> {
        Arc::clone(&self.provider)
    }

    pub fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    pub async fn registry_for(
        &self,
        rfp_summary: &str,
        proposal: &ProposalSummary,
    ) -> EvalResult<AgentRegistry> {
        let context = AgentContext::gather(
            rfp_summary.to_string(),
            proposal.clone(),
            self.legal.as_ref(),
            self.vendor.as_ref(),
            self.market.as_ref(),
            &self.settings.industry,
        )
        .await?;
        Ok(AgentRegistry::build(&self.prompts, &context))
    }

    pub fn group_chat(&self, registry: AgentRegistry) -> EvalResult<GroupChat> {
        let (selection, termination) = match self.settings.routing {
            Routing::Model => (
                SelectionStrategy::new(Box::new(PromptClassifier::new(self.provider()))),
                TerminationStrategy::new(Box::new(PromptJudge::new(self.provider()))),
            ),
            Routing::Keyword => (SelectionStrategy::default(), TerminationStrategy::default()),
        };

        GroupChat::new(
            self.provider(),
            registry,
            selection,
            termination.with_maximum_iterations(self.settings.maximum_iterations),
            HistoryReducer::new(self.settings.history_window),
        )
    }
}

pub struct EvaluationSession {
    id: Uuid,
    store: SummaryStore,
    rfp_path: Option<PathBuf>,
    proposal_paths: Vec<PathBuf>,
    rfp_summary: Option<String>,
    proposal_summaries: Vec<ProposalSummary>,
    saved: Vec<PathBuf>,
    chat: Option<GroupChat>,
    vendor: Option<String>,
}

impl EvaluationSession {
    pub fn start(store: SummaryStore) -> Self {
        let id = Uuid::new_v4();
        info!("Started evaluation session {}", id);
        Self {
            id,
            store,
            rfp_path: None,
            proposal_paths: Vec::new(),
            rfp_summary: None,
            proposal_summaries: Vec::new(),
            saved: Vec::new(),
            chat: None,
            vendor: None,
        }
    }

    pub fn with_documents(
        mut self,
        rfp_path: Option<PathBuf>,
        proposal_paths: Vec<PathBuf>,
    ) -> Self {
        self.rfp_path = rfp_path;
        self.proposal_paths = proposal_paths;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &SummaryStore {
        &self.store
    }

    pub fn rfp_summary(&self) -> Option<&str> {
        self.rfp_summary.as_deref()
    }

    pub fn proposal_summaries(&self) -> &[ProposalSummary] {
        &self.proposal_summaries
    }

    /// Summary files written by [`summarize_all`](Self::summarize_all)
    pub fn saved_summaries(&self) -> &[PathBuf] {
        &self.saved
    }

    /// Vendor the current chat evaluates
    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    pub fn chat(&self) -> Option<&GroupChat> {
        self.chat.as_ref()
    }

    pub fn chat_mut(&mut self) -> Option<&mut GroupChat> {
        self.chat.as_mut()
    }

    /// Summarize the session's documents and persist each summary as soon as it exists
    pub async fn summarize_all(&mut self, summarizer: &Summarizer) -> EvalResult<()> {
        if let Some(path) = &self.rfp_path {
            let summary = summarizer.summarize(path, DocumentType::Rfp).await?;
            self.saved.push(self.store.save(&summary)?);
            if let DocumentSummary::Rfp(text) = summary {
                self.rfp_summary = Some(text);
            }
        }

        for path in &self.proposal_paths {
            let summary = summarizer.summarize(path, DocumentType::Proposal).await?;
            if let DocumentSummary::Proposal(proposal) = summary {
                let saved = self.store.save_proposal_summary_from(&proposal, Some(path))?;
                self.saved.push(saved);
                // unnamed proposals never replace one another
                if proposal.vendor_name != NOT_SPECIFIED {
                    self.proposal_summaries
                        .retain(|existing| existing.vendor_name != proposal.vendor_name);
                }
                self.proposal_summaries.push(proposal);
            }
        }

        info!(
            session = %self.id,
            proposals = self.proposal_summaries.len(),
            "Summaries ready"
        );
        Ok(())
    }

    /// Open a group chat over `vendor`'s proposal, or the first known proposal when no
    /// vendor is named. Summaries not produced in this session are read from the store.
    pub async fn prepare_chat(
        &mut self,
        evaluator: &Evaluator,
        vendor: Option<&str>,
    ) -> EvalResult<&mut GroupChat> {
        let rfp_summary = match &self.rfp_summary {
            Some(text) => text.clone(),
            None => self.store.load_rfp_summary()?,
        };
        let proposal = self.find_proposal(vendor)?;

        let registry = evaluator.registry_for(&rfp_summary, &proposal).await?;
        let chat = evaluator.group_chat(registry)?;
        info!(session = %self.id, vendor = %proposal.vendor_name, "Group chat ready");

        self.rfp_summary = Some(rfp_summary);
        self.vendor = Some(proposal.vendor_name);
        Ok(self.chat.insert(chat))
    }

    fn find_proposal(&self, vendor: Option<&str>) -> EvalResult<ProposalSummary> {
        match vendor {
            Some(name) => match self
                .proposal_summaries
                .iter()
                .find(|p| p.vendor_name.eq_ignore_ascii_case(name))
            {
                Some(proposal) => Ok(proposal.clone()),
                None => self.store.load_proposal_summary(name),
            },
            None => match self.proposal_summaries.first() {
                Some(proposal) => Ok(proposal.clone()),
                None => self
                    .store
                    .load_proposal_summaries()?
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        EvalError::Configuration(format!(
                            "No proposal summaries in {}, summarize a proposal first",
                            self.store.dir().display()
                        ))
                    }),
            },
        }
    }

    pub fn close(self) {
        let messages = self.chat.as_ref().map_or(0, |chat| chat.transcript().len());
        info!("Closed evaluation session {} after {} messages", self.id, messages);
    }
}
