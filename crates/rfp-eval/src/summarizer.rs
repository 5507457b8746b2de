use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::chunker::{chunk_text, DEFAULT_MAX_MODEL_TOKENS, DEFAULT_RESERVED_TOKENS};
use crate::document::DocumentLayout;
use crate::errors::{EvalError, EvalResult};
use crate::models::summary::{DocumentSummary, DocumentType, ProposalSummary, NOT_SPECIFIED};
use crate::prompt_template::load_prompt_file;
use crate::providers::base::{CompletionOptions, Provider};
use crate::token_counter::TokenEstimate;

pub const RFP_SUMMARY_FILE: &str = "rfp_summary.txt";
const PROPOSAL_SUMMARY_PREFIX: &str = "vendor_proposal_summary_";

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub max_model_tokens: usize,
    pub reserved_tokens: usize,
    pub token_estimate: TokenEstimate,
    /// Reply budget of every summarization call
    pub max_tokens: i32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_model_tokens: DEFAULT_MAX_MODEL_TOKENS,
            reserved_tokens: DEFAULT_RESERVED_TOKENS,
            token_estimate: TokenEstimate::default(),
            max_tokens: 1000,
        }
    }
}

#[derive(Serialize)]
struct SummaryPromptContext<'a> {
    not_specified: &'a str,
}

/// Turns a document into its [`DocumentSummary`].
///
/// The text is extracted, chunked to fit the model, and every chunk is summarized
/// with the instructions for its document type. When there is more than one chunk the
/// chunk summaries are joined and summarized once more.
pub struct Summarizer {
    provider: Arc<dyn Provider>,
    layout: Arc<dyn DocumentLayout>,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn Provider>, layout: Arc<dyn DocumentLayout>) -> Self {
        Self {
            provider,
            layout,
            config: SummarizerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SummarizerConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn summarize(
        &self,
        path: &Path,
        doc_type: DocumentType,
    ) -> EvalResult<DocumentSummary> {
        info!("Summarizing {} as {}", path.display(), doc_type);
        let content = self.layout.extract_text(path).await?;
        self.summarize_text(&content, doc_type).await
    }

    pub async fn summarize_text(
        &self,
        content: &str,
        doc_type: DocumentType,
    ) -> EvalResult<DocumentSummary> {
        let chunks = chunk_text(
            content,
            self.config.max_model_tokens,
            self.config.reserved_tokens,
            self.config.token_estimate,
        );
        debug!("Document split into {} chunks", chunks.len());

        let final_summary = match chunks.as_slice() {
            [] => return Err(EvalError::Parse("Document contains no text".to_string())),
            [chunk] => self.summarize_chunk(chunk, doc_type).await?,
            _ => {
                let mut summaries = Vec::with_capacity(chunks.len());
                for chunk in &chunks {
                    summaries.push(self.summarize_chunk(chunk, doc_type).await?);
                }
                self.summarize_chunk(&summaries.join(" "), doc_type).await?
            }
        };

        Ok(match doc_type {
            DocumentType::Rfp => DocumentSummary::Rfp(final_summary),
            DocumentType::Proposal => {
                DocumentSummary::Proposal(ProposalSummary::from_generation(&final_summary))
            }
        })
    }

    async fn summarize_chunk(&self, chunk: &str, doc_type: DocumentType) -> EvalResult<String> {
        let context = SummaryPromptContext {
            not_specified: NOT_SPECIFIED,
        };
        let (template, options) = match doc_type {
            DocumentType::Rfp => (
                "rfp_summary.md",
                CompletionOptions::default().with_max_tokens(self.config.max_tokens),
            ),
            DocumentType::Proposal => (
                "proposal_summary.md",
                CompletionOptions::default()
                    .with_max_tokens(self.config.max_tokens)
                    .with_json_schema("VendorProposalSummary", ProposalSummary::json_schema()),
            ),
        };
        let instructions = load_prompt_file(template, &context)?;
        let system = format!("{}\n\n{}", instructions.trim_end(), chunk);

        let (message, usage) = self
            .provider
            .complete(&system, &[], &options)
            .await
            .map_err(EvalError::service)?;
        debug!(?usage, "Summarized {} chunk", doc_type);

        Ok(message.content)
    }
}

/// File name stem for a vendor: lower case with every run of other characters
/// collapsed to `_`
pub fn vendor_slug(vendor_name: &str) -> String {
    let mut slug = String::with_capacity(vendor_name.len());
    let mut pending_separator = false;
    for c in vendor_name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        "unknown_vendor".to_string()
    } else {
        slug
    }
}

/// Like [`vendor_slug`], with the source file stem appended when the proposal
/// names no vendor
pub fn proposal_slug(vendor_name: &str, source: Option<&Path>) -> String {
    let slug = vendor_slug(vendor_name);
    let unnamed = slug == vendor_slug(NOT_SPECIFIED) || slug == vendor_slug("");
    match source.and_then(|path| path.file_stem()).and_then(|stem| stem.to_str()) {
        Some(stem) if unnamed => format!("{}_{}", slug, vendor_slug(stem)),
        _ => slug,
    }
}

/// Flat-file persistence of document summaries under `<documents>/summaries`
#[derive(Debug, Clone)]
pub struct SummaryStore {
    dir: PathBuf,
}

impl SummaryStore {
    pub fn new(documents_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: documents_dir.as_ref().join("summaries"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn rfp_summary_path(&self) -> PathBuf {
        self.dir.join(RFP_SUMMARY_FILE)
    }

    pub fn proposal_summary_path(&self, vendor_name: &str) -> PathBuf {
        self.dir.join(format!(
            "{}{}.json",
            PROPOSAL_SUMMARY_PREFIX,
            vendor_slug(vendor_name)
        ))
    }

    pub fn save(&self, summary: &DocumentSummary) -> EvalResult<PathBuf> {
        match summary {
            DocumentSummary::Rfp(text) => self.save_rfp_summary(text),
            DocumentSummary::Proposal(proposal) => self.save_proposal_summary(proposal),
        }
    }

    pub fn save_rfp_summary(&self, text: &str) -> EvalResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.rfp_summary_path();
        fs::write(&path, text)?;
        info!("Saved RFP summary to {}", path.display());
        Ok(path)
    }

    pub fn save_proposal_summary(&self, summary: &ProposalSummary) -> EvalResult<PathBuf> {
        self.save_proposal_summary_from(summary, None)
    }

    /// Like [`save_proposal_summary`](Self::save_proposal_summary), but a proposal
    /// without a vendor name is filed under its source document's name so unnamed
    /// proposals do not overwrite each other.
    pub fn save_proposal_summary_from(
        &self,
        summary: &ProposalSummary,
        source: Option<&Path>,
    ) -> EvalResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!(
            "{}{}.json",
            PROPOSAL_SUMMARY_PREFIX,
            proposal_slug(&summary.vendor_name, source)
        ));

        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        summary.serialize(&mut serializer)?;
        fs::write(&path, buf)?;

        info!("Saved proposal summary to {}", path.display());
        Ok(path)
    }

    pub fn load_rfp_summary(&self) -> EvalResult<String> {
        let path = self.rfp_summary_path();
        if !path.exists() {
            return Err(EvalError::Configuration(format!(
                "RFP summary not found at {}, summarize the RFP first",
                path.display()
            )));
        }
        Ok(fs::read_to_string(path)?)
    }

    pub fn load_proposal_summary(&self, vendor_name: &str) -> EvalResult<ProposalSummary> {
        let path = self.proposal_summary_path(vendor_name);
        if !path.exists() {
            return Err(EvalError::Configuration(format!(
                "No proposal summary for vendor {} at {}",
                vendor_name,
                path.display()
            )));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Every stored proposal summary, ordered by file name. Files that cannot be
    /// parsed are skipped.
    pub fn load_proposal_summaries(&self) -> EvalResult<Vec<ProposalSummary>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                name.starts_with("vendor_proposal") && name.ends_with(".json")
            })
            .collect();
        paths.sort();

        let mut summaries = Vec::with_capacity(paths.len());
        for path in paths {
            let parsed = fs::read_to_string(&path)
                .map_err(EvalError::from)
                .and_then(|content| Ok(serde_json::from_str::<ProposalSummary>(&content)?));
            match parsed {
                Ok(summary) => summaries.push(summary),
                Err(e) => error!("Skipping proposal summary {}: {}", path.display(), e),
            }
        }

        Ok(summaries)
    }
}
