use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// The six evaluation roles, declared in the order the initial evaluation runs them
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum AgentRole {
    #[serde(rename = "RFPCompliance")]
    #[strum(serialize = "RFPCompliance")]
    RfpCompliance,
    LegalCompliance,
    VendorEvaluation,
    MarketIntelligence,
    NegotiationStrategy,
    EvaluationReport,
}

impl AgentRole {
    /// Number of roles in the evaluation sequence
    pub const COUNT: usize = 6;

    /// Roles in evaluation order
    pub fn sequence() -> impl Iterator<Item = AgentRole> {
        AgentRole::iter()
    }

    /// Snake case key used by the prompt templates and the comparison report
    pub fn key(&self) -> &'static str {
        match self {
            AgentRole::RfpCompliance => "rfp_compliance",
            AgentRole::LegalCompliance => "legal_compliance",
            AgentRole::VendorEvaluation => "vendor_evaluation",
            AgentRole::MarketIntelligence => "market_intelligence",
            AgentRole::NegotiationStrategy => "negotiation_strategy",
            AgentRole::EvaluationReport => "evaluation_report",
        }
    }

    /// Position in the evaluation sequence
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Match a bare agent name the way a model is likely to produce it: surrounding
    /// whitespace, quotes and trailing punctuation are ignored, case does not matter.
    pub fn parse_loose(text: &str) -> Option<AgentRole> {
        let trimmed = text
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '*' || c == '.');
        trimmed.parse().ok()
    }
}
