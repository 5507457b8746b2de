use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Placeholder written for any proposal field the model did not provide
pub const NOT_SPECIFIED: &str = "Not specified";

/// The kinds of document the summarizer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Rfp,
    Proposal,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentType::Rfp => write!(f, "rfp"),
            DocumentType::Proposal => write!(f, "proposal"),
        }
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rfp" => Ok(DocumentType::Rfp),
            "proposal" => Ok(DocumentType::Proposal),
            other => Err(format!("Unknown document type: {}", other)),
        }
    }
}

/// Structured summary of a vendor proposal, persisted as JSON with exactly these three fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSummary {
    pub vendor_name: String,
    pub legal_summary: String,
    pub overall_summary: String,
}

impl ProposalSummary {
    /// Build a summary from the raw text a model produced.
    ///
    /// A JSON object is mapped field by field: absent or null fields become
    /// [`NOT_SPECIFIED`], non-string values are rendered as JSON text and unknown
    /// fields are dropped. Anything that is not a JSON object falls back to a record
    /// whose `overall_summary` holds the raw text.
    pub fn from_generation(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => {
                let field = |name: &str| match map.get(name) {
                    None | Some(Value::Null) => NOT_SPECIFIED.to_string(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                };
                ProposalSummary {
                    vendor_name: field("vendor_name"),
                    legal_summary: field("legal_summary"),
                    overall_summary: field("overall_summary"),
                }
            }
            Ok(_) => {
                warn!("Proposal summary is valid JSON but not an object, keeping raw text");
                Self::fallback(raw)
            }
            Err(e) => {
                warn!("Failed to parse proposal summary as JSON: {}", e);
                Self::fallback(raw)
            }
        }
    }

    fn fallback(raw: &str) -> Self {
        ProposalSummary {
            vendor_name: NOT_SPECIFIED.to_string(),
            legal_summary: NOT_SPECIFIED.to_string(),
            overall_summary: raw.to_string(),
        }
    }

    /// JSON schema used to request structured output from the completion endpoint
    pub fn json_schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "vendor_name": {"type": "string"},
                "legal_summary": {"type": "string"},
                "overall_summary": {"type": "string"}
            },
            "required": ["vendor_name", "legal_summary", "overall_summary"],
            "additionalProperties": false
        })
    }
}

/// The final summary of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSummary {
    /// Markdown text with the fixed RFP section headers
    Rfp(String),
    Proposal(ProposalSummary),
}

impl DocumentSummary {
    pub fn doc_type(&self) -> DocumentType {
        match self {
            DocumentSummary::Rfp(_) => DocumentType::Rfp,
            DocumentSummary::Proposal(_) => DocumentType::Proposal,
        }
    }
}
