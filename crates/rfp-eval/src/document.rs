//! Text extraction from uploaded documents.
//!
//! Summaries are built from the plain text of a document. Rich formats go through a
//! remote layout analysis service, plain text and Markdown files are read directly.
pub mod azure;
pub mod local;

use async_trait::async_trait;
use std::path::Path;

use crate::errors::EvalResult;

pub use azure::{DocumentIntelligenceClient, DocumentIntelligenceConfig};
pub use local::PlainTextLayout;

/// Extracts the text content of a document
#[async_trait]
pub trait DocumentLayout: Send + Sync {
    async fn extract_text(&self, path: &Path) -> EvalResult<String>;
}
