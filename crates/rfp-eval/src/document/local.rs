use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::DocumentLayout;
use crate::errors::{EvalError, EvalResult};

const PLAIN_TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

pub fn is_plain_text(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PLAIN_TEXT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Reads text files from disk and hands anything else to an optional remote layout service
#[derive(Default)]
pub struct PlainTextLayout {
    fallback: Option<Arc<dyn DocumentLayout>>,
}

impl PlainTextLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route non-text documents (PDF, DOCX, images) to `fallback`
    pub fn with_fallback(fallback: Arc<dyn DocumentLayout>) -> Self {
        Self {
            fallback: Some(fallback),
        }
    }
}

#[async_trait]
impl DocumentLayout for PlainTextLayout {
    async fn extract_text(&self, path: &Path) -> EvalResult<String> {
        if is_plain_text(path) {
            debug!("Reading {} as plain text", path.display());
            return Ok(tokio::fs::read_to_string(path).await?);
        }

        match &self.fallback {
            Some(layout) => layout.extract_text(path).await,
            None => Err(EvalError::Configuration(format!(
                "Cannot extract text from {}: no document layout service is configured",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    struct FixedLayout(&'static str);

    #[async_trait]
    impl DocumentLayout for FixedLayout {
        async fn extract_text(&self, _path: &Path) -> EvalResult<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_is_plain_text() {
        assert!(is_plain_text(Path::new("rfp.txt")));
        assert!(is_plain_text(Path::new("proposal.MD")));
        assert!(!is_plain_text(Path::new("proposal.pdf")));
        assert!(!is_plain_text(Path::new("README")));
    }

    #[tokio::test]
    async fn test_reads_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rfp.md");
        fs::write(&path, "## Purpose\nCloud hosting").unwrap();

        let text = PlainTextLayout::new().extract_text(&path).await.unwrap();
        assert_eq!(text, "## Purpose\nCloud hosting");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let result = PlainTextLayout::new()
            .extract_text(&PathBuf::from("does-not-exist.txt"))
            .await;
        assert!(matches!(result, Err(EvalError::Io(_))));
    }

    #[tokio::test]
    async fn test_binary_documents_need_a_service() {
        let path = PathBuf::from("proposal.pdf");
        let result = PlainTextLayout::new().extract_text(&path).await;
        assert!(matches!(result, Err(EvalError::Configuration(_))));

        let layout = PlainTextLayout::with_fallback(Arc::new(FixedLayout("from service")));
        assert_eq!(layout.extract_text(&path).await.unwrap(), "from service");
    }
}
