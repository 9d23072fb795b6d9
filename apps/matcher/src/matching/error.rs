use thiserror::Error;

use crate::nlp::AnalysisError;

/// Failure of a single matching run. Any variant aborts the run before a
/// score is produced; there are no partial results.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The declared extension is not one of pdf, txt, docx. Carries the
    /// extension as given, including the leading dot (empty if none).
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Error extracting text from {path}: {cause}")]
    Extraction { path: String, cause: String },

    #[error("Linguistic analysis unavailable: {0}")]
    AnalysisUnavailable(#[from] AnalysisError),
}

impl MatchError {
    pub(crate) fn extraction(path: &str, cause: impl std::fmt::Display) -> Self {
        MatchError::Extraction {
            path: path.to_string(),
            cause: cause.to_string(),
        }
    }
}
