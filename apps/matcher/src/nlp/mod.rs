//! Linguistic analysis provider.
//!
//! ARCHITECTURAL RULE: the matching core never tokenizes, tags or embeds text
//! itself. Every such call goes through a [`LinguisticAnalyzer`], which is
//! built once by the process owner and shared as `Arc<dyn LinguisticAnalyzer>`.
//!
//! Default backend: [`LexiconAnalyzer`], with an optional ONNX embedding
//! model for similarity.

pub mod analyzer;
pub mod embedding;
pub mod lexicon;
pub mod onnx;
pub mod stopwords;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use analyzer::{AnalyzerConfig, LexiconAnalyzer};
pub use onnx::ModelAssets;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis provider unavailable: {0}")]
    Unavailable(String),
}

/// Grammatical category assigned to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartOfSpeech {
    Adposition,
    Auxiliary,
    Conjunction,
    Determiner,
    Noun,
    Numeral,
    Pronoun,
    Punctuation,
    Space,
    Verb,
}

/// One token of analyzed text with the annotations the matching core relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedToken {
    pub text: String,
    /// Base form for verbs; equal to `text` for every other category.
    pub lemma: String,
    pub pos: PartOfSpeech,
    pub is_stop: bool,
    pub is_punct: bool,
    pub is_space: bool,
}

/// The analysis capability injected into the matching pipeline.
///
/// Implementations must be reentrant: a single instance serves every
/// document pair, possibly from several blocking threads at once.
pub trait LinguisticAnalyzer: Send + Sync {
    /// Tokenizes and annotates `text`.
    fn analyze(&self, text: &str) -> Result<Vec<AnalyzedToken>, AnalysisError>;

    /// Meaning-level closeness of two texts in `[0, 1]`.
    fn similarity(&self, a: &str, b: &str) -> Result<f64, AnalysisError>;

    /// Short backend label, logged at startup.
    fn backend(&self) -> &'static str;
}
