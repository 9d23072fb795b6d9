//! `LexiconAnalyzer`: the default `LinguisticAnalyzer`.
//!
//! Tokens, tags and stopwords come from the built-in lexicon. Similarity
//! comes from an ONNX sentence-embedding model when one is configured, and
//! from hashed trigram vectors otherwise.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::nlp::embedding::{cosine, HashedEmbedder, DEFAULT_DIM};
use crate::nlp::lexicon::tag_word;
use crate::nlp::onnx::{ModelAssets, OnnxEmbedder};
use crate::nlp::stopwords::StopwordFilter;
use crate::nlp::{AnalysisError, AnalyzedToken, LinguisticAnalyzer, PartOfSpeech};

/// Word runs (with inner `.'+#@&-` joiners and trailing `+`/`#` so that
/// `c++`, `node.js` and email addresses stay whole), whitespace runs, or a
/// single punctuation/symbol character.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\w]+(?:[.'+#@&\-][\w]+)*[+#]*|\s+|[^\w\s]")
        .expect("token pattern is valid")
});

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Width of the hashed fallback vectors.
    pub embedding_dim: usize,
    pub extra_stopwords: Vec<String>,
    pub model: Option<ModelAssets>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            embedding_dim: DEFAULT_DIM,
            extra_stopwords: Vec::new(),
            model: None,
        }
    }
}

enum SimilarityBackend {
    Model(OnnxEmbedder),
    Hashed(HashedEmbedder),
}

pub struct LexiconAnalyzer {
    stopwords: StopwordFilter,
    similarity: SimilarityBackend,
}

impl LexiconAnalyzer {
    /// Builds the analyzer. Called once by the process owner.
    pub fn load(config: &AnalyzerConfig) -> Result<Self, AnalysisError> {
        let mut stopwords = StopwordFilter::english();
        stopwords.extend(&config.extra_stopwords);
        let mut analyzer = Self::with_stopwords(stopwords, config.embedding_dim)?;
        if let Some(assets) = &config.model {
            analyzer.similarity = SimilarityBackend::Model(OnnxEmbedder::load(assets)?);
        }
        Ok(analyzer)
    }

    pub fn with_stopwords(
        stopwords: StopwordFilter,
        embedding_dim: usize,
    ) -> Result<Self, AnalysisError> {
        if stopwords.is_empty() {
            return Err(AnalysisError::Unavailable(
                "stopword lexicon is empty".to_string(),
            ));
        }
        if embedding_dim == 0 {
            return Err(AnalysisError::Unavailable(
                "embedding dimension must be positive".to_string(),
            ));
        }
        let embedder = HashedEmbedder::new(embedding_dim);
        info!(
            "Lexicon analyzer loaded ({} stopwords, {}-dim hashed vectors)",
            stopwords.len(),
            embedder.dim()
        );
        Ok(Self {
            stopwords,
            similarity: SimilarityBackend::Hashed(embedder),
        })
    }

    fn annotate(&self, surface: &str) -> AnalyzedToken {
        if surface.chars().all(char::is_whitespace) {
            return AnalyzedToken {
                text: surface.to_string(),
                lemma: surface.to_string(),
                pos: PartOfSpeech::Space,
                is_stop: false,
                is_punct: false,
                is_space: true,
            };
        }
        if !surface.chars().any(|c| c.is_alphanumeric() || c == '_') {
            return AnalyzedToken {
                text: surface.to_string(),
                lemma: surface.to_string(),
                pos: PartOfSpeech::Punctuation,
                is_stop: false,
                is_punct: true,
                is_space: false,
            };
        }

        let (pos, lemma) = tag_word(surface);
        let is_stop = self.stopwords.is_stopword(surface)
            || (pos == PartOfSpeech::Verb && self.stopwords.is_stopword(&lemma));
        AnalyzedToken {
            text: surface.to_string(),
            lemma,
            pos,
            is_stop,
            is_punct: false,
            is_space: false,
        }
    }

    fn document_vector(&self, text: &str) -> Result<Option<Vec<f32>>, AnalysisError> {
        match &self.similarity {
            SimilarityBackend::Model(model) => model.embed(text),
            SimilarityBackend::Hashed(embedder) => {
                let words = TOKEN_RE
                    .find_iter(text)
                    .map(|m| m.as_str())
                    .filter(|t| t.chars().any(|c| c.is_alphanumeric()));
                Ok(embedder.document_vector(words))
            }
        }
    }
}

impl LinguisticAnalyzer for LexiconAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<AnalyzedToken>, AnalysisError> {
        let tokens: Vec<AnalyzedToken> = TOKEN_RE
            .find_iter(text)
            .map(|m| self.annotate(m.as_str()))
            .collect();
        debug!("Analyzed {} chars into {} tokens", text.len(), tokens.len());
        Ok(tokens)
    }

    fn similarity(&self, a: &str, b: &str) -> Result<f64, AnalysisError> {
        let (Some(va), Some(vb)) = (self.document_vector(a)?, self.document_vector(b)?) else {
            return Ok(0.0);
        };
        Ok(cosine(&va, &vb).clamp(0.0, 1.0))
    }

    fn backend(&self) -> &'static str {
        match self.similarity {
            SimilarityBackend::Model(_) => "lexicon+onnx",
            SimilarityBackend::Hashed(_) => "lexicon+hashed",
        }
    }
}
