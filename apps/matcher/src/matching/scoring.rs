//! Match scoring and classification.
//!
//! `score = (semantic × 0.7 + experience_ratio × 0.3) × 100`, left unclamped:
//! a candidate with more experience than required can score above 100.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::nlp::{AnalysisError, LinguisticAnalyzer};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub semantic: f64,
    pub experience: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic: 0.7,
            experience: 0.3,
        }
    }
}

/// `resume_years / jd_years`; a zero requirement counts as fully met.
pub fn experience_ratio(resume_years: u32, jd_years: u32) -> f64 {
    if jd_years > 0 {
        resume_years as f64 / jd_years as f64
    } else {
        1.0
    }
}

/// Weighted percentage from the two signals.
pub fn weighted_score(semantic: f64, experience: f64, weights: &ScoringWeights) -> f64 {
    (semantic * weights.semantic + experience * weights.experience) * 100.0
}

/// Semantic similarity of two token sequences, each rebuilt into a
/// space-joined document. An empty side scores 0 without calling the analyzer.
pub fn semantic_similarity(
    analyzer: &dyn LinguisticAnalyzer,
    resume_tokens: &[String],
    jd_tokens: &[String],
) -> Result<f64, AnalysisError> {
    if resume_tokens.is_empty() || jd_tokens.is_empty() {
        return Ok(0.0);
    }
    analyzer.similarity(&resume_tokens.join(" "), &jd_tokens.join(" "))
}

/// Full score for a document pair.
pub fn calculate_similarity(
    analyzer: &dyn LinguisticAnalyzer,
    resume_tokens: &[String],
    jd_tokens: &[String],
    resume_years: u32,
    jd_years: u32,
    weights: &ScoringWeights,
) -> Result<f64, AnalysisError> {
    let semantic = semantic_similarity(analyzer, resume_tokens, jd_tokens)?;
    let experience = experience_ratio(resume_years, jd_years);
    let score = weighted_score(semantic, experience, weights);
    debug!("semantic={semantic:.4} experience={experience:.4} score={score:.2}");
    Ok(score)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchCategory {
    Poor,
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Excellent,
}

impl MatchCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchCategory::Poor => "Poor",
            MatchCategory::Fair => "Fair",
            MatchCategory::Good => "Good",
            MatchCategory::VeryGood => "Very Good",
            MatchCategory::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for MatchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds are lower-inclusive: 20 is Fair, 90 is Excellent.
pub fn classify(score: f64) -> MatchCategory {
    if score < 20.0 {
        MatchCategory::Poor
    } else if score < 50.0 {
        MatchCategory::Fair
    } else if score < 70.0 {
        MatchCategory::Good
    } else if score < 90.0 {
        MatchCategory::VeryGood
    } else {
        MatchCategory::Excellent
    }
}
