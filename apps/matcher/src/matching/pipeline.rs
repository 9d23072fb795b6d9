//! Match pipeline: one resume + one job description -> `MatchResult`.
//!
//! Synchronous and side-effect free apart from logging. The analyzer is
//! the only shared resource; it is injected once and read concurrently.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::matching::entities::extract_emails;
use crate::matching::error::MatchError;
use crate::matching::experience::{estimate_experience, required_years_from_text};
use crate::matching::extractor::{extract_document, DocumentFormat, DocumentSource};
use crate::matching::normalizer::{clean_resume_text, scoring_tokens, unique_words_jd};
use crate::matching::scoring::{calculate_similarity, classify, MatchCategory, ScoringWeights};
use crate::matching::sections::strip_education_section;
use crate::nlp::LinguisticAnalyzer;

/// How many years of experience the job asks for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequiredExperience {
    pub fixed_years: u32,
    /// Prefer an "N+ years" phrase found in the job description over `fixed_years`.
    pub infer_from_job_description: bool,
}

impl Default for RequiredExperience {
    fn default() -> Self {
        Self {
            fixed_years: 5,
            infer_from_job_description: false,
        }
    }
}

impl RequiredExperience {
    pub fn resolve(&self, jd_text: &str) -> u32 {
        if self.infer_from_job_description {
            if let Some(years) = required_years_from_text(jd_text) {
                return years;
            }
        }
        self.fixed_years
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MatchSettings {
    pub required_experience: RequiredExperience,
    pub weights: ScoringWeights,
}

/// Result of one document-pair evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub score: f64,
    pub category: MatchCategory,
    pub emails: Vec<String>,
    pub cleaned_resume: String,
    pub cleaned_jd: String,
    /// `jd_years - resume_years`; negative when the resume exceeds the requirement.
    pub years_diff: i64,
    pub resume_years: u32,
    pub jd_years: u32,
    pub total_experience_months: u32,
}

#[derive(Clone)]
pub struct MatchPipeline {
    analyzer: Arc<dyn LinguisticAnalyzer>,
    settings: MatchSettings,
}

impl MatchPipeline {
    pub fn new(analyzer: Arc<dyn LinguisticAnalyzer>, settings: MatchSettings) -> Self {
        Self { analyzer, settings }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn evaluate(
        &self,
        resume: DocumentSource<'_>,
        job_description: DocumentSource<'_>,
    ) -> Result<MatchResult, MatchError> {
        self.evaluate_with(resume, job_description, None)
    }

    /// Like [`evaluate`](Self::evaluate), with an optional per-request
    /// required-years value that takes precedence over the settings.
    pub fn evaluate_with(
        &self,
        resume: DocumentSource<'_>,
        job_description: DocumentSource<'_>,
        required_years: Option<u32>,
    ) -> Result<MatchResult, MatchError> {
        // Both formats are checked before either file is parsed.
        let resume_format = DocumentFormat::from_file_name(resume.file_name)?;
        let jd_format = DocumentFormat::from_file_name(job_description.file_name)?;

        let resume_doc = extract_document(resume, resume_format)?;
        let jd_doc = extract_document(job_description, jd_format)?;
        debug!(
            "Extracted resume ({:?}, {} chars) and job description ({:?}, {} chars)",
            resume_doc.format,
            resume_doc.raw_text.len(),
            jd_doc.format,
            jd_doc.raw_text.len()
        );

        let jd_years = required_years
            .unwrap_or_else(|| self.settings.required_experience.resolve(&jd_doc.raw_text));

        let result = self.match_texts(&resume_doc.raw_text, &jd_doc.raw_text, jd_years)?;
        info!(
            "Matched {} against {}: {:.2}% ({})",
            resume.file_name, job_description.file_name, result.score, result.category
        );
        Ok(result)
    }

    /// Scores already-extracted texts.
    pub fn match_texts(
        &self,
        resume_text: &str,
        jd_text: &str,
        jd_years: u32,
    ) -> Result<MatchResult, MatchError> {
        let analyzer = self.analyzer.as_ref();

        let experience = estimate_experience(&strip_education_section(resume_text));
        let resume_years = experience.whole_years();
        debug!(
            "Experience: {} months ({} years) vs {} required",
            experience.total_months, resume_years, jd_years
        );

        let cleaned_resume = clean_resume_text(analyzer, resume_text)?;
        let cleaned_jd = unique_words_jd(jd_text);
        let emails = extract_emails(resume_text);
        debug!(
            "Cleaned resume to {} chars, {} distinct JD words, {} emails",
            cleaned_resume.len(),
            cleaned_jd.lines().count(),
            emails.len()
        );

        let resume_tokens = scoring_tokens(analyzer, &cleaned_resume)?;
        let jd_tokens = scoring_tokens(analyzer, jd_text)?;

        let score = calculate_similarity(
            analyzer,
            &resume_tokens,
            &jd_tokens,
            resume_years,
            jd_years,
            &self.settings.weights,
        )?;

        Ok(MatchResult {
            score,
            category: classify(score),
            emails,
            cleaned_resume,
            cleaned_jd,
            years_diff: i64::from(jd_years) - i64::from(resume_years),
            resume_years,
            jd_years,
            total_experience_months: experience.total_months,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::extractor::tests::make_docx;
    use crate::nlp::{AnalysisError, AnalyzedToken, AnalyzerConfig, LexiconAnalyzer, PartOfSpeech};

    /// Whitespace tokenizer with a tiny stopword list and a fixed similarity.
    struct StubAnalyzer {
        similarity: f64,
    }

    impl LinguisticAnalyzer for StubAnalyzer {
        fn analyze(&self, text: &str) -> Result<Vec<AnalyzedToken>, AnalysisError> {
            Ok(text
                .split_whitespace()
                .map(|w| AnalyzedToken {
                    text: w.to_string(),
                    lemma: w.to_string(),
                    pos: PartOfSpeech::Noun,
                    is_stop: matches!(w, "the" | "and" | "a"),
                    is_punct: false,
                    is_space: false,
                })
                .collect())
        }

        fn similarity(&self, _a: &str, _b: &str) -> Result<f64, AnalysisError> {
            Ok(self.similarity)
        }

        fn backend(&self) -> &'static str {
            "stub"
        }
    }

    struct UnavailableAnalyzer;

    impl LinguisticAnalyzer for UnavailableAnalyzer {
        fn analyze(&self, _text: &str) -> Result<Vec<AnalyzedToken>, AnalysisError> {
            Err(AnalysisError::Unavailable("model not loaded".to_string()))
        }

        fn similarity(&self, _a: &str, _b: &str) -> Result<f64, AnalysisError> {
            Err(AnalysisError::Unavailable("model not loaded".to_string()))
        }

        fn backend(&self) -> &'static str {
            "unavailable"
        }
    }

    const RESUME: &str = "JANE DOE\njane.doe@example.com\nEXPERIENCE\nAcme Corp 2016-2022\n\
Deployed Kubernetes clusters and built Rust services.\nEDUCATION\nBSc Computer Science 2008-2012\n\
SKILLS\nrust kubernetes docker";

    const JD: &str = "Senior Rust Engineer\nRust and Kubernetes required. 3+ years experience.";

    fn stub_pipeline(similarity: f64) -> MatchPipeline {
        MatchPipeline::new(
            Arc::new(StubAnalyzer { similarity }),
            MatchSettings::default(),
        )
    }

    #[test]
    fn test_end_to_end_with_lexicon_analyzer() {
        let analyzer = LexiconAnalyzer::load(&AnalyzerConfig::default()).unwrap();
        let pipeline = MatchPipeline::new(Arc::new(analyzer), MatchSettings::default());

        let result = pipeline
            .evaluate(
                DocumentSource::new("resume.txt", RESUME.as_bytes()),
                DocumentSource::new("jd.txt", JD.as_bytes()),
            )
            .unwrap();

        // Education years (2008-2012) are ignored.
        assert_eq!(result.total_experience_months, 72);
        assert_eq!(result.resume_years, 6);
        assert_eq!(result.jd_years, 5);
        assert_eq!(result.years_diff, -1);
        assert_eq!(result.emails, vec!["jane.doe@example.com"]);
        assert_eq!(result.cleaned_jd, unique_words_jd(JD));
        assert!(result.cleaned_resume.contains("deploy"));
        assert!(result.cleaned_resume.contains("kubernetes"));
        // Experience alone contributes 6/5 * 30.
        assert!(result.score >= 36.0 - 1e-9);
        assert!(result.score <= 106.0 + 1e-9);
        assert_eq!(result.category, classify(result.score));
    }

    #[test]
    fn test_stub_analyzer_gives_exact_score() {
        let result = stub_pipeline(0.5).match_texts(RESUME, JD, 5).unwrap();
        // 0.5 * 70 + (6 / 5) * 30
        assert!((result.score - 71.0).abs() < 1e-9);
        assert_eq!(result.category, MatchCategory::VeryGood);
    }

    #[test]
    fn test_zero_requirement_counts_as_met() {
        let result = stub_pipeline(0.0).match_texts("no dates", JD, 0).unwrap();
        assert!((result.score - 30.0).abs() < 1e-9);
        assert_eq!(result.category, MatchCategory::Fair);
        assert_eq!(result.years_diff, 0);
    }

    #[test]
    fn test_empty_resume_scores_zero() {
        let result = stub_pipeline(0.9).match_texts("", JD, 5).unwrap();
        assert_eq!(result.score, 0.0);
        assert_eq!(result.category, MatchCategory::Poor);
        assert_eq!(result.cleaned_resume, "");
        assert_eq!(result.years_diff, 5);
    }

    #[test]
    fn test_unsupported_format_fails_before_extraction() {
        let err = stub_pipeline(0.5)
            .evaluate(
                DocumentSource::new("resume.pdf", b"corrupt"),
                DocumentSource::new("jd.rtf", JD.as_bytes()),
            )
            .unwrap_err();
        match err {
            MatchError::UnsupportedFormat(ext) => assert_eq!(ext, ".rtf"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_extraction_failure_aborts() {
        let err = stub_pipeline(0.5)
            .evaluate(
                DocumentSource::new("resume.txt", RESUME.as_bytes()),
                DocumentSource::new("jd.pdf", b"%PDF-1.7\n%%EOF-truncated"),
            )
            .unwrap_err();
        match err {
            MatchError::Extraction { path, .. } => assert_eq!(path, "jd.pdf"),
            other => panic!("expected Extraction, got {other:?}"),
        }
    }

    #[test]
    fn test_analysis_unavailable_is_fatal() {
        let pipeline = MatchPipeline::new(Arc::new(UnavailableAnalyzer), MatchSettings::default());
        let err = pipeline.match_texts(RESUME, JD, 5).unwrap_err();
        assert!(matches!(err, MatchError::AnalysisUnavailable(_)));
    }

    #[test]
    fn test_docx_resume() {
        let docx = make_docx(
            r#"<w:p><w:r><w:t>EXPERIENCE</w:t></w:r></w:p>
<w:p><w:r><w:t>Globex 2015–2020 contact: ops@globex.io</w:t></w:r></w:p>"#,
        );
        let result = stub_pipeline(0.5)
            .evaluate(
                DocumentSource::new("cv.docx", &docx),
                DocumentSource::new("jd.txt", JD.as_bytes()),
            )
            .unwrap();
        assert_eq!(result.total_experience_months, 60);
        assert_eq!(result.emails, vec!["ops@globex.io"]);
    }

    #[test]
    fn test_required_years_override_and_inference() {
        let resume = DocumentSource::new("resume.txt", RESUME.as_bytes());
        let jd = DocumentSource::new("jd.txt", JD.as_bytes());

        let fixed = stub_pipeline(0.5).evaluate(resume, jd).unwrap();
        assert_eq!(fixed.jd_years, 5);

        let overridden = stub_pipeline(0.5).evaluate_with(resume, jd, Some(8)).unwrap();
        assert_eq!(overridden.jd_years, 8);
        assert_eq!(overridden.years_diff, 2);

        let settings = MatchSettings {
            required_experience: RequiredExperience {
                fixed_years: 5,
                infer_from_job_description: true,
            },
            ..MatchSettings::default()
        };
        let pipeline = MatchPipeline::new(Arc::new(StubAnalyzer { similarity: 0.5 }), settings);
        let inferred = pipeline.evaluate(resume, jd).unwrap();
        assert_eq!(inferred.jd_years, 3);

        let no_phrase = DocumentSource::new("jd.txt", b"Rust engineer");
        assert_eq!(pipeline.evaluate(resume, no_phrase).unwrap().jd_years, 5);
    }

    #[test]
    fn test_result_serializes_category_label() {
        let result = stub_pipeline(0.5).match_texts(RESUME, JD, 5).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["category"], "Very Good");
        assert_eq!(json["total_experience_months"], 72);
    }
}
