//! Text cleaning for the two sides of a match.
//!
//! The resume and the job description are cleaned differently and the
//! outputs have different shapes (space-joined vs newline-joined). They are
//! consumed separately by callers, so they stay two named operations.

use std::collections::HashSet;
use std::hash::Hash;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::nlp::{AnalysisError, AnalyzedToken, LinguisticAnalyzer, PartOfSpeech};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

const DROPPED_CATEGORIES: [PartOfSpeech; 3] = [
    PartOfSpeech::Adposition,
    PartOfSpeech::Determiner,
    PartOfSpeech::Pronoun,
];

/// Order-preserving dedup: the first occurrence of each item wins.
pub fn dedup_preserving_order<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Normalized resume tokens: lowercased, content words only, verbs
/// lemmatized, deduplicated in first-occurrence order.
pub fn normalize_tokens(
    analyzer: &dyn LinguisticAnalyzer,
    text: &str,
) -> Result<Vec<String>, AnalysisError> {
    let tokens = analyzer.analyze(&text.to_lowercase())?;
    let kept = tokens.into_iter().filter(is_content_token).map(|t| {
        if t.pos == PartOfSpeech::Verb {
            t.lemma
        } else {
            t.text
        }
    });
    Ok(dedup_preserving_order(kept))
}

/// Cleaned resume text: [`normalize_tokens`] joined with single spaces.
pub fn clean_resume_text(
    analyzer: &dyn LinguisticAnalyzer,
    text: &str,
) -> Result<String, AnalysisError> {
    Ok(normalize_tokens(analyzer, text)?.join(" "))
}

/// Distinct words of a job description in first-occurrence order, one per
/// line. No case folding and no stopword or grammar filtering.
pub fn unique_words_jd(text: &str) -> String {
    dedup_preserving_order(WORD_RE.find_iter(text).map(|m| m.as_str())).join("\n")
}

/// Token texts with stopwords dropped, as fed to the similarity scorer.
pub fn scoring_tokens(
    analyzer: &dyn LinguisticAnalyzer,
    text: &str,
) -> Result<Vec<String>, AnalysisError> {
    Ok(analyzer
        .analyze(text)?
        .into_iter()
        .filter(|t| !t.is_stop)
        .map(|t| t.text)
        .collect())
}

fn is_content_token(token: &AnalyzedToken) -> bool {
    !token.is_stop
        && !token.is_punct
        && !token.is_space
        && !DROPPED_CATEGORIES.contains(&token.pos)
}
