use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::matching::pipeline::{MatchSettings, RequiredExperience};
use crate::nlp::onnx::DEFAULT_MAX_SEQUENCE_LENGTH;
use crate::nlp::{AnalyzerConfig, ModelAssets};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub required_experience_years: u32,
    pub infer_required_experience: bool,
    pub max_upload_bytes: usize,
    pub embedding_dim: usize,
    pub extra_stopwords: Vec<String>,
    /// ONNX model and tokenizer; set both or neither.
    pub embedding_model_path: Option<PathBuf>,
    pub embedding_tokenizer_path: Option<PathBuf>,
    pub embedding_max_tokens: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            required_experience_years: 5,
            infer_required_experience: false,
            max_upload_bytes: 10 * 1024 * 1024,
            embedding_dim: 300,
            extra_stopwords: Vec::new(),
            embedding_model_path: None,
            embedding_tokenizer_path: None,
            embedding_max_tokens: DEFAULT_MAX_SEQUENCE_LENGTH,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        let config = Config {
            port: env_or("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            required_experience_years: env_or(
                "REQUIRED_EXPERIENCE_YEARS",
                defaults.required_experience_years,
            )?,
            infer_required_experience: env_or(
                "INFER_REQUIRED_EXPERIENCE",
                defaults.infer_required_experience,
            )?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            embedding_dim: env_or("EMBEDDING_DIM", defaults.embedding_dim)?,
            extra_stopwords: std::env::var("EXTRA_STOPWORDS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            embedding_model_path: env_path("EMBEDDING_MODEL_PATH"),
            embedding_tokenizer_path: env_path("EMBEDDING_TOKENIZER_PATH"),
            embedding_max_tokens: env_or("EMBEDDING_MAX_TOKENS", defaults.embedding_max_tokens)?,
        };
        config.model_assets()?;
        Ok(config)
    }

    /// The configured embedding model, if any.
    pub fn model_assets(&self) -> Result<Option<ModelAssets>> {
        match (&self.embedding_model_path, &self.embedding_tokenizer_path) {
            (Some(model_path), Some(tokenizer_path)) => Ok(Some(ModelAssets {
                model_path: model_path.clone(),
                tokenizer_path: tokenizer_path.clone(),
                max_sequence_length: self.embedding_max_tokens,
            })),
            (None, None) => Ok(None),
            _ => bail!("EMBEDDING_MODEL_PATH and EMBEDDING_TOKENIZER_PATH must be set together"),
        }
    }

    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            required_experience: RequiredExperience {
                fixed_years: self.required_experience_years,
                infer_from_job_description: self.infer_required_experience,
            },
            ..MatchSettings::default()
        }
    }

    pub fn analyzer_config(&self) -> Result<AnalyzerConfig> {
        Ok(AnalyzerConfig {
            embedding_dim: self.embedding_dim,
            extra_stopwords: self.extra_stopwords.clone(),
            model: self.model_assets()?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
