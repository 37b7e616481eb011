use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::matching::{ModelChoice, MAX_TOP_N};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub lexical_model_path: PathBuf,
    pub semantic_model_path: PathBuf,
    /// Directory holding `model.onnx` and `tokenizer.json` for the sentence encoder.
    pub embedding_model_dir: PathBuf,
    pub default_matcher: ModelChoice,
    /// Overrides every matcher's own default `top_n` when set.
    pub recommendation_top_n: Option<usize>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            lexical_model_path: env_path("LEXICAL_MODEL_PATH", "models/lexical.bin"),
            semantic_model_path: env_path("SEMANTIC_MODEL_PATH", "models/semantic.bin"),
            embedding_model_dir: env_path("EMBEDDING_MODEL_DIR", "models/all-MiniLM-L6-v2"),
            default_matcher: std::env::var("DEFAULT_MATCHER")
                .unwrap_or_else(|_| "semantic".to_string())
                .parse::<ModelChoice>()
                .map_err(anyhow::Error::msg)
                .context("DEFAULT_MATCHER must be 'lexical' or 'semantic'")?,
            recommendation_top_n: parse_top_n(std::env::var("RECOMMENDATION_TOP_N").ok())?,
        })
    }

    /// Without a sentence encoder the semantic matcher can never load, so an
    /// unrequested default falls back to lexical.
    pub fn fit_to_encoder(&mut self, encoder_available: bool) {
        if !encoder_available && self.default_matcher == ModelChoice::Semantic {
            tracing::warn!("No sentence encoder loaded; default matcher set to lexical");
            self.default_matcher = ModelChoice::Lexical;
        }
    }
}

fn parse_top_n(raw: Option<String>) -> Result<Option<usize>> {
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    let top_n = raw
        .trim()
        .parse::<usize>()
        .context("RECOMMENDATION_TOP_N must be a positive integer")?;
    anyhow::ensure!(
        (1..=MAX_TOP_N).contains(&top_n),
        "RECOMMENDATION_TOP_N must be between 1 and {MAX_TOP_N}, got {top_n}"
    );
    Ok(Some(top_n))
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
