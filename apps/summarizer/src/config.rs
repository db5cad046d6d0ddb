use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::MODEL;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub anthropic_api_key: String,
    pub llm_model: String,
    /// Language the model writes summaries and analyses in.
    pub llm_response_language: String,
    /// Tesseract language spec, e.g. `por+eng`.
    pub ocr_languages: String,
    pub tesseract_bin: String,
    /// Where uploaded files are materialized for the lifetime of a job.
    pub staging_dir: PathBuf,
    pub job_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_model: env_or("LLM_MODEL", MODEL),
            llm_response_language: env_or("LLM_RESPONSE_LANGUAGE", "Brazilian Portuguese"),
            ocr_languages: env_or("OCR_LANGUAGES", "por+eng"),
            tesseract_bin: env_or("TESSERACT_BIN", "tesseract"),
            staging_dir: std::env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            job_timeout: Duration::from_secs(parse_env("JOB_TIMEOUT_SECS", 900)?),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
