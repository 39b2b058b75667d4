use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::gemini::DEFAULT_API_BASE;

/// Application configuration loaded from environment variables.
/// Nothing is strictly required: without `GEMINI_API_KEY` the server starts,
/// but every Gemini-backed request fails with an upstream error.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub port: u16,
    pub rust_log: String,
    /// PDFs travel inline as base64, so this is well above Axum's 2 MB default.
    pub body_limit_bytes: usize,
    /// Replaces the bundled curriculum catalog when set.
    pub curriculum_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let body_limit_mb = optional_env("BODY_LIMIT_MB")
            .unwrap_or_else(|| "50".to_string())
            .parse::<usize>()
            .context("BODY_LIMIT_MB must be a whole number of megabytes")?;

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_api_base: optional_env("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            port: optional_env("PORT")
                .unwrap_or_else(|| "3001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            body_limit_bytes: body_limit_mb * 1024 * 1024,
            curriculum_path: optional_env("CURRICULUM_PATH").map(PathBuf::from),
        })
    }
}

/// Unset and blank variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
