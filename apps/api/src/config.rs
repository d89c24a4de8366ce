use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables. Everything
/// has a sensible default except the LLM credentials, which stay optional:
/// without them the service runs with the template personalizer.
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit reference-bundle override (`DATA_BUNDLE`).
    pub data_bundle: Option<PathBuf>,
    /// Directory searched for the reference bundle (`DATA_DIR`).
    pub data_dir: Option<PathBuf>,
    /// Root the per-career posting source paths are resolved against.
    pub offers_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound accepted for `top_n` in predict requests.
    pub max_recommendations: usize,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    /// When set, predict answers 503 instead of falling back to templates.
    pub require_llm: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            data_bundle: optional_env("DATA_BUNDLE").map(PathBuf::from),
            data_dir: optional_env("DATA_DIR").map(PathBuf::from),
            offers_dir: optional_env("OFFERS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_recommendations: std::env::var("MAX_RECOMMENDATIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<usize>()
                .context("MAX_RECOMMENDATIONS must be a positive integer")?,
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_model: optional_env("OPENAI_MODEL"),
            openai_base_url: optional_env("OPENAI_BASE_URL"),
            require_llm: flag_env("AI_PERSONALIZER_REQUIRE_LLM"),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn flag_env(key: &str) -> bool {
    matches!(
        optional_env(key).map(|v| v.to_lowercase()).as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}
