use anyhow::{Context, Result};

use crate::llm_client::ClientStyle;

/// Application configuration loaded from environment variables.
/// Fails fast at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    /// Wire style of the generation backend, fixed at construction.
    pub llm_client_style: ClientStyle,
    /// Directory CV documents are materialized into before hashing.
    pub download_dir: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let style = std::env::var("LLM_CLIENT_STYLE").unwrap_or_else(|_| "chat".to_string());
        let llm_client_style = match style.as_str() {
            "chat" => ClientStyle::Chat,
            "completion" => ClientStyle::Completion,
            other => anyhow::bail!("LLM_CLIENT_STYLE must be 'chat' or 'completion', got '{other}'"),
        };

        Ok(Config {
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_client_style,
            download_dir: std::env::var("DOWNLOAD_DIR")
                .unwrap_or_else(|_| "data/cv_pdfs".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
