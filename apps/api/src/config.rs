use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 180;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on image calls in flight for a single book.
    pub image_concurrency: usize,
    /// Deadline for one image call, after which that scene counts as failed.
    pub image_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let image_concurrency = optional_env("IMAGE_CONCURRENCY", "6")
            .parse::<usize>()
            .context("IMAGE_CONCURRENCY must be a positive integer")?;
        if image_concurrency == 0 {
            bail!("IMAGE_CONCURRENCY must be at least 1");
        }

        let image_timeout_secs = match std::env::var("IMAGE_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("IMAGE_TIMEOUT_SECS must be a number of seconds")?,
            Err(_) => DEFAULT_IMAGE_TIMEOUT_SECS,
        };

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
            image_concurrency,
            image_timeout: Duration::from_secs(image_timeout_secs),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
