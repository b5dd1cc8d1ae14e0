use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every outbound collaborator is optional; a missing URL selects the local fallback.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Base URL of the live resume service (`{base}/resume/{id}`).
    pub resume_api_url: Option<String>,
    pub mock_data_path: PathBuf,
    /// Base URL serving `templates.json` and `{id}/{file}`.
    pub templates_url: Option<String>,
    pub templates_dir: Option<PathBuf>,
    pub fetch_timeout_secs: u64,
    pub optimize_api_url: Option<String>,
    pub export_api_url: Option<String>,
    pub default_template: Option<String>,
    /// Sessions with no change for this long are dropped.
    pub session_idle_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            resume_api_url: optional_env("RESUME_API_URL"),
            mock_data_path: optional_env("MOCK_DATA_PATH")
                .unwrap_or_else(|| "mock/resume-mock-data.json".to_string())
                .into(),
            templates_url: optional_env("TEMPLATES_URL"),
            templates_dir: optional_env("TEMPLATES_DIR").map(PathBuf::from),
            fetch_timeout_secs: optional_env("FETCH_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("FETCH_TIMEOUT_SECS must be a whole number of seconds")?
                .unwrap_or(10),
            optimize_api_url: optional_env("OPTIMIZE_API_URL"),
            export_api_url: optional_env("EXPORT_API_URL"),
            default_template: optional_env("DEFAULT_TEMPLATE"),
            session_idle_secs: optional_env("SESSION_IDLE_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("SESSION_IDLE_SECS must be a whole number of seconds")?
                .unwrap_or(3600),
        })
    }

    /// Configuration with every collaborator unset.
    #[cfg(test)]
    pub fn local() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            resume_api_url: None,
            mock_data_path: "mock/resume-mock-data.json".into(),
            templates_url: None,
            templates_dir: None,
            fetch_timeout_secs: 10,
            optimize_api_url: None,
            export_api_url: None,
            default_template: None,
            session_idle_secs: 3600,
        }
    }
}

/// Unset and blank variables both read as `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
