//! Outbound collaborators: the resume data source, the AI optimize endpoint and the PDF
//! export endpoint. Every call is bounded by the configured fetch timeout.

pub mod export;
pub mod optimize;
pub mod resume;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// A network or file read that did not produce usable content. Always recoverable: callers
/// fall back to fixture data, placeholder markup or the built-in stylesheet.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("not available: {0}")]
    Missing(String),
}

/// Runs `fut` with an upper bound; hitting the bound is a [`FetchError::Timeout`].
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| FetchError::Timeout(limit))?
}

/// Builds the shared outbound client.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// GET `url` and return the body text, treating any non-2xx status as a failure.
pub async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.text().await?)
}

/// Joins a base URL and a relative path with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
