/// Optimize client: the single point of entry for the external AI rewrite service.
///
/// The service is opaque. It receives an instruction plus the current document and answers
/// with a (possibly partial) document, which the caller overlays with `merge_optimized`.
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::sources::http_client;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("no optimize service is configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("optimize service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("optimize service gave up after {retries} retries")]
    Exhausted { retries: u32 },

    #[error("optimize service returned no document")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct OptimizeRequest<'a> {
    instruction: &'a str,
    content: &'a Value,
}

/// What the service proposed. `overlay` has the document's shape; fields it leaves out or
/// empties are kept from the current document.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeOutcome {
    pub overlay: Value,
    pub suggestions: Vec<String>,
    pub explanation: Option<String>,
}

#[derive(Clone)]
pub struct OptimizeClient {
    client: Client,
    endpoint: Option<String>,
    timeout: Duration,
    /// Delay before the first retry; doubled for each one after.
    backoff: Duration,
}

impl OptimizeClient {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            endpoint,
            timeout,
            backoff: Duration::from_secs(1),
        }
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sends `content` for rewriting. Retries on 429 and 5xx with exponential backoff.
    pub async fn optimize(&self, instruction: &str, content: &Value) -> Result<OptimizeOutcome, OptimizeError> {
        let endpoint = self.endpoint.as_deref().ok_or(OptimizeError::NotConfigured)?;
        let body = OptimizeRequest { instruction, content };

        let mut last_error: Option<OptimizeError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = self.backoff * (1 << (attempt - 1));
                warn!(
                    "optimize attempt {} failed, retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(endpoint).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(if e.is_timeout() {
                        OptimizeError::Timeout(self.timeout)
                    } else {
                        OptimizeError::Http(e)
                    });
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                warn!("optimize service returned {}: {}", status, message);
                last_error = Some(OptimizeError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(OptimizeError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let text = response.text().await?;
            debug!(bytes = text.len(), "optimize call succeeded");
            return parse_outcome(&text);
        }

        Err(last_error.unwrap_or(OptimizeError::Exhausted {
            retries: MAX_RETRIES,
        }))
    }
}

/// Accepts a bare document, `{ "optimizedResume": {...}, "suggestions": [...] }`, either of
/// them wrapped in `{ "data": ... }`, or any of those as a fenced JSON string.
fn parse_outcome(text: &str) -> Result<OptimizeOutcome, OptimizeError> {
    let mut value: Value = serde_json::from_str(strip_json_fences(text))?;
    if let Value::String(inner) = &value {
        value = serde_json::from_str(strip_json_fences(inner))?;
    }
    if let Some(data) = value.get("data").filter(|d| d.is_object()) {
        value = data.clone();
    }

    let suggestions = value
        .get("suggestions")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    let explanation = value
        .get("optimizeExplanation")
        .and_then(Value::as_str)
        .map(str::to_string);

    let overlay = match value.get("optimizedResume") {
        Some(Value::Object(doc)) => Value::Object(doc.clone()),
        Some(Value::String(raw)) => serde_json::from_str(strip_json_fences(raw))?,
        Some(_) => return Err(OptimizeError::EmptyContent),
        None => value,
    };
    if !overlay.is_object() {
        return Err(OptimizeError::EmptyContent);
    }

    Ok(OptimizeOutcome {
        overlay,
        suggestions,
        explanation,
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Answers `status` for the first `failures` calls, then a one-field document.
    fn flaky(status: StatusCode, failures: usize, calls: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/optimize",
            post(move || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < failures {
                        (status, "try again".to_string())
                    } else {
                        (StatusCode::OK, r#"{ "summary": "重写后的自我评价" }"#.to_string())
                    }
                }
            }),
        )
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/optimize")
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_parse_outcome_bare_document() {
        let outcome = parse_outcome(r#"{ "summary": "更好的自我评价" }"#).unwrap();
        assert_eq!(outcome.overlay, json!({ "summary": "更好的自我评价" }));
        assert!(outcome.suggestions.is_empty());
    }

    #[test]
    fn test_parse_outcome_wrapped_result() {
        let text = r#"{ "data": {
            "optimizedResume": { "basic": { "position": "高级工程师" } },
            "suggestions": ["量化成果"],
            "optimizeExplanation": "突出了职级"
        } }"#;
        let outcome = parse_outcome(text).unwrap();
        assert_eq!(outcome.overlay, json!({ "basic": { "position": "高级工程师" } }));
        assert_eq!(outcome.suggestions, vec!["量化成果".to_string()]);
        assert_eq!(outcome.explanation.as_deref(), Some("突出了职级"));
    }

    #[test]
    fn test_parse_outcome_fenced_string_payload() {
        let text = serde_json::to_string("```json\n{\"summary\": \"x\"}\n```").unwrap();
        assert_eq!(parse_outcome(&text).unwrap().overlay, json!({ "summary": "x" }));
    }

    #[test]
    fn test_parse_outcome_rejects_non_documents() {
        assert!(matches!(parse_outcome("[1, 2]"), Err(OptimizeError::EmptyContent)));
        assert!(matches!(parse_outcome("not json"), Err(OptimizeError::Parse(_))));
    }

    #[tokio::test]
    async fn test_optimize_without_endpoint() {
        let client = OptimizeClient::new(None, Duration::from_secs(1));
        let err = client.optimize("polish", &json!({})).await.unwrap_err();
        assert!(matches!(err, OptimizeError::NotConfigured));
    }

    #[tokio::test]
    async fn test_optimize_posts_instruction_and_content() {
        let app = Router::new().route(
            "/optimize",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "optimizedResume": { "summary": format!("{}: {}", body["instruction"].as_str().unwrap_or(""), body["content"]["summary"].as_str().unwrap_or("")) }
                }))
            }),
        );
        let client = OptimizeClient::new(Some(serve(app).await), Duration::from_secs(5));
        let outcome = client
            .optimize("polish", &json!({ "summary": "draft" }))
            .await
            .unwrap();
        assert_eq!(outcome.overlay, json!({ "summary": "polish: draft" }));
    }

    #[tokio::test]
    async fn test_optimize_client_errors_are_not_retried() {
        let app = Router::new().route(
            "/optimize",
            post(|| async { (StatusCode::BAD_REQUEST, "bad instruction") }),
        );
        let client = OptimizeClient::new(Some(serve(app).await), Duration::from_secs(5));
        let err = client.optimize("", &json!({})).await.unwrap_err();
        assert!(matches!(err, OptimizeError::Api { status: 400, ref message } if message == "bad instruction"));
    }

    #[tokio::test]
    async fn test_optimize_retries_server_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let url = serve(flaky(StatusCode::SERVICE_UNAVAILABLE, 1, calls.clone())).await;
        let client = OptimizeClient::new(Some(url), Duration::from_secs(5))
            .with_backoff(Duration::from_millis(5));
        let outcome = client.optimize("polish", &json!({})).await.unwrap();
        assert_eq!(outcome.overlay, json!({ "summary": "重写后的自我评价" }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_optimize_gives_up_on_persistent_rate_limit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let url = serve(flaky(StatusCode::TOO_MANY_REQUESTS, usize::MAX, calls.clone())).await;
        let client = OptimizeClient::new(Some(url), Duration::from_secs(5))
            .with_backoff(Duration::from_millis(5));
        let err = client.optimize("polish", &json!({})).await.unwrap_err();
        assert!(matches!(err, OptimizeError::Api { status: 429, ref message } if message == "try again"));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES as usize);
    }
}
