use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::models::resume::ResumeDocument;
use crate::sources::{bounded, http_client, join_url, FetchError};

/// Where resume documents are read from and persisted to.
#[async_trait]
pub trait ResumeSource: Send + Sync {
    async fn load(&self, resume_id: &str) -> Result<Value, FetchError>;
    async fn save(&self, resume_id: &str, doc: &ResumeDocument) -> Result<(), FetchError>;
}

/// `GET` / `PUT {base}/resume/{id}`.
pub struct HttpResumeSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpResumeSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// The id is percent-encoded as a single path segment.
    fn url(&self, resume_id: &str) -> String {
        match reqwest::Url::parse(&self.base_url) {
            Ok(mut url) => {
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty().push("resume").push(resume_id);
                }
                url.to_string()
            }
            Err(_) => join_url(&self.base_url, &format!("resume/{resume_id}")),
        }
    }
}

#[async_trait]
impl ResumeSource for HttpResumeSource {
    async fn load(&self, resume_id: &str) -> Result<Value, FetchError> {
        let url = self.url(resume_id);
        bounded(self.timeout, async {
            let response = self.client.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: url.clone(),
                });
            }
            Ok(unwrap_envelope(response.json::<Value>().await?))
        })
        .await
    }

    async fn save(&self, resume_id: &str, doc: &ResumeDocument) -> Result<(), FetchError> {
        let url = self.url(resume_id);
        bounded(self.timeout, async {
            let response = self.client.put(&url).json(doc).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: url.clone(),
                });
            }
            Ok(())
        })
        .await
    }
}

/// A static JSON file. Every id resolves to the same document; saving is not supported.
pub struct FixtureResumeSource {
    path: PathBuf,
    timeout: Duration,
}

impl FixtureResumeSource {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ResumeSource for FixtureResumeSource {
    async fn load(&self, _resume_id: &str) -> Result<Value, FetchError> {
        let body = bounded(self.timeout, async {
            Ok(tokio::fs::read_to_string(&self.path).await?)
        })
        .await?;
        Ok(unwrap_envelope(serde_json::from_str(&body)?))
    }

    async fn save(&self, _resume_id: &str, _doc: &ResumeDocument) -> Result<(), FetchError> {
        Err(FetchError::Missing(
            "no live resume service is configured".to_string(),
        ))
    }
}

/// Fixture files wrap the document as `{ "resumeData": ... }`; some API responses use
/// `{ "data": ... }`.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            for key in ["resumeData", "data"] {
                if map.get(key).is_some_and(Value::is_object) {
                    if let Some(inner) = map.remove(key) {
                        return inner;
                    }
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Live,
    Fixture,
    Empty,
}

#[derive(Debug, Clone)]
pub struct LoadedResume {
    pub data: Value,
    pub origin: DataOrigin,
}

/// Live source first, then the fixture, then an empty document. Never fails.
#[derive(Clone)]
pub struct ResumeRepository {
    live: Option<Arc<dyn ResumeSource>>,
    fixture: Arc<dyn ResumeSource>,
}

impl ResumeRepository {
    pub fn new(live: Option<Arc<dyn ResumeSource>>, fixture: Arc<dyn ResumeSource>) -> Self {
        Self { live, fixture }
    }

    pub async fn load(&self, resume_id: &str) -> LoadedResume {
        if let Some(live) = &self.live {
            match live.load(resume_id).await {
                Ok(data) => {
                    info!(resume_id, "loaded resume from live source");
                    return LoadedResume {
                        data,
                        origin: DataOrigin::Live,
                    };
                }
                Err(e) => warn!(resume_id, error = %e, "live resume source failed; using fixture"),
            }
        }
        match self.fixture.load(resume_id).await {
            Ok(data) => LoadedResume {
                data,
                origin: DataOrigin::Fixture,
            },
            Err(e) => {
                warn!(resume_id, error = %e, "fixture unavailable; starting from an empty resume");
                LoadedResume {
                    data: Value::Object(Default::default()),
                    origin: DataOrigin::Empty,
                }
            }
        }
    }

    /// Persists through the live source only; the fixture is read-only.
    pub async fn save(&self, resume_id: &str, doc: &ResumeDocument) -> Result<(), FetchError> {
        match &self.live {
            Some(live) => live.save(resume_id, doc).await,
            None => self.fixture.save(resume_id, doc).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    struct Unreachable;

    #[async_trait]
    impl ResumeSource for Unreachable {
        async fn load(&self, _: &str) -> Result<Value, FetchError> {
            Err(FetchError::Timeout(Duration::from_secs(10)))
        }
        async fn save(&self, _: &str, _: &ResumeDocument) -> Result<(), FetchError> {
            Err(FetchError::Timeout(Duration::from_secs(10)))
        }
    }

    fn fixture_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_fixture_unwraps_resume_data() {
        let file = fixture_file(r#"{ "resumeData": { "basic": { "name": "张三" } } }"#);
        let source = FixtureResumeSource::new(file.path(), Duration::from_secs(5));
        let data = source.load("1").await.unwrap();
        assert_eq!(data["basic"]["name"], "张三");
    }

    #[tokio::test]
    async fn test_repository_falls_back_to_fixture() {
        let file = fixture_file(r#"{ "basic": { "name": "fixture" } }"#);
        let repo = ResumeRepository::new(
            Some(Arc::new(Unreachable)),
            Arc::new(FixtureResumeSource::new(file.path(), Duration::from_secs(5))),
        );
        let loaded = repo.load("42").await;
        assert_eq!(loaded.origin, DataOrigin::Fixture);
        assert_eq!(loaded.data["basic"]["name"], "fixture");
    }

    #[tokio::test]
    async fn test_repository_ends_in_empty_document() {
        let repo = ResumeRepository::new(
            Some(Arc::new(Unreachable)),
            Arc::new(FixtureResumeSource::new("/nonexistent/resume.json", Duration::from_secs(5))),
        );
        let loaded = repo.load("42").await;
        assert_eq!(loaded.origin, DataOrigin::Empty);
        assert_eq!(loaded.data, json!({}));
    }

    #[tokio::test]
    async fn test_save_without_live_source_fails() {
        let repo = ResumeRepository::new(
            None,
            Arc::new(FixtureResumeSource::new("/nonexistent/resume.json", Duration::from_secs(5))),
        );
        let err = repo.save("1", &ResumeDocument::default()).await.unwrap_err();
        assert!(matches!(err, FetchError::Missing(_)));
    }

    #[tokio::test]
    async fn test_shipped_fixture_is_clean() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/mock/resume-mock-data.json");
        let data = FixtureResumeSource::new(path, Duration::from_secs(5))
            .load("1")
            .await
            .unwrap();
        let (doc, warnings) = crate::document::validate(data);
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(doc.basic.political_status, "共青团员");
        assert_eq!(doc.work[0].start_date, "2019");
        assert_eq!(doc.work[0].end_date, "至今");
        assert_eq!(doc.skills.len(), 2);
        assert_eq!(doc.template.current_id, "standard");
    }

    #[test]
    fn test_resume_url_escapes_id() {
        let source = HttpResumeSource::new("http://resume.local/api/", Duration::from_secs(1));
        assert_eq!(source.url("42"), "http://resume.local/api/resume/42");
        assert_eq!(source.url("a/b?c"), "http://resume.local/api/resume/a%2Fb%3Fc");
        let bare = HttpResumeSource::new("http://resume.local", Duration::from_secs(1));
        assert_eq!(bare.url("42"), "http://resume.local/resume/42");
    }

    #[test]
    fn test_unwrap_envelope_leaves_plain_documents() {
        assert_eq!(unwrap_envelope(json!({ "basic": {} })), json!({ "basic": {} }));
        assert_eq!(unwrap_envelope(json!({ "data": { "summary": "x" } })), json!({ "summary": "x" }));
        assert_eq!(unwrap_envelope(json!({ "data": "x" })), json!({ "data": "x" }));
    }
}
