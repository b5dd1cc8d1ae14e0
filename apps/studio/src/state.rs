use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::controller::ResumeController;
use crate::models::template::TemplateDescriptor;
use crate::sources::export::PdfExporter;
use crate::sources::optimize::OptimizeClient;
use crate::sources::resume::{FixtureResumeSource, HttpResumeSource, ResumeRepository, ResumeSource};
use crate::template::{load_catalog, source_from_config, TemplateSource};

/// One editing session. The mutex serializes everything that touches its preview DOM.
pub type Session = Arc<Mutex<ResumeController>>;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    pub templates: Arc<dyn TemplateSource>,
    /// Catalog served by `GET /api/v1/templates`, read on first request.
    pub catalog: Arc<OnceCell<Vec<TemplateDescriptor>>>,
    pub resumes: ResumeRepository,
    pub optimizer: OptimizeClient,
    pub exporter: PdfExporter,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        let live = config
            .resume_api_url
            .clone()
            .map(|url| Arc::new(HttpResumeSource::new(url, timeout)) as Arc<dyn ResumeSource>);
        let fixture = Arc::new(FixtureResumeSource::new(config.mock_data_path.clone(), timeout));

        AppState {
            templates: source_from_config(&config),
            catalog: Arc::new(OnceCell::new()),
            resumes: ResumeRepository::new(live, fixture),
            optimizer: OptimizeClient::new(config.optimize_api_url.clone(), timeout),
            exporter: PdfExporter::new(config.export_api_url.clone(), timeout),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Creates an empty session and registers it.
    pub async fn open_session(&self, resume_id: &str) -> (Uuid, Session) {
        let id = Uuid::new_v4();
        let controller = ResumeController::new(
            resume_id,
            self.templates.clone(),
            self.config.default_template.clone(),
        );
        let session = Arc::new(Mutex::new(controller));
        self.sessions.write().await.insert(id, session.clone());
        (id, session)
    }

    pub async fn session(&self, id: Uuid) -> Option<Session> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Drops a session. Returns `false` if it did not exist.
    pub async fn close_session(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drops sessions with no accepted change for `max_idle`. Sessions busy with a
    /// request are kept.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(controller) => now - controller.updated_at() < max_idle,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "evicted idle sessions");
        }
        evicted
    }

    pub async fn templates(&self) -> Vec<TemplateDescriptor> {
        self.catalog
            .get_or_init(|| load_catalog(self.templates.as_ref()))
            .await
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::TemplateCatalog;
    use crate::sources::FetchError;
    use crate::template::BundledTemplateSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        catalog_reads: AtomicUsize,
    }

    #[async_trait]
    impl TemplateSource for CountingSource {
        async fn catalog(&self) -> Result<TemplateCatalog, FetchError> {
            self.catalog_reads.fetch_add(1, Ordering::SeqCst);
            BundledTemplateSource.catalog().await
        }

        async fn markup(&self, t: &TemplateDescriptor) -> Result<String, FetchError> {
            BundledTemplateSource.markup(t).await
        }

        async fn stylesheet(&self, t: &TemplateDescriptor) -> Result<String, FetchError> {
            BundledTemplateSource.stylesheet(t).await
        }
    }

    #[tokio::test]
    async fn test_catalog_is_read_once() {
        let source = Arc::new(CountingSource::default());
        let mut state = AppState::from_config(Config::local());
        state.templates = source.clone();
        let first = state.templates().await;
        let second = state.templates().await;
        assert_eq!(first, second);
        assert!(!first.is_empty());
        assert_eq!(source.catalog_reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_session() {
        let state = AppState::from_config(Config::local());
        let (id, _) = state.open_session("1").await;
        assert!(state.session(id).await.is_some());
        assert!(state.close_session(id).await);
        assert!(state.session(id).await.is_none());
        assert!(!state.close_session(id).await);
    }

    #[tokio::test]
    async fn test_evict_idle_sessions() {
        let state = AppState::from_config(Config::local());
        let (idle, _) = state.open_session("1").await;
        let (busy, busy_session) = state.open_session("2").await;
        assert_eq!(state.evict_idle(Duration::from_secs(3600)).await, 0);

        let _guard = busy_session.lock().await;
        assert_eq!(state.evict_idle(Duration::ZERO).await, 1);
        assert!(state.session(idle).await.is_none());
        assert!(state.session(busy).await.is_some());
    }
}
