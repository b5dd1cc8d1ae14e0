use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::template::{TemplateCatalog, TemplateDescriptor};
use crate::sources::{bounded, get_text, http_client, join_url, FetchError};
use crate::template::bundled;

/// Where template catalogs, markup and stylesheets come from.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn catalog(&self) -> Result<TemplateCatalog, FetchError>;
    async fn markup(&self, template: &TemplateDescriptor) -> Result<String, FetchError>;
    async fn stylesheet(&self, template: &TemplateDescriptor) -> Result<String, FetchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP: GET {base}/templates.json, {base}/{id}/{file}
// ────────────────────────────────────────────────────────────────────────────

pub struct HttpTemplateSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTemplateSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: base_url.into(),
            timeout,
        }
    }

    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let url = join_url(&self.base_url, path);
        bounded(self.timeout, get_text(&self.client, &url)).await
    }
}

#[async_trait]
impl TemplateSource for HttpTemplateSource {
    async fn catalog(&self) -> Result<TemplateCatalog, FetchError> {
        let body = self.fetch("templates.json").await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn markup(&self, template: &TemplateDescriptor) -> Result<String, FetchError> {
        self.fetch(&format!("{}/{}", template.id, template.markup_file()))
            .await
    }

    async fn stylesheet(&self, template: &TemplateDescriptor) -> Result<String, FetchError> {
        self.fetch(&format!("{}/{}", template.id, template.style_file()))
            .await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Filesystem: same layout as the HTTP source, rooted at a directory
// ────────────────────────────────────────────────────────────────────────────

pub struct FsTemplateSource {
    root: PathBuf,
    timeout: Duration,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    async fn read(&self, path: PathBuf) -> Result<String, FetchError> {
        bounded(self.timeout, async move {
            Ok(tokio::fs::read_to_string(path).await?)
        })
        .await
    }
}

#[async_trait]
impl TemplateSource for FsTemplateSource {
    async fn catalog(&self) -> Result<TemplateCatalog, FetchError> {
        let body = self.read(self.root.join("templates.json")).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn markup(&self, template: &TemplateDescriptor) -> Result<String, FetchError> {
        self.read(self.root.join(&template.id).join(template.markup_file()))
            .await
    }

    async fn stylesheet(&self, template: &TemplateDescriptor) -> Result<String, FetchError> {
        self.read(self.root.join(&template.id).join(template.style_file()))
            .await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bundled
// ────────────────────────────────────────────────────────────────────────────

pub struct BundledTemplateSource;

#[async_trait]
impl TemplateSource for BundledTemplateSource {
    async fn catalog(&self) -> Result<TemplateCatalog, FetchError> {
        Ok(bundled::catalog())
    }

    async fn markup(&self, template: &TemplateDescriptor) -> Result<String, FetchError> {
        bundled::markup(&template.id)
            .map(str::to_string)
            .ok_or_else(|| FetchError::Missing(format!("bundled markup for '{}'", template.id)))
    }

    async fn stylesheet(&self, template: &TemplateDescriptor) -> Result<String, FetchError> {
        bundled::stylesheet(&template.id)
            .map(str::to_string)
            .ok_or_else(|| FetchError::Missing(format!("bundled stylesheet for '{}'", template.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &std::path::Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[tokio::test]
    async fn test_fs_source_reads_catalog_and_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "templates.json",
            r##"{ "templates": [{ "id": "ocean", "name": "Ocean", "primaryColor": "#006994",
                  "htmlPath": "/templates/ocean/index.html", "cssPath": "/templates/ocean/ocean.css" }] }"##,
        );
        write(dir.path(), "ocean/index.html", "<h1 data-bind=\"basic.name\"></h1>");
        write(dir.path(), "ocean/ocean.css", ".resume-name { color: navy; }");

        let source = FsTemplateSource::new(dir.path(), Duration::from_secs(5));
        let catalog = source.catalog().await.unwrap();
        assert_eq!(catalog.templates.len(), 1);
        let ocean = &catalog.templates[0];
        assert!(source.markup(ocean).await.unwrap().contains("basic.name"));
        assert!(source.stylesheet(ocean).await.unwrap().contains("navy"));
    }

    #[tokio::test]
    async fn test_fs_source_missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsTemplateSource::new(dir.path(), Duration::from_secs(5));
        assert!(matches!(source.catalog().await, Err(FetchError::Io(_))));
    }

    #[tokio::test]
    async fn test_bundled_source_serves_every_template() {
        let source = BundledTemplateSource;
        let catalog = source.catalog().await.unwrap();
        for t in &catalog.templates {
            assert!(source.markup(t).await.is_ok());
            assert!(source.stylesheet(t).await.is_ok());
        }
    }
}
