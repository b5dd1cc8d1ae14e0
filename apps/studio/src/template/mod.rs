//! Template/Style Loader: fetches a template's markup and stylesheet, installs them into
//! the preview container, and keeps their styling isolated from the host page.

pub mod bundled;
pub mod loader;
pub mod scope;
pub mod source;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::Config;

pub use loader::{load_catalog, TemplateLoader, DEFAULT_PRIMARY_COLOR, STYLE_ELEMENT_ID};
pub use source::{BundledTemplateSource, FsTemplateSource, HttpTemplateSource, TemplateSource};

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("invalid colour value '{0}'")]
    InvalidColor(String),

    #[error("no template is active")]
    NoActiveTemplate,
}

/// Picks the template source from configuration: a remote catalog, then a local
/// directory, then the bundled templates.
pub fn source_from_config(config: &Config) -> Arc<dyn TemplateSource> {
    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    if let Some(url) = &config.templates_url {
        return Arc::new(HttpTemplateSource::new(url.clone(), timeout));
    }
    if let Some(dir) = &config.templates_dir {
        return Arc::new(FsTemplateSource::new(dir.clone(), timeout));
    }
    Arc::new(BundledTemplateSource)
}
