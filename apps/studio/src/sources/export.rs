use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::sources::{bounded, http_client, FetchError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no export service is configured")]
    NotConfigured,

    #[error("export failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("export service returned an empty document")]
    Empty,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRequest<'a> {
    html: &'a str,
    template_id: Option<&'a str>,
    filename: &'a str,
}

/// The rendered PDF plus the name it should be downloaded under.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub filename: String,
    pub body: Bytes,
}

/// Posts rendered preview HTML to a server-side PDF renderer.
#[derive(Clone)]
pub struct PdfExporter {
    client: reqwest::Client,
    endpoint: Option<String>,
    timeout: Duration,
}

impl PdfExporter {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            endpoint,
            timeout,
        }
    }

    pub async fn export(&self, html: &str, template_id: Option<&str>) -> Result<ExportedPdf, ExportError> {
        let endpoint = self.endpoint.as_deref().ok_or(ExportError::NotConfigured)?;
        let filename = export_filename(chrono::Utc::now().timestamp_millis());
        let request = ExportRequest {
            html,
            template_id,
            filename: &filename,
        };

        let body = bounded(self.timeout, async {
            let response = self.client.post(endpoint).json(&request).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: endpoint.to_string(),
                });
            }
            Ok(response.bytes().await?)
        })
        .await?;

        if body.is_empty() {
            return Err(ExportError::Empty);
        }
        info!(filename = %filename, bytes = body.len(), "resume exported");
        Ok(ExportedPdf { filename, body })
    }
}

pub fn export_filename(millis: i64) -> String {
    format!("resume_{millis}.pdf")
}
