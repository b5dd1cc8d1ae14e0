use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::editor::EditError;
use crate::sources::export::ExportError;
use crate::sources::optimize::OptimizeError;
use crate::sources::FetchError;
use crate::template::TemplateError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Stale result: {0}")]
    Stale(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::TemplateNotFound(id) => (
                StatusCode::NOT_FOUND,
                "TEMPLATE_NOT_FOUND",
                format!("No template with id '{id}'"),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Stale(msg) => (StatusCode::CONFLICT, "STALE_RESULT", msg.clone()),
            AppError::NotConfigured(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "NOT_CONFIGURED",
                msg.clone(),
            ),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "An upstream service failed".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

impl From<TemplateError> for AppError {
    fn from(e: TemplateError) -> Self {
        match e {
            TemplateError::NotFound(id) => AppError::TemplateNotFound(id),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<EditError> for AppError {
    fn from(e: EditError) -> Self {
        match e {
            EditError::Rejected(msg) => AppError::Internal(anyhow::anyhow!(msg)),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Missing(msg) => AppError::NotConfigured(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<OptimizeError> for AppError {
    fn from(e: OptimizeError) -> Self {
        match e {
            e @ OptimizeError::NotConfigured => AppError::NotConfigured(e.to_string()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        match e {
            e @ ExportError::NotConfigured => AppError::NotConfigured(e.to_string()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_not_found_maps_to_404() {
        let response = AppError::from(TemplateError::NotFound("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::from(TemplateError::InvalidColor("x".into())), StatusCode::BAD_REQUEST),
            (AppError::from(EditError::UnknownSection("x".into())), StatusCode::BAD_REQUEST),
            (AppError::from(OptimizeError::NotConfigured), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::from(OptimizeError::EmptyContent), StatusCode::BAD_GATEWAY),
            (AppError::from(ExportError::Empty), StatusCode::BAD_GATEWAY),
            (AppError::Stale("x".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
