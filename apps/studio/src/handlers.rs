use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::controller::SessionSnapshot;
use crate::editor::{form_fields, FieldCommit, FormField};
use crate::errors::AppError;
use crate::models::template::TemplateDescriptor;
use crate::render::RenderReport;
use crate::state::{AppState, Session};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub resume_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTemplateRequest {
    pub template_id: String,
}

#[derive(Deserialize)]
pub struct SetColorRequest {
    pub color: String,
}

#[derive(Deserialize)]
pub struct OptimizeRequest {
    pub instruction: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub session: SessionSnapshot,
}

#[derive(Serialize)]
pub struct RenderResponse {
    pub render: RenderReport,
    pub session: SessionSnapshot,
}

#[derive(Serialize)]
pub struct OptimizeResponse {
    pub render: RenderReport,
    pub session: SessionSnapshot,
    pub suggestions: Vec<String>,
    pub explanation: Option<String>,
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Session, AppError> {
    state
        .session(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))
}

/// Resume ids are placed into upstream URL paths.
fn is_valid_resume_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

/// GET /api/v1/templates
pub async fn handle_list_templates(State(state): State<AppState>) -> Json<Vec<TemplateDescriptor>> {
    Json(state.templates().await)
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let resume_id = req.resume_id.trim();
    if !is_valid_resume_id(resume_id) {
        return Err(AppError::Validation(
            "resumeId must be 1-64 letters, digits, '-' or '_'".to_string(),
        ));
    }
    let (session_id, session) = state.open_session(resume_id).await;

    let ticket = session.lock().await.begin_change();
    let loaded = state.resumes.load(resume_id).await;
    let mut controller = session.lock().await;
    controller.apply_loaded(ticket, loaded).await;
    info!(%session_id, resume_id, "session opened");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            session: controller.snapshot(),
        }),
    ))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    let controller = session.lock().await;
    Ok(Json(controller.snapshot()))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.close_session(id).await {
        return Err(AppError::NotFound(format!("session {id}")));
    }
    info!(session_id = %id, "session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/sessions/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let session = find_session(&state, id).await?;
    let controller = session.lock().await;
    Ok(Html(controller.preview_html()))
}

/// PUT /api/v1/sessions/:id/template
pub async fn handle_set_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetTemplateRequest>,
) -> Result<Json<RenderResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut controller = session.lock().await;
    let render = controller.set_template(req.template_id.trim()).await?;
    Ok(Json(RenderResponse {
        render,
        session: controller.snapshot(),
    }))
}

/// DELETE /api/v1/sessions/:id/template
pub async fn handle_reset_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut controller = session.lock().await;
    let render = controller.reset_template();
    Ok(Json(RenderResponse {
        render,
        session: controller.snapshot(),
    }))
}

/// PUT /api/v1/sessions/:id/color
pub async fn handle_set_color(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetColorRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    let mut controller = session.lock().await;
    controller.set_color(&req.color)?;
    Ok(Json(controller.snapshot()))
}

/// PATCH /api/v1/sessions/:id/fields
pub async fn handle_commit_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(commit): Json<FieldCommit>,
) -> Result<Json<RenderResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut controller = session.lock().await;
    let render = controller.commit(&commit)?;
    Ok(Json(RenderResponse {
        render,
        session: controller.snapshot(),
    }))
}

/// GET /api/v1/sections/:section/fields
pub async fn handle_section_fields(
    Path(section): Path<String>,
) -> Result<Json<&'static [FormField]>, AppError> {
    form_fields(&section)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("section {section}")))
}

/// POST /api/v1/sessions/:id/reload
pub async fn handle_reload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let (ticket, resume_id) = {
        let mut controller = session.lock().await;
        (controller.begin_change(), controller.resume_id().to_string())
    };
    let loaded = state.resumes.load(&resume_id).await;

    let mut controller = session.lock().await;
    let render = controller
        .apply_loaded(ticket, loaded)
        .await
        .ok_or_else(|| AppError::Stale("the resume changed while it was being reloaded".to_string()))?;
    Ok(Json(RenderResponse {
        render,
        session: controller.snapshot(),
    }))
}

/// POST /api/v1/sessions/:id/save
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let session = find_session(&state, id).await?;
    let (resume_id, doc, generation) = {
        let controller = session.lock().await;
        (
            controller.resume_id().to_string(),
            controller.document().clone(),
            controller.generation(),
        )
    };
    state.resumes.save(&resume_id, &doc).await?;
    info!(%id, resume_id = %resume_id, generation, "resume saved");
    Ok(Json(json!({ "saved": true, "resumeId": resume_id, "generation": generation })))
}

/// POST /api/v1/sessions/:id/optimize
pub async fn handle_optimize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let (ticket, content) = {
        let mut controller = session.lock().await;
        (controller.begin_change(), controller.document().to_value())
    };
    let outcome = state.optimizer.optimize(&req.instruction, &content).await?;

    let mut controller = session.lock().await;
    let render = controller
        .apply_optimized(ticket, &outcome.overlay)
        .ok_or_else(|| AppError::Stale("the resume changed while it was being optimized".to_string()))?;
    Ok(Json(OptimizeResponse {
        render,
        session: controller.snapshot(),
        suggestions: outcome.suggestions,
        explanation: outcome.explanation,
    }))
}

/// GET /api/v1/sessions/:id/export
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, id).await?;
    let (html, template_id) = {
        let controller = session.lock().await;
        (
            controller.preview_html(),
            controller.active_template_id().map(str::to_string),
        )
    };
    let pdf = state.exporter.export(&html, template_id.as_deref()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", pdf.filename),
            ),
        ],
        pdf.body,
    ))
}
