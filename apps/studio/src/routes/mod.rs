pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Templates
        .route("/api/v1/templates", get(handlers::handle_list_templates))
        .route(
            "/api/v1/sections/:section/fields",
            get(handlers::handle_section_fields),
        )
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_close_session),
        )
        .route("/api/v1/sessions/:id/preview", get(handlers::handle_preview))
        .route(
            "/api/v1/sessions/:id/template",
            put(handlers::handle_set_template).delete(handlers::handle_reset_template),
        )
        .route("/api/v1/sessions/:id/color", put(handlers::handle_set_color))
        .route(
            "/api/v1/sessions/:id/fields",
            patch(handlers::handle_commit_field),
        )
        .route("/api/v1/sessions/:id/reload", post(handlers::handle_reload))
        .route("/api/v1/sessions/:id/save", post(handlers::handle_save))
        .route(
            "/api/v1/sessions/:id/optimize",
            post(handlers::handle_optimize),
        )
        .route("/api/v1/sessions/:id/export", get(handlers::handle_export))
        .with_state(state)
}
