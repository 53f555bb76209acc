pub mod health;
pub mod resume;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_payload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Resume API
        .route(
            "/api/v1/resume",
            post(resume::handle_submit)
                .get(resume::handle_get)
                .delete(resume::handle_clear),
        )
        .route("/api/v1/resume/render/:format", get(resume::handle_render))
        .layer(body_limit)
        .with_state(state)
}
