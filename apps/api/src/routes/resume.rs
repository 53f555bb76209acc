use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::fields::ResumeFields;
use crate::render::OutputFormat;
use crate::resume::{build_record, ResumeRecord};
use crate::sanitize::filename::safe_filename;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";

/// Submitted form: the field map plus the hidden `hp` trap field.
#[derive(Debug, Deserialize)]
pub struct SubmissionForm {
    #[serde(flatten)]
    pub fields: ResumeFields,
    #[serde(default)]
    pub hp: String,
}

#[derive(Debug, Deserialize)]
pub struct RenderQuery {
    pub filename: Option<String>,
}

/// `None` when the header is absent; a present but malformed id is a client error.
fn session_from(headers: &HeaderMap) -> Result<Option<Uuid>, AppError> {
    let Some(raw) = headers.get(SESSION_HEADER) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .map(Some)
        .ok_or_else(|| AppError::BadRequest(format!("{SESSION_HEADER} must be a UUID")))
}

/// The record stored for the caller's session, if any.
async fn stored_record(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<(Uuid, Arc<ResumeRecord>)>, AppError> {
    let Some(session) = session_from(headers)? else {
        return Ok(None);
    };
    let record = state.sessions.get(session).await?;
    Ok(record.map(|r| (session, r)))
}

fn record_body(session: Uuid, record: &ResumeRecord) -> Value {
    json!({
        "session_id": session,
        "resume": record,
    })
}

/// POST /api/v1/resume
pub async fn handle_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SubmissionForm>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(form) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            warn!(limit = state.config.max_payload_bytes, "Submission over payload cap");
            AppError::PayloadTooLarge
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    })?;

    if !form.hp.is_empty() {
        warn!("Honeypot field filled, submission dropped");
        return Err(AppError::BadRequest("Invalid input.".to_string()));
    }

    let session = session_from(&headers)?.unwrap_or_else(Uuid::new_v4);
    let record = build_record(&form.fields)?;
    let body = record_body(session, &record);
    state.sessions.set(session, Arc::new(record)).await?;
    info!(%session, "Resume submitted");

    Ok((
        StatusCode::CREATED,
        [(SESSION_HEADER, session.to_string())],
        Json(body),
    )
        .into_response())
}

/// GET /api/v1/resume
pub async fn handle_get(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let (session, record) = stored_record(&state, &headers)
        .await?
        .ok_or_else(|| AppError::NotFound("No resume for this session".to_string()))?;
    Ok(Json(record_body(session, &record)))
}

/// DELETE /api/v1/resume
pub async fn handle_clear(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    if let Some(session) = session_from(&headers)? {
        state.sessions.clear(session).await?;
        info!(%session, "Resume cleared");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resume/render/:format?filename=stem
pub async fn handle_render(
    State(state): State<AppState>,
    Path(format): Path<String>,
    Query(query): Query<RenderQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let format = OutputFormat::from_code(&format)
        .ok_or_else(|| AppError::NotFound(format!("Unknown output format '{format}'")))?;
    let (session, record) = stored_record(&state, &headers)
        .await?
        .ok_or(AppError::NoActiveRecord)?;

    let stem = query
        .filename
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| record.name().to_string());
    let filename = safe_filename(&stem, format.extension());

    let renderers = state.renderers.clone();
    let artifact = tokio::task::spawn_blocking(move || renderers.render(format, &record))
        .await
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("render task failed")))??;

    let disposition = if format.is_attachment() {
        "attachment"
    } else {
        "inline"
    };
    info!(%session, %format, %filename, "Resume served");

    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("{disposition}; filename=\"{filename}\""),
            ),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        artifact.bytes,
    )
        .into_response())
}
