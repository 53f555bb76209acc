use std::collections::BTreeMap;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::render::RenderFailure;
use crate::session::SessionError;
use crate::validation::ValidationFailure;

/// Where a client without an active record is sent to submit one.
pub const SUBMIT_PATH: &str = "/api/v1/resume";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("Render error: {0}")]
    Render(#[from] RenderFailure),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("No active resume for this session")]
    NoActiveRecord,

    #[error("Session store error: {0}")]
    Session(#[from] SessionError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields: Option<BTreeMap<String, String>> = None;

        let (status, code, message) = match self {
            AppError::Validation(failure) => {
                fields = Some(failure.errors);
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    "Some fields need attention".to_string(),
                )
            }
            AppError::Render(failure) => {
                tracing::error!(
                    format = %failure.format,
                    engine_class = %failure.engine_class,
                    "Render error: {}",
                    failure.message
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    format!("Could not generate the {} document", failure.format),
                )
            }
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Submission exceeds the allowed size".to_string(),
            ),
            AppError::NoActiveRecord => {
                return (
                    StatusCode::SEE_OTHER,
                    [(header::LOCATION, SUBMIT_PATH)],
                    Json(json!({
                        "error": {
                            "code": "NO_ACTIVE_RESUME",
                            "message": "Submit a resume first"
                        }
                    })),
                )
                    .into_response();
            }
            AppError::Session(e) => {
                tracing::error!("Session store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SESSION_ERROR",
                    "A session storage error occurred".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = match fields {
            Some(fields) => json!({
                "error": {
                    "code": code,
                    "message": message,
                    "fields": fields
                }
            }),
            None => json!({
                "error": {
                    "code": code,
                    "message": message
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::OutputFormat;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let mut errors = BTreeMap::new();
        errors.insert("email".to_string(), "Enter a valid email address.".to_string());
        let response = AppError::from(ValidationFailure { errors }).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["fields"]["email"], "Enter a valid email address.");
    }

    #[tokio::test]
    async fn test_render_error_hides_engine_detail() {
        let failure = RenderFailure::with_class(OutputFormat::Pdf, "printpdf::Error", "font table missing");
        let response = AppError::from(failure).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "RENDER_ERROR");
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("PDF"));
        assert!(!message.contains("font table"));
    }

    #[tokio::test]
    async fn test_no_active_record_redirects_to_submission() {
        let response = AppError::NoActiveRecord.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], SUBMIT_PATH);
    }

    #[tokio::test]
    async fn test_payload_too_large_status() {
        let response = AppError::PayloadTooLarge.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
        assert!(body["error"].get("fields").is_none());
    }
}
