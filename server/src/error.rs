use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use audiobook_core::{PipelineError, VoiceError};
use doc_extract::ExtractError;

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Voice(#[from] VoiceError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Audiobook is still being generated")]
    NotReady,

    #[error("Audiobook generation failed: {0}")]
    JobFailed(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Extraction(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Voice(e @ (VoiceError::UnknownVoice { .. } | VoiceError::NoVoices)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Voice(e @ VoiceError::Load { .. }) => {
                tracing::error!("Voice load error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Pipeline(e) => {
                tracing::error!("Pipeline error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::NotReady => (
                StatusCode::CONFLICT,
                "Audiobook is still being generated".to_string(),
            ),
            ApiError::JobFailed(msg) => (
                StatusCode::GONE,
                format!("Audiobook generation failed: {msg}"),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
