//! Error types for packet-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use packet_forms::PacketFormError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Form not found: {0}")]
    FormNotFound(String),

    #[error("Template file for form '{0}' is missing")]
    TemplateMissing(String),

    #[error("No saved progress for user '{user_id}' on form '{form}'")]
    ProgressNotFound { user_id: String, form: String },

    #[error("Nothing to fill")]
    NothingToFill,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Form(#[from] PacketFormError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::FormNotFound(_) => (StatusCode::NOT_FOUND, "FORM_NOT_FOUND", self.to_string()),
            ApiError::TemplateMissing(_) => {
                (StatusCode::NOT_FOUND, "TEMPLATE_MISSING", self.to_string())
            }
            ApiError::ProgressNotFound { .. } => {
                (StatusCode::NOT_FOUND, "PROGRESS_NOT_FOUND", self.to_string())
            }
            ApiError::NothingToFill => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NOTHING_TO_FILL",
                "Every field this form fills already has a value".to_string(),
            ),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone()),
            ApiError::Form(PacketFormError::InvalidBase64(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_BASE64", self.to_string())
            }
            ApiError::Form(PacketFormError::Parse(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_PDF", self.to_string())
            }
            ApiError::Form(e) => {
                tracing::error!("Form engine error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "FORM_ERROR",
                    "Could not process the document".to_string(),
                )
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
