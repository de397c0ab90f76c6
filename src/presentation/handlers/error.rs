use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::{ConversationError, FileError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

pub fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
        .into_response()
}

pub fn conversation_error_response(err: ConversationError) -> Response {
    match err {
        ConversationError::NotFound(what) => {
            error_response(StatusCode::NOT_FOUND, format!("Not found: {}", what))
        }
        ConversationError::Validation(reason) => error_response(StatusCode::BAD_REQUEST, reason),
        ConversationError::Conflict(reason) => error_response(StatusCode::CONFLICT, reason),
        ConversationError::Repository(e) => {
            tracing::error!(error = %e, "Conversation storage failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

pub fn file_error_response(err: FileError) -> Response {
    match err {
        FileError::NotFound(what) => {
            error_response(StatusCode::NOT_FOUND, format!("File not found: {}", what))
        }
        FileError::Forbidden(_) => error_response(
            StatusCode::FORBIDDEN,
            "You do not have permission to perform this action.",
        ),
        FileError::Duplicate(reason) | FileError::Validation(reason) => {
            error_response(StatusCode::BAD_REQUEST, reason)
        }
        FileError::Repository(e) => {
            tracing::error!(error = %e, "File record storage failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        FileError::Storage(e) => {
            tracing::error!(error = %e, "File blob storage failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
