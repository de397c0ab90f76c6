use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::FileId;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

use super::dto::RagQueryRequest;
use super::error::file_error_response;
use super::identity::AuthenticatedUser;

#[derive(Serialize)]
pub struct RagAnswerResponse {
    pub answer: String,
}

#[derive(Serialize)]
pub struct ProcessFileResponse {
    pub result: String,
}

#[tracing::instrument(skip(state, user, request))]
pub async fn rag_query_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<RagQueryRequest>,
) -> Response {
    tracing::debug!(query = %sanitize_prompt(&request.query), "RAG query");

    match state
        .retrieval_service
        .answer_query(&user.0, &request.query)
        .await
    {
        Ok(answer) => (StatusCode::OK, Json(RagAnswerResponse { answer })).into_response(),
        Err(e) => file_error_response(e),
    }
}

pub async fn process_file_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Response {
    match state
        .retrieval_service
        .process_file(&user.0, FileId::from_uuid(id))
        .await
    {
        Ok(result) => (StatusCode::OK, Json(ProcessFileResponse { result })).into_response(),
        Err(e) => file_error_response(e),
    }
}
