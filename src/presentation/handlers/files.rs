use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::ports::{FileOrdering, FileQuery, PageRequest};
use crate::domain::FileId;
use crate::presentation::state::AppState;

use super::dto::{FileDto, FileEventDto, PageDto};
use super::error::{error_response, file_error_response};
use super::identity::AuthenticatedUser;

const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct FileParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub name: Option<String>,
    pub hash: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl From<FileParams> for FileQuery {
    fn from(p: FileParams) -> Self {
        FileQuery {
            name: p.name,
            hash: p.hash,
            search: p.search.map(|s| s.trim().to_string()),
            ordering: p
                .ordering
                .as_deref()
                .and_then(FileOrdering::parse)
                .unwrap_or_default(),
            page: PageRequest::new(p.page, p.page_size),
        }
    }
}

#[tracing::instrument(skip(state, user, multipart), fields(user_id = %user.user_id()))]
pub async fn upload_file_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                return error_response(StatusCode::BAD_REQUEST, "No file was submitted.");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart: {}", e),
                );
            }
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read uploaded file");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read file: {}", e),
                );
            }
        };

        return match state.file_service.upload(&user.0, &filename, data).await {
            Ok(upload) => (StatusCode::CREATED, Json(FileDto::from(upload))).into_response(),
            Err(e) => file_error_response(e),
        };
    }
}

pub async fn list_files_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<FileParams>,
) -> Response {
    let query = FileQuery::from(params);

    match state.file_service.list(&user.0, &query).await {
        Ok(page) => (StatusCode::OK, Json(PageDto::from_page(page, FileDto::from))).into_response(),
        Err(e) => file_error_response(e),
    }
}

pub async fn delete_file_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Response {
    match state
        .file_service
        .delete(&user.0, FileId::from_uuid(id))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => file_error_response(e),
    }
}

pub async fn file_events_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Response {
    match state.file_service.events(&user.0).await {
        Ok(events) => {
            let body: Vec<FileEventDto> = events.into_iter().map(FileEventDto::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => file_error_response(e),
    }
}
