use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::domain::ConversationId;
use crate::presentation::state::AppState;

use super::dto::BranchTreeDto;
use super::error::conversation_error_response;
use super::identity::AuthenticatedUser;

pub async fn conversations_branched_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Response {
    match state
        .conversation_service
        .build_branch_trees(user.user_id())
        .await
    {
        Ok(trees) => {
            let body: Vec<BranchTreeDto> = trees.iter().map(BranchTreeDto::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => conversation_error_response(e),
    }
}

pub async fn conversation_branched_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Response {
    match state
        .conversation_service
        .build_branch_tree(user.user_id(), ConversationId::from_uuid(id))
        .await
    {
        Ok(tree) => (StatusCode::OK, Json(BranchTreeDto::from(&tree))).into_response(),
        Err(e) => conversation_error_response(e),
    }
}
