use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::application::services::MessageDraft;
use crate::domain::{ConversationId, MessageId, VersionId};
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

use super::dto::{
    AddedMessageDto, ConversationDto, ForkRequest, MessageDto, MessageRequest,
    NewConversationRequest, TitleRequest, UpdateConversationRequest, VersionDto,
};
use super::error::conversation_error_response;
use super::identity::AuthenticatedUser;

pub async fn list_conversations_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Response {
    match state
        .conversation_service
        .list_conversations(user.user_id())
        .await
    {
        Ok(conversations) => {
            let body: Vec<ConversationDto> =
                conversations.iter().map(ConversationDto::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => conversation_error_response(e),
    }
}

#[tracing::instrument(skip(state, user, request), fields(messages = request.messages.len()))]
pub async fn add_conversation_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<NewConversationRequest>,
) -> Response {
    let messages: Vec<MessageDraft> = request.messages.into_iter().map(Into::into).collect();

    let service = &state.conversation_service;
    let opened = service
        .open_conversation(user.user_id(), request.title.as_deref(), messages)
        .await;

    match opened {
        Ok(conversation) => match service
            .conversation_detail(user.user_id(), conversation.id)
            .await
        {
            Ok(detail) => (StatusCode::CREATED, Json(ConversationDto::from(&detail))).into_response(),
            Err(e) => conversation_error_response(e),
        },
        Err(e) => conversation_error_response(e),
    }
}

pub async fn get_conversation_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Response {
    match state
        .conversation_service
        .conversation_detail(user.user_id(), ConversationId::from_uuid(id))
        .await
    {
        Ok(detail) => (StatusCode::OK, Json(ConversationDto::from(&detail))).into_response(),
        Err(e) => conversation_error_response(e),
    }
}

pub async fn update_conversation_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateConversationRequest>,
) -> Response {
    let service = &state.conversation_service;
    let id = ConversationId::from_uuid(id);
    let updated = service
        .update_conversation(
            user.user_id(),
            id,
            &request.title,
            request.active_version.map(VersionId::from_uuid),
        )
        .await;

    match updated {
        Ok(_) => match service.conversation_detail(user.user_id(), id).await {
            Ok(detail) => (StatusCode::OK, Json(ConversationDto::from(&detail))).into_response(),
            Err(e) => conversation_error_response(e),
        },
        Err(e) => conversation_error_response(e),
    }
}

pub async fn delete_conversation_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Response {
    match state
        .conversation_service
        .delete_conversation(user.user_id(), ConversationId::from_uuid(id))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => conversation_error_response(e),
    }
}

pub async fn change_title_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<TitleRequest>,
) -> Response {
    match state
        .conversation_service
        .change_title(user.user_id(), ConversationId::from_uuid(id), &request.title)
        .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => conversation_error_response(e),
    }
}

pub async fn soft_delete_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Response {
    match state
        .conversation_service
        .soft_delete(user.user_id(), ConversationId::from_uuid(id))
        .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => conversation_error_response(e),
    }
}

#[tracing::instrument(skip(state, user, request), fields(conversation_id = %id))]
pub async fn conversation_add_message_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Response {
    tracing::debug!(content = %sanitize_prompt(&request.content), "Adding message to active version");

    match state
        .conversation_service
        .append_to_active(
            user.user_id(),
            ConversationId::from_uuid(id),
            &request.content,
            &request.role,
        )
        .await
    {
        Ok(message) => (
            StatusCode::CREATED,
            Json(AddedMessageDto {
                message: MessageDto::from(&message),
                conversation_id: Some(id),
                version_id: None,
            }),
        )
            .into_response(),
        Err(e) => conversation_error_response(e),
    }
}

#[tracing::instrument(skip(state, user, request), fields(conversation_id = %id))]
pub async fn add_version_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ForkRequest>,
) -> Response {
    let service = &state.conversation_service;
    let conversation_id = ConversationId::from_uuid(id);

    let version = match service
        .fork_version(
            user.user_id(),
            conversation_id,
            MessageId::from_uuid(request.root_message_id),
        )
        .await
    {
        Ok(version) => version,
        Err(e) => return conversation_error_response(e),
    };

    match service
        .version_detail(user.user_id(), conversation_id, version.id)
        .await
    {
        Ok(detail) => (StatusCode::CREATED, Json(VersionDto::from(&detail))).into_response(),
        Err(e) => conversation_error_response(e),
    }
}

pub async fn switch_version_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, version_id)): Path<(Uuid, Uuid)>,
) -> Response {
    match state
        .conversation_service
        .switch_active_version(
            user.user_id(),
            ConversationId::from_uuid(id),
            VersionId::from_uuid(version_id),
        )
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => conversation_error_response(e),
    }
}

pub async fn delete_version_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, version_id)): Path<(Uuid, Uuid)>,
) -> Response {
    match state
        .conversation_service
        .delete_version(
            user.user_id(),
            ConversationId::from_uuid(id),
            VersionId::from_uuid(version_id),
        )
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => conversation_error_response(e),
    }
}

#[tracing::instrument(skip(state, user, request), fields(version_id = %id))]
pub async fn version_add_message_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Response {
    tracing::debug!(content = %sanitize_prompt(&request.content), "Adding message to version");

    match state
        .conversation_service
        .append_message(
            user.user_id(),
            VersionId::from_uuid(id),
            &request.content,
            &request.role,
        )
        .await
    {
        Ok(message) => (
            StatusCode::CREATED,
            Json(AddedMessageDto {
                message: MessageDto::from(&message),
                conversation_id: None,
                version_id: Some(id),
            }),
        )
            .into_response(),
        Err(e) => conversation_error_response(e),
    }
}
