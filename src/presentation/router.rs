use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    add_conversation_handler, add_version_handler, change_title_handler, chat_root_handler,
    conversation_add_message_handler, conversation_branched_handler,
    conversation_summaries_handler, conversations_branched_handler, delete_conversation_handler,
    delete_file_handler, delete_version_handler, file_events_handler, get_conversation_handler,
    health_handler, list_conversations_handler, list_files_handler, process_file_handler,
    rag_query_handler, soft_delete_handler, switch_version_handler, update_conversation_handler,
    upload_file_handler, version_add_message_handler,
};
use crate::presentation::state::AppState;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/chat/", get(chat_root_handler))
        .route("/chat/conversations/", get(list_conversations_handler))
        .route("/chat/conversations_branched/", get(conversations_branched_handler))
        .route(
            "/chat/conversation_branched/{id}/",
            get(conversation_branched_handler),
        )
        .route("/chat/conversations/add/", post(add_conversation_handler))
        .route(
            "/chat/conversations/{id}/",
            get(get_conversation_handler)
                .put(update_conversation_handler)
                .delete(delete_conversation_handler),
        )
        .route(
            "/chat/conversations/{id}/change_title/",
            put(change_title_handler),
        )
        .route("/chat/conversations/{id}/delete/", put(soft_delete_handler))
        .route(
            "/chat/conversations/{id}/add_message/",
            post(conversation_add_message_handler),
        )
        .route("/chat/conversations/{id}/add_version/", post(add_version_handler))
        .route(
            "/chat/conversations/{id}/switch_version/{version_id}/",
            put(switch_version_handler),
        )
        .route(
            "/chat/conversations/{id}/versions/{version_id}/",
            delete(delete_version_handler),
        )
        .route("/chat/versions/{id}/add_message/", post(version_add_message_handler))
        .route(
            "/chat/api/conversations/summaries/",
            get(conversation_summaries_handler),
        )
        .route(
            "/chat/api/files/upload/",
            post(upload_file_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/chat/api/files/", get(list_files_handler))
        .route("/chat/api/files/events/", get(file_events_handler))
        .route("/chat/api/files/{id}/delete/", delete(delete_file_handler))
        .route("/chat/api/files/{id}/process/", post(process_file_handler))
        .route("/chat/api/rag/query/", post(rag_query_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
