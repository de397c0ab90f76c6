mod branches;
mod conversations;
pub mod dto;
mod error;
mod files;
mod health;
mod identity;
mod rag;
mod summaries;

pub use branches::{conversation_branched_handler, conversations_branched_handler};
pub use conversations::{
    add_conversation_handler, add_version_handler, change_title_handler,
    conversation_add_message_handler, delete_conversation_handler, delete_version_handler,
    get_conversation_handler, list_conversations_handler, soft_delete_handler,
    switch_version_handler, update_conversation_handler, version_add_message_handler,
};
pub use error::{ErrorResponse, conversation_error_response, error_response, file_error_response};
pub use files::{delete_file_handler, file_events_handler, list_files_handler, upload_file_handler};
pub use health::{chat_root_handler, health_handler};
pub use identity::{AuthenticatedUser, USER_ID_HEADER, USER_ROLE_HEADER};
pub use rag::{process_file_handler, rag_query_handler};
pub use summaries::conversation_summaries_handler;
