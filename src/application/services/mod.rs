mod conversation_error;
mod conversation_service;
mod file_service;
mod retrieval_service;
mod summary_service;

pub use conversation_error::ConversationError;
pub use conversation_service::{
    CleanupOptions, CleanupReport, ConversationDetail, ConversationService,
    ConversationSummaryView, DEFAULT_CLEANUP_DAYS, MAX_ACTIVE_VERSION_RETRIES, MessageDraft,
    VersionDetail,
};
pub use file_service::{DUPLICATE_UPLOAD_MESSAGE, FileError, FileService};
pub use retrieval_service::RetrievalService;
pub use summary_service::{SummaryBackfillReport, SummaryService};
