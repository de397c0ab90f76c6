mod branch_tree;
mod content_hash;
mod conversation;
mod conversation_id;
mod file_event;
mod file_upload;
mod fork;
mod message;
mod message_id;
mod message_role;
mod storage_path;
mod summary;
mod user;
mod version;
mod version_id;

pub use branch_tree::{BranchMessage, BranchNode, BranchTree};
pub use content_hash::ContentHash;
pub use conversation::{Conversation, DEFAULT_TITLE, MAX_TITLE_LENGTH, normalize_title};
pub use conversation_id::ConversationId;
pub use file_event::{FileEvent, FileEventType};
pub use file_upload::{FileId, FileUpload, MAX_FILENAME_LENGTH};
pub use fork::ForkPlan;
pub use message::{Message, next_message_timestamp, sort_messages, store_precision};
pub use message_id::MessageId;
pub use message_role::{MAX_ROLE_LENGTH, MessageRole};
pub use storage_path::{StoragePath, sanitize_filename};
pub use summary::{EMPTY_VERSION_SUMMARY, NO_ACTIVE_VERSION_SUMMARY, summarize};
pub use user::{Actor, UserId, UserRole};
pub use version::Version;
pub use version_id::VersionId;
