use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ports::Page;
use crate::application::services::{
    ConversationDetail, ConversationSummaryView, MessageDraft, VersionDetail,
};
use crate::domain::{
    BranchMessage, BranchNode, BranchTree, Conversation, FileEvent, FileUpload, Message, MessageRole,
};

fn default_role() -> String {
    MessageRole::USER.to_string()
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    #[serde(default = "default_role")]
    pub role: String,
    pub content: String,
}

impl From<MessageRequest> for MessageDraft {
    fn from(r: MessageRequest) -> Self {
        MessageDraft::new(r.role, r.content)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewConversationRequest {
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<MessageRequest>,
}

#[derive(Debug, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConversationRequest {
    pub title: String,
    #[serde(default)]
    pub active_version: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ForkRequest {
    pub root_message_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RagQueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub version: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageDto {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id.as_uuid(),
            version: m.version_id.as_uuid(),
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VersionDto {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub parent_version: Option<Uuid>,
    pub root_message: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<MessageDto>,
}

impl From<&VersionDetail> for VersionDto {
    fn from(d: &VersionDetail) -> Self {
        Self {
            id: d.version.id.as_uuid(),
            conversation_id: d.version.conversation_id.as_uuid(),
            parent_version: d.version.parent_version_id.map(|v| v.as_uuid()),
            root_message: d.version.root_message_id.map(|m| m.as_uuid()),
            created_at: d.version.created_at,
            messages: d.messages.iter().map(MessageDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationDto {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub active_version: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<VersionDto>>,
}

impl From<&Conversation> for ConversationDto {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id.as_uuid(),
            title: c.title.clone(),
            summary: c.summary.clone(),
            active_version: c.active_version_id.map(|v| v.as_uuid()),
            created_at: c.created_at,
            modified_at: c.modified_at,
            deleted_at: c.deleted_at,
            versions: None,
        }
    }
}

impl From<&ConversationDetail> for ConversationDto {
    fn from(d: &ConversationDetail) -> Self {
        Self {
            versions: Some(d.versions.iter().map(VersionDto::from).collect()),
            ..ConversationDto::from(&d.conversation)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddedMessageDto {
    pub message: MessageDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BranchMessageDto {
    pub id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub shared: bool,
    pub branches: Vec<BranchNodeDto>,
}

impl From<&BranchMessage> for BranchMessageDto {
    fn from(m: &BranchMessage) -> Self {
        Self {
            id: m.message.id.as_uuid(),
            role: m.message.role.as_str().to_string(),
            content: m.message.content.clone(),
            created_at: m.message.created_at,
            shared: m.shared,
            branches: m.branches.iter().map(BranchNodeDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BranchNodeDto {
    pub version_id: Uuid,
    pub parent_version: Option<Uuid>,
    pub root_message: Option<Uuid>,
    pub is_active: bool,
    pub shared_prefix_len: usize,
    pub messages: Vec<BranchMessageDto>,
}

impl From<&BranchNode> for BranchNodeDto {
    fn from(n: &BranchNode) -> Self {
        Self {
            version_id: n.version_id.as_uuid(),
            parent_version: n.parent_version_id.map(|v| v.as_uuid()),
            root_message: n.root_message_id.map(|m| m.as_uuid()),
            is_active: n.is_active,
            shared_prefix_len: n.shared_prefix_len,
            messages: n.messages.iter().map(BranchMessageDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BranchTreeDto {
    pub conversation_id: Uuid,
    pub active_version: Option<Uuid>,
    pub root: Option<BranchNodeDto>,
    pub detached: Vec<BranchNodeDto>,
}

impl From<&BranchTree> for BranchTreeDto {
    fn from(t: &BranchTree) -> Self {
        Self {
            conversation_id: t.conversation_id.as_uuid(),
            active_version: t.active_version_id.map(|v| v.as_uuid()),
            root: t.root.as_ref().map(BranchNodeDto::from),
            detached: t.detached.iter().map(BranchNodeDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryDto {
    pub id: Uuid,
    pub user: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<ConversationSummaryView> for SummaryDto {
    fn from(v: ConversationSummaryView) -> Self {
        Self {
            id: v.id.as_uuid(),
            user: v.owner_id.as_uuid(),
            title: v.title,
            summary: v.summary,
            created_at: v.created_at,
            modified_at: v.modified_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileDto {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub hash: String,
    pub uploader: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

impl From<FileUpload> for FileDto {
    fn from(f: FileUpload) -> Self {
        Self {
            id: f.id.as_uuid(),
            name: f.name,
            size: f.size_bytes,
            hash: f.hash.as_str().to_string(),
            uploader: f.uploader_id.as_uuid(),
            uploaded_at: f.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileEventDto {
    pub id: Uuid,
    pub event_type: String,
    pub file: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub extra: Option<String>,
}

impl From<FileEvent> for FileEventDto {
    fn from(e: FileEvent) -> Self {
        Self {
            id: e.id,
            event_type: e.event_type.as_str().to_string(),
            file: e.file_id.map(|f| f.as_uuid()),
            occurred_at: e.occurred_at,
            extra: e.extra,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageDto<T> {
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub results: Vec<T>,
}

impl<T> PageDto<T> {
    pub fn from_page<U>(page: Page<U>, f: impl FnMut(U) -> T) -> Self {
        let page = page.map(f);
        Self {
            count: page.count,
            page: page.page,
            page_size: page.page_size,
            results: page.results,
        }
    }
}
