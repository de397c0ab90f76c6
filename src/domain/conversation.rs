use chrono::{DateTime, Utc};

use super::message::store_precision;
use super::{ConversationId, UserId, VersionId};

pub const DEFAULT_TITLE: &str = "Mock title";
pub const MAX_TITLE_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub owner_id: UserId,
    pub title: String,
    pub summary: Option<String>,
    pub active_version_id: Option<VersionId>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn new(owner_id: UserId, title: String) -> Self {
        let now = store_precision(Utc::now());
        Self {
            id: ConversationId::new(),
            owner_id,
            title,
            summary: None,
            active_version_id: None,
            created_at: now,
            modified_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    pub fn touch(&mut self) {
        self.modified_at = store_precision(Utc::now()).max(self.modified_at);
    }

    pub fn soft_delete(&mut self) {
        self.touch();
        self.deleted_at = Some(self.modified_at);
    }
}

/// Normalizes a user supplied title, falling back to [`DEFAULT_TITLE`].
pub fn normalize_title(title: Option<&str>) -> Result<String, String> {
    let title = match title.map(str::trim) {
        None => return Ok(DEFAULT_TITLE.to_string()),
        Some("") => return Err("Title must not be empty".to_string()),
        Some(t) => t,
    };

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!("Title exceeds {} characters", MAX_TITLE_LENGTH));
    }

    Ok(title.to_string())
}
