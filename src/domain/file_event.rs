use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::message::store_precision;
use super::{FileId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventType {
    Upload,
    Delete,
    Access,
}

impl FileEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileEventType::Upload => "upload",
            FileEventType::Delete => "delete",
            FileEventType::Access => "access",
        }
    }
}

impl FromStr for FileEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(FileEventType::Upload),
            "delete" => Ok(FileEventType::Delete),
            "access" => Ok(FileEventType::Access),
            _ => Err(format!("Invalid file event type: {}", s)),
        }
    }
}

impl fmt::Display for FileEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileEvent {
    pub id: Uuid,
    pub event_type: FileEventType,
    pub file_id: Option<FileId>,
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
    pub extra: Option<String>,
}

impl FileEvent {
    pub fn new(event_type: FileEventType, file_id: FileId, user_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            file_id: Some(file_id),
            user_id,
            occurred_at: store_precision(Utc::now()),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }
}
