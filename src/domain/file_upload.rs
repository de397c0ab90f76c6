use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::message::store_precision;
use super::storage_path::sanitize_filename;
use super::{ContentHash, StoragePath, UserId};

pub const MAX_FILENAME_LENGTH: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub id: FileId,
    pub uploader_id: UserId,
    pub name: String,
    pub size_bytes: u64,
    pub hash: ContentHash,
    pub storage_path: StoragePath,
    pub uploaded_at: DateTime<Utc>,
}

impl FileUpload {
    pub fn new(uploader_id: UserId, filename: &str, data: &[u8]) -> Self {
        let id = FileId::new();
        let name: String = sanitize_filename(filename)
            .chars()
            .take(MAX_FILENAME_LENGTH)
            .collect();

        Self {
            id,
            uploader_id,
            storage_path: StoragePath::new(&id, &name),
            name,
            size_bytes: data.len() as u64,
            hash: ContentHash::of(data),
            uploaded_at: store_precision(Utc::now()),
        }
    }
}
