use async_trait::async_trait;

use crate::domain::{ContentHash, FileEvent, FileId, FileUpload, UserId};

use super::{FileQuery, Page, RepositoryError};

#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Fails with [`RepositoryError::ConstraintViolation`] when the uploader
    /// already owns a file with the same hash.
    async fn create_upload(&self, upload: &FileUpload) -> Result<(), RepositoryError>;

    async fn find_by_hash(
        &self,
        uploader_id: UserId,
        hash: &ContentHash,
    ) -> Result<Option<FileUpload>, RepositoryError>;

    async fn get_upload(&self, id: FileId) -> Result<Option<FileUpload>, RepositoryError>;

    async fn list_uploads(
        &self,
        uploader_id: UserId,
        query: &FileQuery,
    ) -> Result<Page<FileUpload>, RepositoryError>;

    /// Deletes the record; events that referenced it keep existing without a file.
    async fn delete_upload(&self, id: FileId) -> Result<(), RepositoryError>;

    async fn record_event(&self, event: &FileEvent) -> Result<(), RepositoryError>;

    /// Events recorded for a user, newest first.
    async fn list_events(&self, user_id: UserId) -> Result<Vec<FileEvent>, RepositoryError>;
}
