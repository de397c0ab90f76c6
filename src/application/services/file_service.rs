use std::sync::Arc;

use bytes::Bytes;
use tracing::instrument;

use crate::application::ports::{
    FileQuery, FileRepository, FileStore, FileStoreError, Page, RepositoryError,
};
use crate::domain::{
    Actor, FileEvent, FileEventType, FileId, FileUpload, MAX_FILENAME_LENGTH, sanitize_filename,
};

pub const DUPLICATE_UPLOAD_MESSAGE: &str = "Duplicate file upload detected.";

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("storage: {0}")]
    Storage(#[from] FileStoreError),
}

#[derive(Clone)]
pub struct FileService {
    repository: Arc<dyn FileRepository>,
    store: Arc<dyn FileStore>,
}

impl FileService {
    pub fn new(repository: Arc<dyn FileRepository>, store: Arc<dyn FileStore>) -> Self {
        Self { repository, store }
    }

    #[instrument(skip(self, data), fields(user_id = %actor.user_id, size = data.len()))]
    pub async fn upload(
        &self,
        actor: &Actor,
        filename: &str,
        data: Bytes,
    ) -> Result<FileUpload, FileError> {
        authorize(actor)?;

        if data.is_empty() {
            return Err(FileError::Validation("The submitted file is empty".to_string()));
        }
        let name = sanitize_filename(filename);
        if name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(FileError::Validation(format!(
                "File name exceeds {} characters",
                MAX_FILENAME_LENGTH
            )));
        }

        let upload = FileUpload::new(actor.user_id, &name, &data);
        if self
            .repository
            .find_by_hash(actor.user_id, &upload.hash)
            .await?
            .is_some()
        {
            return Err(FileError::Duplicate(DUPLICATE_UPLOAD_MESSAGE.to_string()));
        }

        self.store.store(&upload.storage_path, data).await?;

        if let Err(e) = self.repository.create_upload(&upload).await {
            self.discard_blob(&upload).await;
            return Err(match e {
                RepositoryError::ConstraintViolation(_) => {
                    FileError::Duplicate(DUPLICATE_UPLOAD_MESSAGE.to_string())
                }
                other => other.into(),
            });
        }

        self.repository
            .record_event(&FileEvent::new(FileEventType::Upload, upload.id, actor.user_id))
            .await?;

        tracing::info!(file_id = %upload.id, hash = %upload.hash, "File uploaded");
        Ok(upload)
    }

    /// Lists the actor's files and records an access event for each returned
    /// file.
    #[instrument(skip(self, query), fields(user_id = %actor.user_id))]
    pub async fn list(&self, actor: &Actor, query: &FileQuery) -> Result<Page<FileUpload>, FileError> {
        authorize(actor)?;

        let page = self.repository.list_uploads(actor.user_id, query).await?;
        for upload in &page.results {
            self.repository
                .record_event(&FileEvent::new(FileEventType::Access, upload.id, actor.user_id))
                .await?;
        }

        Ok(page)
    }

    pub async fn get(&self, actor: &Actor, file_id: FileId) -> Result<FileUpload, FileError> {
        authorize(actor)?;

        self.repository
            .get_upload(file_id)
            .await?
            .filter(|upload| upload.uploader_id == actor.user_id)
            .ok_or_else(|| FileError::NotFound(file_id.to_string()))
    }

    #[instrument(skip(self), fields(user_id = %actor.user_id, file_id = %file_id))]
    pub async fn delete(&self, actor: &Actor, file_id: FileId) -> Result<(), FileError> {
        let upload = self.get(actor, file_id).await?;

        self.repository
            .record_event(&FileEvent::new(FileEventType::Delete, upload.id, actor.user_id))
            .await?;
        self.repository.delete_upload(upload.id).await?;
        self.discard_blob(&upload).await;

        tracing::info!("File deleted");
        Ok(())
    }

    pub async fn events(&self, actor: &Actor) -> Result<Vec<FileEvent>, FileError> {
        authorize(actor)?;
        Ok(self.repository.list_events(actor.user_id).await?)
    }

    async fn discard_blob(&self, upload: &FileUpload) {
        if let Err(e) = self.store.delete(&upload.storage_path).await {
            tracing::warn!(
                path = %upload.storage_path,
                error = %e,
                "Failed to remove stored file"
            );
        }
    }
}

pub(crate) fn authorize(actor: &Actor) -> Result<(), FileError> {
    if actor.role.can_manage_files() {
        Ok(())
    } else {
        Err(FileError::Forbidden(format!(
            "role {} may not manage files",
            actor.role
        )))
    }
}
