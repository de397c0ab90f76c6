use std::sync::Arc;

use tracing::instrument;

use crate::domain::{Actor, FileId};

use super::file_service::{FileError, FileService, authorize};

/// Placeholder retrieval endpoints. Answers are canned strings built from
/// the request, no index is consulted.
#[derive(Clone)]
pub struct RetrievalService {
    files: Arc<FileService>,
}

impl RetrievalService {
    pub fn new(files: Arc<FileService>) -> Self {
        Self { files }
    }

    #[instrument(skip(self, query), fields(user_id = %actor.user_id))]
    pub async fn answer_query(&self, actor: &Actor, query: &str) -> Result<String, FileError> {
        authorize(actor)?;

        let query = query.trim();
        if query.is_empty() {
            return Err(FileError::Validation("Query must not be empty".to_string()));
        }

        Ok(format!("[RAG answer for query: {}]", query))
    }

    #[instrument(skip(self), fields(user_id = %actor.user_id, file_id = %file_id))]
    pub async fn process_file(&self, actor: &Actor, file_id: FileId) -> Result<String, FileError> {
        let upload = self.files.get(actor, file_id).await?;
        Ok(format!("[Processed file: {}]", upload.name))
    }
}
