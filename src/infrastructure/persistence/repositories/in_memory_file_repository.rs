use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::{FileOrdering, FileQuery, FileRepository, Page, RepositoryError};
use crate::domain::{ContentHash, FileEvent, FileId, FileUpload, UserId};

#[derive(Default)]
struct State {
    uploads: HashMap<FileId, FileUpload>,
    events: Vec<FileEvent>,
}

#[derive(Default)]
pub struct InMemoryFileRepository {
    state: Mutex<State>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_uploads(uploads: &mut [FileUpload], ordering: FileOrdering) {
    uploads.sort_by(|a, b| {
        let by_id = || a.id.as_uuid().cmp(&b.id.as_uuid());
        match ordering {
            FileOrdering::UploadedAtAsc => a.uploaded_at.cmp(&b.uploaded_at).then_with(by_id),
            FileOrdering::UploadedAtDesc => b
                .uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| by_id().reverse()),
            FileOrdering::NameAsc => a.name.cmp(&b.name).then_with(by_id),
            FileOrdering::NameDesc => b.name.cmp(&a.name).then_with(|| by_id().reverse()),
            FileOrdering::SizeAsc => a.size_bytes.cmp(&b.size_bytes).then_with(by_id),
            FileOrdering::SizeDesc => b
                .size_bytes
                .cmp(&a.size_bytes)
                .then_with(|| by_id().reverse()),
        }
    });
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn create_upload(&self, upload: &FileUpload) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let duplicate = state
            .uploads
            .values()
            .any(|u| u.uploader_id == upload.uploader_id && u.hash == upload.hash);
        if duplicate {
            return Err(RepositoryError::ConstraintViolation(format!(
                "file with hash {} already uploaded",
                upload.hash
            )));
        }
        state.uploads.insert(upload.id, upload.clone());
        Ok(())
    }

    async fn find_by_hash(
        &self,
        uploader_id: UserId,
        hash: &ContentHash,
    ) -> Result<Option<FileUpload>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .uploads
            .values()
            .find(|u| u.uploader_id == uploader_id && &u.hash == hash)
            .cloned())
    }

    async fn get_upload(&self, id: FileId) -> Result<Option<FileUpload>, RepositoryError> {
        Ok(self.state.lock().await.uploads.get(&id).cloned())
    }

    async fn list_uploads(
        &self,
        uploader_id: UserId,
        query: &FileQuery,
    ) -> Result<Page<FileUpload>, RepositoryError> {
        let needle = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let state = self.state.lock().await;
        let mut matching: Vec<FileUpload> = state
            .uploads
            .values()
            .filter(|u| u.uploader_id == uploader_id)
            .filter(|u| query.name.as_deref().is_none_or(|n| u.name == n))
            .filter(|u| {
                query
                    .hash
                    .as_deref()
                    .is_none_or(|h| u.hash.as_str().eq_ignore_ascii_case(h))
            })
            .filter(|u| {
                needle
                    .as_deref()
                    .is_none_or(|n| u.name.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        sort_uploads(&mut matching, query.ordering);

        let count = matching.len();
        let results = matching
            .into_iter()
            .skip(query.page.offset())
            .take(query.page.limit())
            .collect();
        Ok(Page::new(query.page, count, results))
    }

    async fn delete_upload(&self, id: FileId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.uploads.remove(&id).is_none() {
            return Err(RepositoryError::NotFound(format!("file {}", id)));
        }
        for event in state.events.iter_mut().filter(|e| e.file_id == Some(id)) {
            event.file_id = None;
        }
        Ok(())
    }

    async fn record_event(&self, event: &FileEvent) -> Result<(), RepositoryError> {
        self.state.lock().await.events.push(event.clone());
        Ok(())
    }

    async fn list_events(&self, user_id: UserId) -> Result<Vec<FileEvent>, RepositoryError> {
        let state = self.state.lock().await;
        let mut events: Vec<FileEvent> = state
            .events
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(events)
    }
}
