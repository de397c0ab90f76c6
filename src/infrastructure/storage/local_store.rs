use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};

use crate::application::ports::{FileStore, FileStoreError};
use crate::domain::StoragePath;

pub struct LocalFileStore {
    inner: Arc<LocalFileSystem>,
}

impl LocalFileStore {
    pub fn new(base_path: PathBuf) -> Result<Self, FileStoreError> {
        std::fs::create_dir_all(&base_path).map_err(FileStoreError::Io)?;
        let fs = LocalFileSystem::new_with_prefix(base_path)
            .map_err(|e| FileStoreError::UploadFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
        })
    }
}

fn not_found_or(e: object_store::Error, other: fn(String) -> FileStoreError) -> FileStoreError {
    match e {
        object_store::Error::NotFound { path, .. } => FileStoreError::NotFound(path),
        e => other(e.to_string()),
    }
}

#[async_trait::async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, path: &StoragePath, data: Bytes) -> Result<u64, FileStoreError> {
        let store_path = StorePath::from(path.as_str());
        let size = data.len() as u64;

        self.inner
            .put(&store_path, PutPayload::from(data))
            .await
            .map_err(|e| FileStoreError::UploadFailed(e.to_string()))?;

        Ok(size)
    }

    async fn fetch(&self, path: &StoragePath) -> Result<Vec<u8>, FileStoreError> {
        let store_path = StorePath::from(path.as_str());
        let result = self
            .inner
            .get(&store_path)
            .await
            .map_err(|e| not_found_or(e, FileStoreError::DownloadFailed))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| FileStoreError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), FileStoreError> {
        let store_path = StorePath::from(path.as_str());
        self.inner
            .delete(&store_path)
            .await
            .map_err(|e| not_found_or(e, FileStoreError::DeleteFailed))
    }

    async fn head(&self, path: &StoragePath) -> Result<u64, FileStoreError> {
        let store_path = StorePath::from(path.as_str());
        let meta = self
            .inner
            .head(&store_path)
            .await
            .map_err(|e| not_found_or(e, FileStoreError::DownloadFailed))?;
        Ok(meta.size as u64)
    }
}
