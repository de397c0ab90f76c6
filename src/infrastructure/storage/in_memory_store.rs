use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::application::ports::{FileStore, FileStoreError};
use crate::domain::StoragePath;

#[derive(Default)]
pub struct InMemoryFileStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl FileStore for InMemoryFileStore {
    async fn store(&self, path: &StoragePath, data: Bytes) -> Result<u64, FileStoreError> {
        let size = data.len() as u64;
        self.blobs
            .write()
            .await
            .insert(path.as_str().to_string(), data);
        Ok(size)
    }

    async fn fetch(&self, path: &StoragePath) -> Result<Vec<u8>, FileStoreError> {
        self.blobs
            .read()
            .await
            .get(path.as_str())
            .map(|b| b.to_vec())
            .ok_or_else(|| FileStoreError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), FileStoreError> {
        self.blobs
            .write()
            .await
            .remove(path.as_str())
            .map(|_| ())
            .ok_or_else(|| FileStoreError::NotFound(path.to_string()))
    }

    async fn head(&self, path: &StoragePath) -> Result<u64, FileStoreError> {
        self.blobs
            .read()
            .await
            .get(path.as_str())
            .map(|b| b.len() as u64)
            .ok_or_else(|| FileStoreError::NotFound(path.to_string()))
    }
}
