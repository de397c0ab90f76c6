use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{FileStore, FileStoreError};
use crate::presentation::config::{StorageBackendSetting, StorageSettings};

use super::in_memory_store::InMemoryFileStore;
use super::local_store::LocalFileStore;

pub struct FileStoreFactory;

impl FileStoreFactory {
    pub fn create(settings: &StorageSettings) -> Result<Arc<dyn FileStore>, FileStoreError> {
        match settings.backend {
            StorageBackendSetting::Local => {
                let path = PathBuf::from(&settings.base_path);
                let store = LocalFileStore::new(path)?;
                Ok(Arc::new(store))
            }
            StorageBackendSetting::Memory => Ok(Arc::new(InMemoryFileStore::new())),
        }
    }
}
