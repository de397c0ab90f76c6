use std::sync::Arc;

use crate::application::ports::{ConversationRepository, FileRepository, RepositoryError};
use crate::presentation::config::{DatabaseBackendSetting, DatabaseSettings};

use super::pg_pool::{create_pool, run_migrations};
use super::repositories::{
    InMemoryConversationRepository, InMemoryFileRepository, PgConversationRepository,
    PgFileRepository,
};

#[derive(Clone)]
pub struct Repositories {
    pub conversations: Arc<dyn ConversationRepository>,
    pub files: Arc<dyn FileRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            conversations: Arc::new(InMemoryConversationRepository::new()),
            files: Arc::new(InMemoryFileRepository::new()),
        }
    }
}

pub struct RepositoryFactory;

impl RepositoryFactory {
    pub async fn create(settings: &DatabaseSettings) -> Result<Repositories, RepositoryError> {
        match settings.backend {
            DatabaseBackendSetting::Memory => {
                tracing::warn!("Using in-memory repositories, data is lost on shutdown");
                Ok(Repositories::in_memory())
            }
            DatabaseBackendSetting::Postgres => {
                let pool = create_pool(&settings.url, settings.max_connections).await?;
                if settings.run_migrations {
                    run_migrations(&pool).await?;
                }
                Ok(Repositories {
                    conversations: Arc::new(PgConversationRepository::new(pool.clone())),
                    files: Arc::new(PgFileRepository::new(pool)),
                })
            }
        }
    }
}
