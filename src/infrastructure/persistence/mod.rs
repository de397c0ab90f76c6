mod pg_pool;
mod repositories;
mod repository_factory;

pub use repositories::InMemoryConversationRepository;
pub use repositories::InMemoryFileRepository;
pub use repositories::PgConversationRepository;
pub use repositories::PgFileRepository;

pub use pg_pool::{create_pool, run_migrations};
pub use repository_factory::{Repositories, RepositoryFactory};
