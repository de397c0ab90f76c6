mod conversation_repository;
mod file_repository;
mod file_store;
mod pagination;
mod repository_error;

pub use conversation_repository::{ConversationRepository, VersionCommit};
pub use file_repository::FileRepository;
pub use file_store::{FileStore, FileStoreError};
pub use pagination::{
    DEFAULT_PAGE_SIZE, FileOrdering, FileQuery, MAX_PAGE_SIZE, Page, PageRequest, SummaryOrdering,
    SummaryQuery,
};
pub use repository_error::RepositoryError;
