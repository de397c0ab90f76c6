use crate::application::ports::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("repository: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ConversationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => ConversationError::NotFound(what),
            RepositoryError::Conflict(what) => ConversationError::Conflict(what),
            other => ConversationError::Repository(other),
        }
    }
}
