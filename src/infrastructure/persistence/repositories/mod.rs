mod in_memory_conversation_repository;
mod in_memory_file_repository;
mod pg_conversation_repository;
mod pg_file_repository;

pub use in_memory_conversation_repository::InMemoryConversationRepository;
pub use in_memory_file_repository::InMemoryFileRepository;
pub use pg_conversation_repository::PgConversationRepository;
pub use pg_file_repository::PgFileRepository;

use crate::application::ports::RepositoryError;

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
