use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Conversation, ConversationId, Message, MessageId, UserId, Version, VersionId};

use super::{Page, RepositoryError, SummaryQuery};

/// A new version together with its initial messages, committed atomically
/// with the conversation's active version pointer.
#[derive(Debug, Clone)]
pub struct VersionCommit {
    pub version: Version,
    pub messages: Vec<Message>,
    /// Active version the caller based its decision on. The commit fails with
    /// [`RepositoryError::Conflict`] if the stored pointer has moved since.
    pub expected_active_version_id: Option<VersionId>,
    pub modified_at: DateTime<Utc>,
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create_conversation(&self, conversation: &Conversation)
    -> Result<(), RepositoryError>;

    /// Inserts a new conversation together with its first version and that
    /// version's messages, all or nothing. The version becomes active.
    async fn create_with_version(
        &self,
        conversation: &Conversation,
        commit: &VersionCommit,
    ) -> Result<(), RepositoryError>;

    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Non-deleted conversations of one owner, most recently modified first.
    async fn list_conversations(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<Conversation>, RepositoryError>;

    async fn query_summaries(
        &self,
        query: &SummaryQuery,
    ) -> Result<Page<Conversation>, RepositoryError>;

    /// Persists title, deletion marker and modification time. Never writes the
    /// summary or the active version.
    async fn update_conversation(&self, conversation: &Conversation)
    -> Result<(), RepositoryError>;

    /// Summary-only write. Leaves every other column, including modified_at,
    /// untouched.
    async fn store_summary(&self, id: ConversationId, summary: &str)
    -> Result<(), RepositoryError>;

    async fn list_unsummarized(&self) -> Result<Vec<ConversationId>, RepositoryError>;

    async fn list_modified_before(
        &self,
        cutoff: DateTime<Utc>,
        deleted_only: bool,
    ) -> Result<Vec<Conversation>, RepositoryError>;

    /// Removes the conversation with all of its versions and messages.
    async fn delete_conversation(&self, id: ConversationId) -> Result<(), RepositoryError>;

    async fn commit_version(&self, commit: &VersionCommit) -> Result<(), RepositoryError>;

    async fn switch_active_version(
        &self,
        conversation_id: ConversationId,
        expected_active_version_id: Option<VersionId>,
        target: VersionId,
        modified_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    async fn get_version(&self, id: VersionId) -> Result<Option<Version>, RepositoryError>;

    /// Versions of a conversation, oldest first.
    async fn list_versions(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Version>, RepositoryError>;

    /// Deletes a version and its messages. Versions that forked from it are
    /// kept with their parent and root message references cleared.
    ///
    /// Checked against the active pointer under the same lock that pointer
    /// writers take: deleting the active version fails with
    /// [`RepositoryError::Conflict`] and changes nothing.
    async fn delete_version(&self, id: VersionId) -> Result<(), RepositoryError>;

    /// Inserts the message and bumps the owning conversation's modified_at in
    /// one transaction. The stored creation time is the draft's, moved forward
    /// when needed to stay strictly after the version's last message.
    async fn append_message(&self, draft: &Message) -> Result<Message, RepositoryError>;

    async fn get_message(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;

    async fn list_messages(&self, version_id: VersionId) -> Result<Vec<Message>, RepositoryError>;

    async fn list_conversation_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError>;
}
