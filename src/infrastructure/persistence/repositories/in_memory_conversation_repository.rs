use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::application::ports::{
    ConversationRepository, Page, RepositoryError, SummaryOrdering, SummaryQuery, VersionCommit,
};
use crate::domain::{
    Conversation, ConversationId, Message, MessageId, UserId, Version, VersionId,
    next_message_timestamp, sort_messages, store_precision,
};

#[derive(Default)]
struct State {
    conversations: HashMap<ConversationId, Conversation>,
    versions: HashMap<VersionId, Version>,
    messages: HashMap<MessageId, Message>,
}

impl State {
    fn conversation_mut(&mut self, id: ConversationId) -> Result<&mut Conversation, RepositoryError> {
        self.conversations
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("conversation {}", id)))
    }

    fn messages_of(&self, version_id: VersionId) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .messages
            .values()
            .filter(|m| m.version_id == version_id)
            .cloned()
            .collect();
        sort_messages(&mut messages);
        messages
    }

    fn remove_version(&mut self, id: VersionId) {
        let owned: Vec<MessageId> = self
            .messages
            .values()
            .filter(|m| m.version_id == id)
            .map(|m| m.id)
            .collect();

        for version in self.versions.values_mut() {
            let roots_here = version
                .root_message_id
                .is_some_and(|root| owned.contains(&root));
            if version.parent_version_id == Some(id) || roots_here {
                version.parent_version_id = None;
                version.root_message_id = None;
            }
        }
        for message_id in owned {
            self.messages.remove(&message_id);
        }
        self.versions.remove(&id);
    }
}

/// Process-local repository. Every call holds one lock for its whole
/// duration, so multi-row writes are atomic.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    state: Mutex<State>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_search(conversation: &Conversation, needle: &str) -> bool {
    conversation.title.to_lowercase().contains(needle)
        || conversation
            .summary
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains(needle))
}

fn sort_summaries(conversations: &mut [Conversation], ordering: SummaryOrdering) {
    conversations.sort_by(|a, b| {
        let by_id = || a.id.as_uuid().cmp(&b.id.as_uuid());
        match ordering {
            SummaryOrdering::ModifiedAtAsc => a.modified_at.cmp(&b.modified_at).then_with(by_id),
            SummaryOrdering::ModifiedAtDesc => {
                b.modified_at.cmp(&a.modified_at).then_with(|| by_id().reverse())
            }
            SummaryOrdering::TitleAsc => a.title.cmp(&b.title).then_with(by_id),
            SummaryOrdering::TitleDesc => b.title.cmp(&a.title).then_with(|| by_id().reverse()),
        }
    });
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.conversations.contains_key(&conversation.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "conversation {} already exists",
                conversation.id
            )));
        }
        state.conversations.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn create_with_version(
        &self,
        conversation: &Conversation,
        commit: &VersionCommit,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.conversations.contains_key(&conversation.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "conversation {} already exists",
                conversation.id
            )));
        }
        let version = &commit.version;
        if version.conversation_id != conversation.id
            || commit.messages.iter().any(|m| m.version_id != version.id)
        {
            return Err(RepositoryError::ConstraintViolation(format!(
                "version {} does not belong to conversation {}",
                version.id, conversation.id
            )));
        }

        let mut stored = conversation.clone();
        stored.active_version_id = Some(version.id);
        stored.modified_at = stored.modified_at.max(commit.modified_at);
        state.conversations.insert(stored.id, stored);
        state.versions.insert(version.id, version.clone());
        for message in &commit.messages {
            state.messages.insert(message.id, message.clone());
        }
        Ok(())
    }

    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.state.lock().await.conversations.get(&id).cloned())
    }

    async fn list_conversations(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let state = self.state.lock().await;
        let mut conversations: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.is_owned_by(owner_id) && !c.is_deleted())
            .cloned()
            .collect();
        sort_summaries(&mut conversations, SummaryOrdering::ModifiedAtDesc);
        Ok(conversations)
    }

    async fn query_summaries(
        &self,
        query: &SummaryQuery,
    ) -> Result<Page<Conversation>, RepositoryError> {
        let needle = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let state = self.state.lock().await;
        let mut matching: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| !c.is_deleted())
            .filter(|c| query.owner_id.is_none_or(|owner| c.is_owned_by(owner)))
            .filter(|c| query.title.as_deref().is_none_or(|t| c.title == t))
            .filter(|c| needle.as_deref().is_none_or(|n| matches_search(c, n)))
            .cloned()
            .collect();
        sort_summaries(&mut matching, query.ordering);

        let count = matching.len();
        let results = matching
            .into_iter()
            .skip(query.page.offset())
            .take(query.page.limit())
            .collect();
        Ok(Page::new(query.page, count, results))
    }

    async fn update_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let stored = state.conversation_mut(conversation.id)?;
        stored.title = conversation.title.clone();
        stored.deleted_at = conversation.deleted_at;
        stored.modified_at = conversation.modified_at;
        Ok(())
    }

    async fn store_summary(&self, id: ConversationId, summary: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.conversation_mut(id)?.summary = Some(summary.to_string());
        Ok(())
    }

    async fn list_unsummarized(&self) -> Result<Vec<ConversationId>, RepositoryError> {
        let state = self.state.lock().await;
        let mut pending: Vec<&Conversation> = state
            .conversations
            .values()
            .filter(|c| c.summary.is_none())
            .collect();
        pending.sort_by_key(|c| (c.created_at, c.id.as_uuid()));
        Ok(pending.into_iter().map(|c| c.id).collect())
    }

    async fn list_modified_before(
        &self,
        cutoff: DateTime<Utc>,
        deleted_only: bool,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let state = self.state.lock().await;
        let mut stale: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.modified_at < cutoff && (!deleted_only || c.is_deleted()))
            .cloned()
            .collect();
        sort_summaries(&mut stale, SummaryOrdering::ModifiedAtAsc);
        Ok(stale)
    }

    async fn delete_conversation(&self, id: ConversationId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.conversation_mut(id)?.active_version_id = None;

        let versions: Vec<VersionId> = state
            .versions
            .values()
            .filter(|v| v.conversation_id == id)
            .map(|v| v.id)
            .collect();
        state
            .messages
            .retain(|_, m| !versions.contains(&m.version_id));
        state.versions.retain(|_, v| v.conversation_id != id);
        state.conversations.remove(&id);
        Ok(())
    }

    async fn commit_version(&self, commit: &VersionCommit) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let version = &commit.version;

        let conversation = state.conversation_mut(version.conversation_id)?;
        if conversation.active_version_id != commit.expected_active_version_id {
            return Err(RepositoryError::Conflict(format!(
                "active version of conversation {} changed",
                version.conversation_id
            )));
        }
        conversation.active_version_id = Some(version.id);
        conversation.modified_at = conversation.modified_at.max(commit.modified_at);

        state.versions.insert(version.id, version.clone());
        for message in &commit.messages {
            state.messages.insert(message.id, message.clone());
        }
        Ok(())
    }

    async fn switch_active_version(
        &self,
        conversation_id: ConversationId,
        expected_active_version_id: Option<VersionId>,
        target: VersionId,
        modified_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let conversation = state.conversation_mut(conversation_id)?;
        if conversation.active_version_id != expected_active_version_id {
            return Err(RepositoryError::Conflict(format!(
                "active version of conversation {} changed",
                conversation_id
            )));
        }
        conversation.active_version_id = Some(target);
        conversation.modified_at = conversation.modified_at.max(modified_at);
        Ok(())
    }

    async fn get_version(&self, id: VersionId) -> Result<Option<Version>, RepositoryError> {
        Ok(self.state.lock().await.versions.get(&id).cloned())
    }

    async fn list_versions(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Version>, RepositoryError> {
        let state = self.state.lock().await;
        let mut versions: Vec<Version> = state
            .versions
            .values()
            .filter(|v| v.conversation_id == conversation_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(versions)
    }

    async fn delete_version(&self, id: VersionId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let conversation_id = state
            .versions
            .get(&id)
            .map(|v| v.conversation_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("version {}", id)))?;

        let is_active = state
            .conversations
            .get(&conversation_id)
            .is_some_and(|c| c.active_version_id == Some(id));
        if is_active {
            return Err(RepositoryError::Conflict(format!(
                "version {} is the active version of conversation {}",
                id, conversation_id
            )));
        }

        state.remove_version(id);
        Ok(())
    }

    async fn append_message(&self, draft: &Message) -> Result<Message, RepositoryError> {
        let mut state = self.state.lock().await;

        let conversation_id = state
            .versions
            .get(&draft.version_id)
            .map(|v| v.conversation_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("version {}", draft.version_id)))?;

        let last = state
            .messages
            .values()
            .filter(|m| m.version_id == draft.version_id)
            .map(|m| m.created_at)
            .max();
        let message = Message {
            created_at: next_message_timestamp(last, draft.created_at),
            ..draft.clone()
        };
        state.messages.insert(message.id, message.clone());

        let conversation = state.conversation_mut(conversation_id)?;
        conversation.modified_at = conversation.modified_at.max(store_precision(Utc::now()));

        Ok(message)
    }

    async fn get_message(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        Ok(self.state.lock().await.messages.get(&id).cloned())
    }

    async fn list_messages(&self, version_id: VersionId) -> Result<Vec<Message>, RepositoryError> {
        Ok(self.state.lock().await.messages_of(version_id))
    }

    async fn list_conversation_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().await;
        let mut messages: Vec<Message> = state
            .messages
            .values()
            .filter(|m| {
                state
                    .versions
                    .get(&m.version_id)
                    .is_some_and(|v| v.conversation_id == conversation_id)
            })
            .cloned()
            .collect();
        sort_messages(&mut messages);
        Ok(messages)
    }
}
