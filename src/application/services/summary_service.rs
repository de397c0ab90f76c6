use std::sync::Arc;

use tracing::instrument;

use crate::application::ports::ConversationRepository;
use crate::domain::{Conversation, ConversationId, Message, summarize};

use super::ConversationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryBackfillReport {
    pub updated: usize,
    pub failed: usize,
}

/// Derives conversation summaries and owns the only write path to the
/// summary column.
///
/// Nothing here calls back into the conversation save path: summaries are
/// written with [`ConversationRepository::store_summary`], which does not
/// count as a conversation mutation.
#[derive(Clone)]
pub struct SummaryService {
    repository: Arc<dyn ConversationRepository>,
}

impl SummaryService {
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id))]
    pub async fn generate_summary(
        &self,
        conversation_id: ConversationId,
    ) -> Result<String, ConversationError> {
        let conversation = self.load(conversation_id).await?;
        let messages = self.active_messages(&conversation).await?;
        Ok(summarize(messages.as_deref()))
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id))]
    pub async fn update_summary(
        &self,
        conversation_id: ConversationId,
    ) -> Result<String, ConversationError> {
        let summary = self.generate_summary(conversation_id).await?;
        self.write_summary(conversation_id, &summary).await?;
        Ok(summary)
    }

    /// Summarizes every conversation that has no summary yet. One failing
    /// conversation is logged and skipped.
    #[instrument(skip(self))]
    pub async fn update_all_conversation_summaries(
        &self,
    ) -> Result<SummaryBackfillReport, ConversationError> {
        let pending = self.repository.list_unsummarized().await?;
        let mut report = SummaryBackfillReport::default();

        for conversation_id in pending {
            match self.update_summary(conversation_id).await {
                Ok(_) => report.updated += 1,
                Err(e) => {
                    tracing::warn!(
                        conversation_id = %conversation_id,
                        error = %e,
                        "Failed to update conversation summary, continuing"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            updated = report.updated,
            failed = report.failed,
            "Summary backfill finished"
        );

        Ok(report)
    }

    /// Runs after a conversation was saved through the normal path.
    ///
    /// Refreshes when the conversation has no summary yet or its active
    /// version holds at least one message.
    pub(crate) async fn refresh_after_save(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<String>, ConversationError> {
        let conversation = self.load(conversation_id).await?;
        let messages = self.active_messages(&conversation).await?;

        let missing = conversation.summary.as_deref().is_none_or(str::is_empty);
        let has_messages = messages.as_ref().is_some_and(|m| !m.is_empty());
        if !missing && !has_messages {
            return Ok(None);
        }

        let summary = summarize(messages.as_deref());
        self.write_summary(conversation.id, &summary).await?;
        Ok(Some(summary))
    }

    async fn write_summary(
        &self,
        conversation_id: ConversationId,
        summary: &str,
    ) -> Result<(), ConversationError> {
        self.repository
            .store_summary(conversation_id, summary)
            .await?;
        Ok(())
    }

    async fn load(&self, conversation_id: ConversationId) -> Result<Conversation, ConversationError> {
        self.repository
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| ConversationError::NotFound(format!("conversation {}", conversation_id)))
    }

    async fn active_messages(
        &self,
        conversation: &Conversation,
    ) -> Result<Option<Vec<Message>>, ConversationError> {
        match conversation.active_version_id {
            Some(version_id) => Ok(Some(self.repository.list_messages(version_id).await?)),
            None => Ok(None),
        }
    }
}
