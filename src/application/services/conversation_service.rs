use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::instrument;

use crate::application::ports::{
    ConversationRepository, Page, RepositoryError, SummaryQuery, VersionCommit,
};
use crate::domain::{
    BranchTree, Conversation, ConversationId, ForkPlan, Message, MessageId, MessageRole, UserId,
    Version, VersionId, next_message_timestamp, normalize_title, store_precision,
};

use super::{ConversationError, SummaryService};

pub const MAX_ACTIVE_VERSION_RETRIES: usize = 3;
pub const DEFAULT_CLEANUP_DAYS: i64 = 30;
const CLEANUP_EXAMPLES: usize = 5;
const ACTIVE_VERSION_DELETE_MESSAGE: &str =
    "Cannot delete the active version, switch to another version first";

/// A message supplied by a client before it is stamped and stored.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub role: String,
    pub content: String,
}

impl MessageDraft {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VersionDetail {
    pub version: Version,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub versions: Vec<VersionDetail>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummaryView {
    pub id: ConversationId,
    pub owner_id: UserId,
    pub title: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationSummaryView {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id,
            owner_id: conversation.owner_id,
            title: conversation.title,
            summary: conversation.summary,
            created_at: conversation.created_at,
            modified_at: conversation.modified_at,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CleanupOptions {
    pub older_than_days: i64,
    pub deleted_only: bool,
    pub dry_run: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            older_than_days: DEFAULT_CLEANUP_DAYS,
            deleted_only: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub matched: usize,
    pub deleted: usize,
    pub failed: usize,
    pub examples: Vec<Conversation>,
}

#[derive(Clone)]
pub struct ConversationService {
    repository: Arc<dyn ConversationRepository>,
    summaries: SummaryService,
}

impl ConversationService {
    pub fn new(repository: Arc<dyn ConversationRepository>, summaries: SummaryService) -> Self {
        Self {
            repository,
            summaries,
        }
    }

    pub fn summaries(&self) -> &SummaryService {
        &self.summaries
    }

    #[instrument(skip(self, title), fields(owner_id = %owner_id))]
    pub async fn create_conversation(
        &self,
        owner_id: UserId,
        title: Option<&str>,
    ) -> Result<Conversation, ConversationError> {
        let title = normalize_title(title).map_err(ConversationError::Validation)?;
        let conversation = Conversation::new(owner_id, title);

        self.repository.create_conversation(&conversation).await?;
        self.refresh_summary(conversation.id).await?;

        tracing::info!(conversation_id = %conversation.id, "Conversation created");
        self.load(conversation.id).await
    }

    /// Creates a conversation with an active root version holding the given
    /// messages in order. Nothing is stored unless every draft is valid and
    /// the whole write succeeds.
    #[instrument(skip(self, title, messages), fields(owner_id = %owner_id, messages = messages.len()))]
    pub async fn open_conversation(
        &self,
        owner_id: UserId,
        title: Option<&str>,
        messages: Vec<MessageDraft>,
    ) -> Result<Conversation, ConversationError> {
        let roles = messages
            .iter()
            .map(validate_draft)
            .collect::<Result<Vec<_>, _>>()?;
        let title = normalize_title(title).map_err(ConversationError::Validation)?;

        let conversation = Conversation::new(owner_id, title);
        let version = Version::root(conversation.id);
        let now = Utc::now();
        let mut previous = None;
        let stamped = messages
            .into_iter()
            .zip(roles)
            .map(|(draft, role)| {
                let mut message = Message::new(version.id, role, draft.content);
                message.created_at = next_message_timestamp(previous, now);
                previous = Some(message.created_at);
                message
            })
            .collect::<Vec<_>>();
        let commit = VersionCommit {
            version,
            messages: stamped,
            expected_active_version_id: None,
            modified_at: previous.unwrap_or(conversation.modified_at),
        };

        self.repository
            .create_with_version(&conversation, &commit)
            .await?;
        self.refresh_summary(conversation.id).await?;

        tracing::info!(
            conversation_id = %conversation.id,
            version_id = %commit.version.id,
            "Conversation opened"
        );
        self.load(conversation.id).await
    }

    /// Creates the parentless version of a conversation that has none yet and
    /// makes it active.
    #[instrument(skip(self), fields(conversation_id = %conversation_id))]
    pub async fn start_version(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<Version, ConversationError> {
        let conversation = self.owned(owner_id, conversation_id).await?;
        if conversation.active_version_id.is_some() {
            return Err(ConversationError::Validation(
                "Conversation already has an active version".to_string(),
            ));
        }

        let version = Version::root(conversation.id);
        let commit = VersionCommit {
            version: version.clone(),
            messages: Vec::new(),
            expected_active_version_id: None,
            modified_at: store_precision(Utc::now()).max(conversation.modified_at),
        };
        self.repository.commit_version(&commit).await?;
        self.refresh_summary(conversation.id).await?;

        Ok(version)
    }

    #[instrument(skip(self, content), fields(version_id = %version_id, role = %role))]
    pub async fn append_message(
        &self,
        owner_id: UserId,
        version_id: VersionId,
        content: &str,
        role: &str,
    ) -> Result<Message, ConversationError> {
        let draft = MessageDraft::new(role, content);
        let role = validate_draft(&draft)?;

        let version = self
            .repository
            .get_version(version_id)
            .await?
            .ok_or_else(|| ConversationError::NotFound(format!("version {}", version_id)))?;
        let conversation = self.owned(owner_id, version.conversation_id).await?;

        let stored = self
            .repository
            .append_message(&Message::new(version.id, role, draft.content))
            .await?;
        self.refresh_summary(conversation.id).await?;

        tracing::debug!(
            message_id = %stored.id,
            content_len = stored.content.len(),
            "Message appended"
        );

        Ok(stored)
    }

    #[instrument(skip(self, content), fields(conversation_id = %conversation_id))]
    pub async fn append_to_active(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
        content: &str,
        role: &str,
    ) -> Result<Message, ConversationError> {
        let conversation = self.owned(owner_id, conversation_id).await?;
        let version_id = conversation.active_version_id.ok_or_else(|| {
            ConversationError::Validation(
                "Active version not set for this conversation".to_string(),
            )
        })?;

        self.append_message(owner_id, version_id, content, role)
            .await
    }

    /// Branches the conversation at `root_message_id` and activates the new
    /// version.
    #[instrument(skip(self), fields(conversation_id = %conversation_id, root_message_id = %root_message_id))]
    pub async fn fork_version(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
        root_message_id: MessageId,
    ) -> Result<Version, ConversationError> {
        for attempt in 1..=MAX_ACTIVE_VERSION_RETRIES {
            let conversation = self.owned(owner_id, conversation_id).await?;
            let active_version_id = conversation.active_version_id.ok_or_else(|| {
                ConversationError::Validation(
                    "Conversation has no active version to fork from".to_string(),
                )
            })?;

            let root_message = self
                .repository
                .get_message(root_message_id)
                .await?
                .ok_or_else(|| {
                    ConversationError::NotFound(format!("message {}", root_message_id))
                })?;
            let root_version = self
                .repository
                .get_version(root_message.version_id)
                .await?
                .ok_or_else(|| {
                    ConversationError::NotFound(format!("version {}", root_message.version_id))
                })?;
            if root_version.conversation_id != conversation.id {
                return Err(ConversationError::Validation(
                    "Root message does not belong to this conversation".to_string(),
                ));
            }

            let source = self.repository.list_messages(root_version.id).await?;
            let plan = ForkPlan::new(conversation.id, &root_message, &source);
            let commit = VersionCommit {
                version: plan.version.clone(),
                messages: plan.copies,
                expected_active_version_id: Some(active_version_id),
                modified_at: store_precision(Utc::now()).max(conversation.modified_at),
            };

            match self.repository.commit_version(&commit).await {
                Ok(()) => {
                    self.refresh_summary(conversation.id).await?;
                    tracing::info!(
                        version_id = %plan.version.id,
                        copied = commit.messages.len(),
                        "Version forked"
                    );
                    return Ok(plan.version);
                }
                Err(RepositoryError::Conflict(reason)) => {
                    tracing::warn!(attempt, reason = %reason, "Active version moved during fork, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ConversationError::Conflict(
            "Active version kept changing while forking".to_string(),
        ))
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id, version_id = %version_id))]
    pub async fn switch_active_version(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
        version_id: VersionId,
    ) -> Result<(), ConversationError> {
        for attempt in 1..=MAX_ACTIVE_VERSION_RETRIES {
            let conversation = self.owned(owner_id, conversation_id).await?;
            self.version_of(&conversation, version_id).await?;

            let modified_at = store_precision(Utc::now()).max(conversation.modified_at);
            match self
                .repository
                .switch_active_version(
                    conversation.id,
                    conversation.active_version_id,
                    version_id,
                    modified_at,
                )
                .await
            {
                Ok(()) => {
                    self.refresh_summary(conversation.id).await?;
                    return Ok(());
                }
                Err(RepositoryError::Conflict(reason)) => {
                    tracing::warn!(attempt, reason = %reason, "Active version moved during switch, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ConversationError::Conflict(
            "Active version kept changing while switching".to_string(),
        ))
    }

    #[instrument(skip(self, title), fields(conversation_id = %conversation_id))]
    pub async fn change_title(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
        title: &str,
    ) -> Result<Conversation, ConversationError> {
        let title = normalize_title(Some(title)).map_err(ConversationError::Validation)?;

        let mut conversation = self.owned(owner_id, conversation_id).await?;
        conversation.title = title;
        conversation.touch();

        self.save_and_refresh(&conversation).await
    }

    /// Full update: replaces the title and, when given, moves the active
    /// pointer. Both inputs are checked before anything is written.
    #[instrument(skip(self, title), fields(conversation_id = %conversation_id))]
    pub async fn update_conversation(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
        title: &str,
        active_version_id: Option<VersionId>,
    ) -> Result<Conversation, ConversationError> {
        normalize_title(Some(title)).map_err(ConversationError::Validation)?;
        let conversation = self.owned(owner_id, conversation_id).await?;

        if let Some(version_id) = active_version_id {
            self.version_of(&conversation, version_id).await?;
            if conversation.active_version_id != Some(version_id) {
                self.switch_active_version(owner_id, conversation_id, version_id)
                    .await?;
            }
        }

        self.change_title(owner_id, conversation_id, title).await
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id))]
    pub async fn soft_delete(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<Conversation, ConversationError> {
        let mut conversation = self.owned(owner_id, conversation_id).await?;
        conversation.soft_delete();

        self.save_and_refresh(&conversation).await
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id))]
    pub async fn delete_conversation(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<(), ConversationError> {
        let conversation = self.owned(owner_id, conversation_id).await?;
        self.repository.delete_conversation(conversation.id).await?;

        tracing::info!("Conversation deleted");
        Ok(())
    }

    /// Removes a non-active version. Versions forked from it stay, detached.
    #[instrument(skip(self), fields(conversation_id = %conversation_id, version_id = %version_id))]
    pub async fn delete_version(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
        version_id: VersionId,
    ) -> Result<(), ConversationError> {
        let mut conversation = self.owned(owner_id, conversation_id).await?;
        self.version_of(&conversation, version_id).await?;

        let active_version =
            || ConversationError::Validation(ACTIVE_VERSION_DELETE_MESSAGE.to_string());
        if conversation.active_version_id == Some(version_id) {
            return Err(active_version());
        }

        // The pointer may have moved onto this version since it was read.
        match self.repository.delete_version(version_id).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => return Err(active_version()),
            Err(e) => return Err(e.into()),
        }

        conversation.touch();
        self.save_and_refresh(&conversation).await?;
        Ok(())
    }

    pub async fn get_conversation(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<Conversation, ConversationError> {
        self.owned(owner_id, conversation_id).await
    }

    pub async fn conversation_detail(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<ConversationDetail, ConversationError> {
        let conversation = self.owned(owner_id, conversation_id).await?;

        let mut versions = Vec::new();
        for version in self.repository.list_versions(conversation.id).await? {
            let messages = self.repository.list_messages(version.id).await?;
            versions.push(VersionDetail { version, messages });
        }

        Ok(ConversationDetail {
            conversation,
            versions,
        })
    }

    pub async fn version_detail(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
        version_id: VersionId,
    ) -> Result<VersionDetail, ConversationError> {
        let conversation = self.owned(owner_id, conversation_id).await?;
        let version = self.version_of(&conversation, version_id).await?;
        let messages = self.repository.list_messages(version.id).await?;
        Ok(VersionDetail { version, messages })
    }

    pub async fn list_conversations(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<Conversation>, ConversationError> {
        Ok(self.repository.list_conversations(owner_id).await?)
    }

    pub async fn list_versions(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<Vec<Version>, ConversationError> {
        let conversation = self.owned(owner_id, conversation_id).await?;
        Ok(self.repository.list_versions(conversation.id).await?)
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id))]
    pub async fn build_branch_tree(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<BranchTree, ConversationError> {
        let conversation = self.owned(owner_id, conversation_id).await?;
        self.tree_of(&conversation).await
    }

    #[instrument(skip(self), fields(owner_id = %owner_id))]
    pub async fn build_branch_trees(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<BranchTree>, ConversationError> {
        let conversations = self.repository.list_conversations(owner_id).await?;

        let mut trees = Vec::with_capacity(conversations.len());
        for conversation in &conversations {
            trees.push(self.tree_of(conversation).await?);
        }
        Ok(trees)
    }

    pub async fn list_summaries(
        &self,
        query: &SummaryQuery,
    ) -> Result<Page<ConversationSummaryView>, ConversationError> {
        let page = self.repository.query_summaries(query).await?;
        Ok(page.map(ConversationSummaryView::from))
    }

    /// Hard deletes conversations untouched for `older_than_days`. A failing
    /// conversation is logged and counted, the batch carries on.
    #[instrument(skip(self))]
    pub async fn cleanup_old_conversations(
        &self,
        options: CleanupOptions,
    ) -> Result<CleanupReport, ConversationError> {
        if options.older_than_days < 0 {
            return Err(ConversationError::Validation(
                "Cleanup age must not be negative".to_string(),
            ));
        }

        let cutoff = Utc::now() - TimeDelta::days(options.older_than_days);
        let candidates = self
            .repository
            .list_modified_before(cutoff, options.deleted_only)
            .await?;

        let mut report = CleanupReport {
            matched: candidates.len(),
            examples: candidates.iter().take(CLEANUP_EXAMPLES).cloned().collect(),
            ..CleanupReport::default()
        };

        if options.dry_run {
            tracing::info!(matched = report.matched, "Cleanup dry run");
            return Ok(report);
        }

        for conversation in candidates {
            match self.repository.delete_conversation(conversation.id).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    tracing::warn!(
                        conversation_id = %conversation.id,
                        error = %e,
                        "Failed to delete conversation, continuing"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            matched = report.matched,
            deleted = report.deleted,
            failed = report.failed,
            "Cleanup finished"
        );

        Ok(report)
    }

    async fn save_and_refresh(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, ConversationError> {
        self.repository.update_conversation(conversation).await?;
        self.refresh_summary(conversation.id).await?;
        self.load(conversation.id).await
    }

    async fn refresh_summary(&self, conversation_id: ConversationId) -> Result<(), ConversationError> {
        self.summaries.refresh_after_save(conversation_id).await?;
        Ok(())
    }

    async fn tree_of(&self, conversation: &Conversation) -> Result<BranchTree, ConversationError> {
        let versions = self.repository.list_versions(conversation.id).await?;
        let messages = self
            .repository
            .list_conversation_messages(conversation.id)
            .await?;

        Ok(BranchTree::build(conversation, &versions, &messages))
    }

    async fn version_of(
        &self,
        conversation: &Conversation,
        version_id: VersionId,
    ) -> Result<Version, ConversationError> {
        self.repository
            .get_version(version_id)
            .await?
            .filter(|v| v.conversation_id == conversation.id)
            .ok_or_else(|| ConversationError::NotFound(format!("version {}", version_id)))
    }

    async fn load(&self, conversation_id: ConversationId) -> Result<Conversation, ConversationError> {
        self.repository
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| ConversationError::NotFound(format!("conversation {}", conversation_id)))
    }

    async fn owned(
        &self,
        owner_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<Conversation, ConversationError> {
        let conversation = self.load(conversation_id).await?;
        if !conversation.is_owned_by(owner_id) {
            return Err(ConversationError::NotFound(format!(
                "conversation {}",
                conversation_id
            )));
        }
        Ok(conversation)
    }
}

fn validate_draft(draft: &MessageDraft) -> Result<MessageRole, ConversationError> {
    if draft.content.trim().is_empty() {
        return Err(ConversationError::Validation(
            "Message content must not be empty".to_string(),
        ));
    }
    draft
        .role
        .parse::<MessageRole>()
        .map_err(ConversationError::Validation)
}
