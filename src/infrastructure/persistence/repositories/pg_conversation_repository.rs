use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{
    ConversationRepository, Page, RepositoryError, SummaryOrdering, SummaryQuery, VersionCommit,
};
use crate::domain::{
    Conversation, ConversationId, Message, MessageId, MessageRole, UserId, Version, VersionId,
    next_message_timestamp, store_precision,
};

use super::{escape_like, query_failed};

const CONVERSATION_COLUMNS: &str =
    "id, owner_id, title, summary, active_version_id, created_at, modified_at, deleted_at";

pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, RepositoryError> {
        self.pool
            .begin()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))
    }
}

#[derive(FromRow)]
struct ConversationRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    summary: Option<String>,
    active_version_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ConversationRow> for Conversation {
    fn from(r: ConversationRow) -> Self {
        Conversation {
            id: ConversationId::from_uuid(r.id),
            owner_id: UserId::from_uuid(r.owner_id),
            title: r.title,
            summary: r.summary,
            active_version_id: r.active_version_id.map(VersionId::from_uuid),
            created_at: r.created_at,
            modified_at: r.modified_at,
            deleted_at: r.deleted_at,
        }
    }
}

#[derive(FromRow)]
struct VersionRow {
    id: Uuid,
    conversation_id: Uuid,
    parent_version_id: Option<Uuid>,
    root_message_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<VersionRow> for Version {
    fn from(r: VersionRow) -> Self {
        Version {
            id: VersionId::from_uuid(r.id),
            conversation_id: ConversationId::from_uuid(r.conversation_id),
            parent_version_id: r.parent_version_id.map(VersionId::from_uuid),
            root_message_id: r.root_message_id.map(MessageId::from_uuid),
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    version_id: Uuid,
    role: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = RepositoryError;

    fn try_from(r: MessageRow) -> Result<Self, Self::Error> {
        let role = r
            .role
            .parse::<MessageRole>()
            .map_err(RepositoryError::QueryFailed)?;

        Ok(Message {
            id: MessageId::from_uuid(r.id),
            version_id: VersionId::from_uuid(r.version_id),
            role,
            content: r.content,
            created_at: r.created_at,
        })
    }
}

fn into_messages(rows: Vec<MessageRow>) -> Result<Vec<Message>, RepositoryError> {
    rows.into_iter().map(Message::try_from).collect()
}

fn push_summary_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &SummaryQuery) {
    qb.push(" WHERE deleted_at IS NULL");
    if let Some(owner_id) = query.owner_id {
        qb.push(" AND owner_id = ").push_bind(owner_id.as_uuid());
    }
    if let Some(title) = &query.title {
        qb.push(" AND title = ").push_bind(title.clone());
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR summary ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn summary_order(ordering: SummaryOrdering) -> &'static str {
    match ordering {
        SummaryOrdering::ModifiedAtAsc => " ORDER BY modified_at ASC, id ASC",
        SummaryOrdering::ModifiedAtDesc => " ORDER BY modified_at DESC, id DESC",
        SummaryOrdering::TitleAsc => " ORDER BY title ASC, id ASC",
        SummaryOrdering::TitleDesc => " ORDER BY title DESC, id DESC",
    }
}

async fn insert_conversation<'e, E>(executor: E, conversation: &Conversation) -> Result<(), RepositoryError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO conversations
            (id, owner_id, title, summary, active_version_id, created_at, modified_at, deleted_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(conversation.id.as_uuid())
    .bind(conversation.owner_id.as_uuid())
    .bind(&conversation.title)
    .bind(&conversation.summary)
    .bind(conversation.active_version_id.map(|v| v.as_uuid()))
    .bind(conversation.created_at)
    .bind(conversation.modified_at)
    .bind(conversation.deleted_at)
    .execute(executor)
    .await
    .map_err(query_failed)?;

    Ok(())
}

/// Inserts the committed version and its messages, then points the
/// conversation at it. The caller owns the transaction and the row lock.
async fn write_commit(conn: &mut PgConnection, commit: &VersionCommit) -> Result<(), RepositoryError> {
    let version = &commit.version;

    sqlx::query(
        r#"
        INSERT INTO versions (id, conversation_id, parent_version_id, root_message_id, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(version.id.as_uuid())
    .bind(version.conversation_id.as_uuid())
    .bind(version.parent_version_id.map(|v| v.as_uuid()))
    .bind(version.root_message_id.map(|m| m.as_uuid()))
    .bind(version.created_at)
    .execute(&mut *conn)
    .await
    .map_err(query_failed)?;

    if !commit.messages.is_empty() {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO messages (id, version_id, role, content, created_at) ",
        );
        qb.push_values(&commit.messages, |mut row, message| {
            row.push_bind(message.id.as_uuid())
                .push_bind(message.version_id.as_uuid())
                .push_bind(message.role.as_str().to_string())
                .push_bind(message.content.clone())
                .push_bind(message.created_at);
        });
        qb.build()
            .execute(&mut *conn)
            .await
            .map_err(query_failed)?;
    }

    sqlx::query(
        r#"
        UPDATE conversations
        SET active_version_id = $1, modified_at = GREATEST(modified_at, $2)
        WHERE id = $3
        "#,
    )
    .bind(version.id.as_uuid())
    .bind(commit.modified_at)
    .bind(version.conversation_id.as_uuid())
    .execute(&mut *conn)
    .await
    .map_err(query_failed)?;

    Ok(())
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id.as_uuid()))]
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        insert_conversation(&self.pool, conversation).await?;

        Ok(())
    }

    #[instrument(
        skip(self, conversation, commit),
        fields(conversation_id = %conversation.id.as_uuid(), messages = commit.messages.len())
    )]
    async fn create_with_version(
        &self,
        conversation: &Conversation,
        commit: &VersionCommit,
    ) -> Result<(), RepositoryError> {
        if commit.version.conversation_id != conversation.id {
            return Err(RepositoryError::ConstraintViolation(format!(
                "version {} belongs to another conversation",
                commit.version.id
            )));
        }

        let mut tx = self.begin().await?;
        insert_conversation(&mut *tx, conversation).await?;
        write_commit(&mut tx, commit).await?;
        tx.commit().await.map_err(query_failed)?;
        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %id.as_uuid()))]
    async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query_as::<_, ConversationRow>(&format!(
            "SELECT {} FROM conversations WHERE id = $1",
            CONVERSATION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(row.map(Conversation::from))
    }

    #[instrument(skip(self), fields(owner_id = %owner_id.as_uuid()))]
    async fn list_conversations(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query_as::<_, ConversationRow>(&format!(
            r#"
            SELECT {}
            FROM conversations
            WHERE owner_id = $1 AND deleted_at IS NULL
            ORDER BY modified_at DESC, id DESC
            "#,
            CONVERSATION_COLUMNS
        ))
        .bind(owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(rows.into_iter().map(Conversation::from).collect())
    }

    #[instrument(skip(self, query), fields(page = query.page.page, page_size = query.page.page_size))]
    async fn query_summaries(
        &self,
        query: &SummaryQuery,
    ) -> Result<Page<Conversation>, RepositoryError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM conversations");
        push_summary_filters(&mut count_qb, query);
        let count: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed)?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM conversations",
            CONVERSATION_COLUMNS
        ));
        push_summary_filters(&mut qb, query);
        qb.push(summary_order(query.ordering));
        qb.push(" LIMIT ")
            .push_bind(i64::try_from(query.page.limit()).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX));

        let rows: Vec<ConversationRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed)?;

        Ok(Page::new(
            query.page,
            count as usize,
            rows.into_iter().map(Conversation::from).collect(),
        ))
    }

    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id.as_uuid()))]
    async fn update_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET title = $1, deleted_at = $2, modified_at = $3
            WHERE id = $4
            "#,
        )
        .bind(&conversation.title)
        .bind(conversation.deleted_at)
        .bind(conversation.modified_at)
        .bind(conversation.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "conversation {}",
                conversation.id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, summary), fields(conversation_id = %id.as_uuid()))]
    async fn store_summary(&self, id: ConversationId, summary: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE conversations SET summary = $1 WHERE id = $2")
            .bind(summary)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("conversation {}", id)));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_unsummarized(&self) -> Result<Vec<ConversationId>, RepositoryError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM conversations WHERE summary IS NULL ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(ids.into_iter().map(ConversationId::from_uuid).collect())
    }

    #[instrument(skip(self))]
    async fn list_modified_before(
        &self,
        cutoff: DateTime<Utc>,
        deleted_only: bool,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query_as::<_, ConversationRow>(&format!(
            r#"
            SELECT {}
            FROM conversations
            WHERE modified_at < $1 AND ($2 = FALSE OR deleted_at IS NOT NULL)
            ORDER BY modified_at ASC, id ASC
            "#,
            CONVERSATION_COLUMNS
        ))
        .bind(cutoff)
        .bind(deleted_only)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(rows.into_iter().map(Conversation::from).collect())
    }

    #[instrument(skip(self), fields(conversation_id = %id.as_uuid()))]
    async fn delete_conversation(&self, id: ConversationId) -> Result<(), RepositoryError> {
        let conversation_id = id.as_uuid();
        let mut tx = self.begin().await?;

        sqlx::query("UPDATE conversations SET active_version_id = NULL WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;

        sqlx::query(
            r#"
            UPDATE versions
            SET parent_version_id = NULL, root_message_id = NULL
            WHERE conversation_id = $1
            "#,
        )
        .bind(conversation_id)
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        sqlx::query(
            r#"
            DELETE FROM messages
            WHERE version_id IN (SELECT id FROM versions WHERE conversation_id = $1)
            "#,
        )
        .bind(conversation_id)
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        sqlx::query("DELETE FROM versions WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;

        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("conversation {}", id)));
        }

        tx.commit().await.map_err(query_failed)?;
        Ok(())
    }

    #[instrument(
        skip(self, commit),
        fields(
            conversation_id = %commit.version.conversation_id.as_uuid(),
            version_id = %commit.version.id.as_uuid(),
            messages = commit.messages.len()
        )
    )]
    async fn commit_version(&self, commit: &VersionCommit) -> Result<(), RepositoryError> {
        let version = &commit.version;
        let conversation_id = version.conversation_id.as_uuid();
        let mut tx = self.begin().await?;

        let current: Option<Option<Uuid>> = sqlx::query_scalar(
            "SELECT active_version_id FROM conversations WHERE id = $1 FOR UPDATE",
        )
        .bind(conversation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_failed)?;

        let current = current.ok_or_else(|| {
            RepositoryError::NotFound(format!("conversation {}", version.conversation_id))
        })?;
        if current != commit.expected_active_version_id.map(|v| v.as_uuid()) {
            return Err(RepositoryError::Conflict(format!(
                "active version of conversation {} changed",
                version.conversation_id
            )));
        }

        write_commit(&mut tx, commit).await?;

        tx.commit().await.map_err(query_failed)?;
        Ok(())
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id.as_uuid(), target = %target.as_uuid()))]
    async fn switch_active_version(
        &self,
        conversation_id: ConversationId,
        expected_active_version_id: Option<VersionId>,
        target: VersionId,
        modified_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET active_version_id = $1, modified_at = GREATEST(modified_at, $2)
            WHERE id = $3 AND active_version_id IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(target.as_uuid())
        .bind(modified_at)
        .bind(conversation_id.as_uuid())
        .bind(expected_active_version_id.map(|v| v.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return match self.get_conversation(conversation_id).await? {
                Some(_) => Err(RepositoryError::Conflict(format!(
                    "active version of conversation {} changed",
                    conversation_id
                ))),
                None => Err(RepositoryError::NotFound(format!(
                    "conversation {}",
                    conversation_id
                ))),
            };
        }
        Ok(())
    }

    #[instrument(skip(self), fields(version_id = %id.as_uuid()))]
    async fn get_version(&self, id: VersionId) -> Result<Option<Version>, RepositoryError> {
        let row = sqlx::query_as::<_, VersionRow>(
            r#"
            SELECT id, conversation_id, parent_version_id, root_message_id, created_at
            FROM versions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(row.map(Version::from))
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id.as_uuid()))]
    async fn list_versions(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Version>, RepositoryError> {
        let rows = sqlx::query_as::<_, VersionRow>(
            r#"
            SELECT id, conversation_id, parent_version_id, root_message_id, created_at
            FROM versions
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(rows.into_iter().map(Version::from).collect())
    }

    #[instrument(skip(self), fields(version_id = %id.as_uuid()))]
    async fn delete_version(&self, id: VersionId) -> Result<(), RepositoryError> {
        let version_id = id.as_uuid();
        let mut tx = self.begin().await?;

        let active: Option<Option<Uuid>> = sqlx::query_scalar(
            r#"
            SELECT c.active_version_id
            FROM conversations c
            JOIN versions v ON v.conversation_id = c.id
            WHERE v.id = $1
            FOR UPDATE OF c
            "#,
        )
        .bind(version_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_failed)?;

        match active {
            None => return Err(RepositoryError::NotFound(format!("version {}", id))),
            Some(Some(active)) if active == version_id => {
                return Err(RepositoryError::Conflict(format!(
                    "version {} is the active version of its conversation",
                    id
                )));
            }
            Some(_) => {}
        }

        sqlx::query(
            r#"
            UPDATE versions
            SET parent_version_id = NULL, root_message_id = NULL
            WHERE parent_version_id = $1
               OR root_message_id IN (SELECT id FROM messages WHERE version_id = $1)
            "#,
        )
        .bind(version_id)
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        sqlx::query("DELETE FROM messages WHERE version_id = $1")
            .bind(version_id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;

        let result = sqlx::query("DELETE FROM versions WHERE id = $1")
            .bind(version_id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("version {}", id)));
        }

        tx.commit().await.map_err(query_failed)?;
        Ok(())
    }

    #[instrument(skip(self, draft), fields(message_id = %draft.id.as_uuid(), version_id = %draft.version_id.as_uuid()))]
    async fn append_message(&self, draft: &Message) -> Result<Message, RepositoryError> {
        let version_id = draft.version_id.as_uuid();
        let mut tx = self.begin().await?;

        let conversation_id: Option<Uuid> =
            sqlx::query_scalar("SELECT conversation_id FROM versions WHERE id = $1 FOR UPDATE")
                .bind(version_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(query_failed)?;
        let conversation_id = conversation_id
            .ok_or_else(|| RepositoryError::NotFound(format!("version {}", draft.version_id)))?;

        let last: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(created_at) FROM messages WHERE version_id = $1")
                .bind(version_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(query_failed)?;

        let message = Message {
            created_at: next_message_timestamp(last, draft.created_at),
            ..draft.clone()
        };

        sqlx::query(
            r#"
            INSERT INTO messages (id, version_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(version_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        sqlx::query(
            "UPDATE conversations SET modified_at = GREATEST(modified_at, $1) WHERE id = $2",
        )
        .bind(store_precision(Utc::now()))
        .bind(conversation_id)
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        tx.commit().await.map_err(query_failed)?;
        Ok(message)
    }

    #[instrument(skip(self), fields(message_id = %id.as_uuid()))]
    async fn get_message(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(
            "SELECT id, version_id, role, content, created_at FROM messages WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.map(Message::try_from).transpose()
    }

    #[instrument(skip(self), fields(version_id = %version_id.as_uuid()))]
    async fn list_messages(&self, version_id: VersionId) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, version_id, role, content, created_at
            FROM messages
            WHERE version_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(version_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        into_messages(rows)
    }

    #[instrument(skip(self), fields(conversation_id = %conversation_id.as_uuid()))]
    async fn list_conversation_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.version_id, m.role, m.content, m.created_at
            FROM messages m
            JOIN versions v ON v.id = m.version_id
            WHERE v.conversation_id = $1
            ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        into_messages(rows)
    }
}
