use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{FileOrdering, FileQuery, FileRepository, Page, RepositoryError};
use crate::domain::{
    ContentHash, FileEvent, FileEventType, FileId, FileUpload, StoragePath, UserId,
};

use super::{escape_like, query_failed};

const UPLOAD_COLUMNS: &str = "id, uploader_id, name, size_bytes, hash, storage_path, uploaded_at";

pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UploadRow {
    id: Uuid,
    uploader_id: Uuid,
    name: String,
    size_bytes: i64,
    hash: String,
    storage_path: String,
    uploaded_at: DateTime<Utc>,
}

impl From<UploadRow> for FileUpload {
    fn from(r: UploadRow) -> Self {
        FileUpload {
            id: FileId::from_uuid(r.id),
            uploader_id: UserId::from_uuid(r.uploader_id),
            name: r.name,
            size_bytes: r.size_bytes.max(0) as u64,
            hash: ContentHash::from_hex(r.hash),
            storage_path: StoragePath::from_raw(r.storage_path),
            uploaded_at: r.uploaded_at,
        }
    }
}

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    event_type: String,
    file_id: Option<Uuid>,
    user_id: Uuid,
    occurred_at: DateTime<Utc>,
    extra: Option<String>,
}

impl TryFrom<EventRow> for FileEvent {
    type Error = RepositoryError;

    fn try_from(r: EventRow) -> Result<Self, Self::Error> {
        let event_type = r
            .event_type
            .parse::<FileEventType>()
            .map_err(RepositoryError::QueryFailed)?;

        Ok(FileEvent {
            id: r.id,
            event_type,
            file_id: r.file_id.map(FileId::from_uuid),
            user_id: UserId::from_uuid(r.user_id),
            occurred_at: r.occurred_at,
            extra: r.extra,
        })
    }
}

fn push_upload_filters(qb: &mut QueryBuilder<'_, Postgres>, uploader_id: UserId, query: &FileQuery) {
    qb.push(" WHERE uploader_id = ").push_bind(uploader_id.as_uuid());
    if let Some(name) = &query.name {
        qb.push(" AND name = ").push_bind(name.clone());
    }
    if let Some(hash) = &query.hash {
        qb.push(" AND hash = ").push_bind(hash.to_lowercase());
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND name ILIKE ")
            .push_bind(format!("%{}%", escape_like(search)));
    }
}

fn upload_order(ordering: FileOrdering) -> &'static str {
    match ordering {
        FileOrdering::UploadedAtAsc => " ORDER BY uploaded_at ASC, id ASC",
        FileOrdering::UploadedAtDesc => " ORDER BY uploaded_at DESC, id DESC",
        FileOrdering::NameAsc => " ORDER BY name ASC, id ASC",
        FileOrdering::NameDesc => " ORDER BY name DESC, id DESC",
        FileOrdering::SizeAsc => " ORDER BY size_bytes ASC, id ASC",
        FileOrdering::SizeDesc => " ORDER BY size_bytes DESC, id DESC",
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    #[instrument(skip(self, upload), fields(file_id = %upload.id.as_uuid()))]
    async fn create_upload(&self, upload: &FileUpload) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO file_uploads
                (id, uploader_id, name, size_bytes, hash, storage_path, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(upload.id.as_uuid())
        .bind(upload.uploader_id.as_uuid())
        .bind(&upload.name)
        .bind(upload.size_bytes as i64)
        .bind(upload.hash.as_str())
        .bind(upload.storage_path.as_str())
        .bind(upload.uploaded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::ConstraintViolation(db.message().to_string())
            }
            other => query_failed(other),
        })?;

        Ok(())
    }

    #[instrument(skip(self, hash), fields(uploader_id = %uploader_id.as_uuid()))]
    async fn find_by_hash(
        &self,
        uploader_id: UserId,
        hash: &ContentHash,
    ) -> Result<Option<FileUpload>, RepositoryError> {
        let row = sqlx::query_as::<_, UploadRow>(&format!(
            "SELECT {} FROM file_uploads WHERE uploader_id = $1 AND hash = $2",
            UPLOAD_COLUMNS
        ))
        .bind(uploader_id.as_uuid())
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(row.map(FileUpload::from))
    }

    #[instrument(skip(self), fields(file_id = %id.as_uuid()))]
    async fn get_upload(&self, id: FileId) -> Result<Option<FileUpload>, RepositoryError> {
        let row = sqlx::query_as::<_, UploadRow>(&format!(
            "SELECT {} FROM file_uploads WHERE id = $1",
            UPLOAD_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(row.map(FileUpload::from))
    }

    #[instrument(skip(self, query), fields(uploader_id = %uploader_id.as_uuid()))]
    async fn list_uploads(
        &self,
        uploader_id: UserId,
        query: &FileQuery,
    ) -> Result<Page<FileUpload>, RepositoryError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM file_uploads");
        push_upload_filters(&mut count_qb, uploader_id, query);
        let count: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed)?;

        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM file_uploads", UPLOAD_COLUMNS));
        push_upload_filters(&mut qb, uploader_id, query);
        qb.push(upload_order(query.ordering));
        qb.push(" LIMIT ")
            .push_bind(i64::try_from(query.page.limit()).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX));

        let rows: Vec<UploadRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed)?;

        Ok(Page::new(
            query.page,
            count as usize,
            rows.into_iter().map(FileUpload::from).collect(),
        ))
    }

    #[instrument(skip(self), fields(file_id = %id.as_uuid()))]
    async fn delete_upload(&self, id: FileId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM file_uploads WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("file {}", id)));
        }
        Ok(())
    }

    #[instrument(skip(self, event), fields(event_type = %event.event_type))]
    async fn record_event(&self, event: &FileEvent) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO file_events (id, event_type, file_id, user_id, occurred_at, extra)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(event.event_type.as_str())
        .bind(event.file_id.map(|f| f.as_uuid()))
        .bind(event.user_id.as_uuid())
        .bind(event.occurred_at)
        .bind(&event.extra)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id.as_uuid()))]
    async fn list_events(&self, user_id: UserId) -> Result<Vec<FileEvent>, RepositoryError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, event_type, file_id, user_id, occurred_at, extra
            FROM file_events
            WHERE user_id = $1
            ORDER BY occurred_at DESC, id DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.into_iter().map(FileEvent::try_from).collect()
    }
}
