use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postdeck_model::{
    ChatId, ContentHandle, FileRecord, MessageId, MessageRef, RetrievalCode, UserId,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{PostError, Result};
use crate::ports::FileRecordRepository;

#[derive(Debug, Clone)]
pub struct PostgresFileRecords {
    pool: PgPool,
}

impl PostgresFileRecords {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<FileRecord> {
        let read = |e: sqlx::Error| PostError::Internal(format!("Failed to read file row: {e}"));

        let code: String = row.try_get("code").map_err(read)?;
        let backup_chat: Option<i64> = row.try_get("backup_chat_id").map_err(read)?;
        let backup_message: Option<i32> = row.try_get("backup_message_id").map_err(read)?;
        let delete_timer: i32 = row.try_get("delete_timer_seconds").map_err(read)?;
        let uploader: i64 = row.try_get("uploader_id").map_err(read)?;
        let id: Uuid = row.try_get("id").map_err(read)?;
        let content_handle: String = row.try_get("content_handle").map_err(read)?;
        let caption: String = row.try_get("caption").map_err(read)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;

        Ok(FileRecord {
            id,
            code: RetrievalCode::parse(&code)?,
            content_handle: ContentHandle::new(content_handle),
            backup_pointer: backup_chat
                .zip(backup_message)
                .map(|(chat, message)| MessageRef::new(ChatId(chat), MessageId(message))),
            caption,
            delete_timer_seconds: u32::try_from(delete_timer).unwrap_or(0),
            uploader_id: UserId(uploader),
            created_at,
        })
    }
}

#[async_trait]
impl FileRecordRepository for PostgresFileRecords {
    async fn insert(&self, record: &FileRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO files (
                id, code, content_handle, backup_chat_id, backup_message_id,
                caption, delete_timer_seconds, uploader_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(record.code.as_str())
        .bind(record.content_handle.as_str())
        .bind(record.backup_pointer.map(|p| p.chat.0))
        .bind(record.backup_pointer.map(|p| p.message.0))
        .bind(&record.caption)
        .bind(i32::try_from(record.delete_timer_seconds).unwrap_or(i32::MAX))
        .bind(record.uploader_id.0)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PostError::Internal(format!("Failed to insert file record: {e}")))?;
        Ok(())
    }

    async fn find_by_code(&self, code: &RetrievalCode) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, content_handle, backup_chat_id, backup_message_id,
                   caption, delete_timer_seconds, uploader_id, created_at
            FROM files
            WHERE code = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(code.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PostError::Internal(format!("Failed to load files for code: {e}")))?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn code_exists(&self, code: &RetrievalCode) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM files WHERE code = $1) AS present")
            .bind(code.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PostError::Internal(format!("Failed to check code: {e}")))?;
        row.try_get("present")
            .map_err(|e| PostError::Internal(format!("Failed to read code check: {e}")))
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM files")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PostError::Internal(format!("Failed to count files: {e}")))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| PostError::Internal(format!("Failed to read file count: {e}")))?;
        Ok(total.max(0) as u64)
    }
}
