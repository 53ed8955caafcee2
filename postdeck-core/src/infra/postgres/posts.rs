use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postdeck_model::{KeyboardLayout, MessageRef, PublishedPost, UserId};
use serde_json::Value;
use sqlx::{PgPool, Row};

use crate::error::{PostError, Result};
use crate::ports::PostRepository;

/// Published posts with their keyboard stored as JSONB.
#[derive(Debug, Clone)]
pub struct PostgresPosts {
    pool: PgPool,
}

impl PostgresPosts {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPosts {
    async fn save(&self, post: &PublishedPost) -> Result<()> {
        let layout = serde_json::to_value(&post.layout)
            .map_err(|e| PostError::Internal(format!("Failed to encode keyboard layout: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO published_posts (chat_id, message_id, owner_id, layout, published_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (chat_id, message_id)
            DO UPDATE SET layout = EXCLUDED.layout
            "#,
        )
        .bind(post.message.chat.0)
        .bind(post.message.message.0)
        .bind(post.owner_id.0)
        .bind(layout)
        .bind(post.published_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PostError::Internal(format!("Failed to save published post: {e}")))?;
        Ok(())
    }

    async fn find(&self, message: MessageRef) -> Result<Option<PublishedPost>> {
        let Some(row) = sqlx::query(
            r#"
            SELECT owner_id, layout, published_at
            FROM published_posts
            WHERE chat_id = $1 AND message_id = $2
            "#,
        )
        .bind(message.chat.0)
        .bind(message.message.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PostError::Internal(format!("Failed to load published post: {e}")))?
        else {
            return Ok(None);
        };

        let read = |e: sqlx::Error| PostError::Internal(format!("Failed to read post row: {e}"));
        let owner_id: i64 = row.try_get("owner_id").map_err(read)?;
        let layout: Value = row.try_get("layout").map_err(read)?;
        let published_at: DateTime<Utc> = row.try_get("published_at").map_err(read)?;

        let layout: KeyboardLayout = serde_json::from_value(layout)
            .map_err(|e| PostError::Internal(format!("Invalid keyboard layout payload: {e}")))?;

        Ok(Some(PublishedPost {
            message,
            owner_id: UserId(owner_id),
            layout,
            published_at,
        }))
    }
}
