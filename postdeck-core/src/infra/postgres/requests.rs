use async_trait::async_trait;
use postdeck_model::MovieRequest;
use sqlx::{PgPool, Row};

use crate::error::{PostError, Result};
use crate::ports::RequestRepository;

#[derive(Debug, Clone)]
pub struct PostgresRequests {
    pool: PgPool,
}

impl PostgresRequests {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestRepository for PostgresRequests {
    async fn insert(&self, request: &MovieRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO movie_requests (id, user_id, user_name, request, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(request.id)
        .bind(request.user_id.0)
        .bind(&request.user_name)
        .bind(&request.request)
        .bind(request.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PostError::Internal(format!("Failed to insert request: {e}")))?;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM movie_requests")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PostError::Internal(format!("Failed to count requests: {e}")))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| PostError::Internal(format!("Failed to read request count: {e}")))?;
        Ok(total.max(0) as u64)
    }
}
