use async_trait::async_trait;
use postdeck_model::{ChatId, OwnerSettings, UserId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::{PostError, Result};
use crate::ports::{OwnerRepository, OwnerSettingChange, UserCounts};

const SELECT_USER: &str = r#"
    SELECT user_id, first_name, is_premium, watermark_text, shortener_api_key,
           shortener_domain, delete_timer_seconds, channel_ids, tutorial_url
    FROM users
"#;

#[derive(Debug, Clone)]
pub struct PostgresOwners {
    pool: PgPool,
}

impl PostgresOwners {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<OwnerSettings> {
        let read = |e: sqlx::Error| PostError::Internal(format!("Failed to read user row: {e}"));

        let user_id: i64 = row.try_get("user_id").map_err(read)?;
        let delete_timer: i32 = row.try_get("delete_timer_seconds").map_err(read)?;
        let channels: Vec<i64> = row.try_get("channel_ids").map_err(read)?;

        Ok(OwnerSettings {
            user_id: UserId(user_id),
            first_name: row.try_get("first_name").map_err(read)?,
            is_premium: row.try_get("is_premium").map_err(read)?,
            watermark_text: row.try_get("watermark_text").map_err(read)?,
            shortener_api_key: row.try_get("shortener_api_key").map_err(read)?,
            shortener_domain: row.try_get("shortener_domain").map_err(read)?,
            delete_timer_seconds: u32::try_from(delete_timer).unwrap_or(0),
            channel_ids: channels.into_iter().map(ChatId).collect(),
            tutorial_url: row.try_get("tutorial_url").map_err(read)?,
        })
    }

    /// The `UPDATE` statement expressing `change`, with its parameter bound
    /// after the user id.
    fn update_for(change: &OwnerSettingChange) -> &'static str {
        match change {
            OwnerSettingChange::Watermark(_) => {
                "UPDATE users SET watermark_text = $2 WHERE user_id = $1"
            }
            OwnerSettingChange::ShortenerApiKey(_) => {
                "UPDATE users SET shortener_api_key = $2 WHERE user_id = $1"
            }
            OwnerSettingChange::ShortenerDomain(_) => {
                "UPDATE users SET shortener_domain = $2 WHERE user_id = $1"
            }
            OwnerSettingChange::DeleteTimer(_) => {
                "UPDATE users SET delete_timer_seconds = $2 WHERE user_id = $1"
            }
            OwnerSettingChange::AddChannel(_) => {
                "UPDATE users SET channel_ids = array_append(channel_ids, $2) \
                 WHERE user_id = $1 AND NOT ($2 = ANY(channel_ids))"
            }
            OwnerSettingChange::RemoveChannel(_) => {
                "UPDATE users SET channel_ids = array_remove(channel_ids, $2) WHERE user_id = $1"
            }
            OwnerSettingChange::Tutorial(_) => {
                "UPDATE users SET tutorial_url = $2 WHERE user_id = $1"
            }
            OwnerSettingChange::Premium(_) => "UPDATE users SET is_premium = $2 WHERE user_id = $1",
        }
    }
}

#[async_trait]
impl OwnerRepository for PostgresOwners {
    async fn upsert_user(&self, user: UserId, first_name: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, first_name)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET first_name = EXCLUDED.first_name
            "#,
        )
        .bind(user.0)
        .bind(first_name)
        .execute(&self.pool)
        .await
        .map_err(|e| PostError::Internal(format!("Failed to upsert user: {e}")))?;
        Ok(())
    }

    async fn get(&self, user: UserId) -> Result<Option<OwnerSettings>> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE user_id = $1"))
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PostError::Internal(format!("Failed to load user: {e}")))?;
        row.as_ref().map(Self::map_row).transpose()
    }

    async fn apply(&self, user: UserId, change: OwnerSettingChange) -> Result<OwnerSettings> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PostError::Internal(format!("Failed to open transaction: {e}")))?;

        sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| PostError::Internal(format!("Failed to create user: {e}")))?;

        let query = sqlx::query(Self::update_for(&change)).bind(user.0);
        let query = match change {
            OwnerSettingChange::Watermark(value) | OwnerSettingChange::Tutorial(value) => {
                query.bind(value)
            }
            OwnerSettingChange::ShortenerApiKey(value)
            | OwnerSettingChange::ShortenerDomain(value) => query.bind(value),
            OwnerSettingChange::DeleteTimer(seconds) => {
                query.bind(i32::try_from(seconds).unwrap_or(i32::MAX))
            }
            OwnerSettingChange::AddChannel(chat) | OwnerSettingChange::RemoveChannel(chat) => {
                query.bind(chat.0)
            }
            OwnerSettingChange::Premium(flag) => query.bind(flag),
        };
        query
            .execute(&mut *tx)
            .await
            .map_err(|e| PostError::Internal(format!("Failed to update user settings: {e}")))?;

        let row = sqlx::query(&format!("{SELECT_USER} WHERE user_id = $1"))
            .bind(user.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| PostError::Internal(format!("Failed to reload user: {e}")))?;
        let settings = Self::map_row(&row)?;

        tx.commit()
            .await
            .map_err(|e| PostError::Internal(format!("Failed to commit settings: {e}")))?;
        Ok(settings)
    }

    async fn list_user_ids(&self) -> Result<Vec<UserId>> {
        let rows = sqlx::query("SELECT user_id FROM users ORDER BY user_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PostError::Internal(format!("Failed to list users: {e}")))?;
        rows.iter()
            .map(|row| {
                row.try_get::<i64, _>("user_id")
                    .map(UserId)
                    .map_err(|e| PostError::Internal(format!("Failed to read user id: {e}")))
            })
            .collect()
    }

    async fn counts(&self) -> Result<UserCounts> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE is_premium) AS premium FROM users",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PostError::Internal(format!("Failed to count users: {e}")))?;
        let read = |e: sqlx::Error| PostError::Internal(format!("Failed to read user counts: {e}"));
        let total: i64 = row.try_get("total").map_err(read)?;
        let premium: i64 = row.try_get("premium").map_err(read)?;
        Ok(UserCounts {
            total: total.max(0) as u64,
            premium: premium.max(0) as u64,
        })
    }
}
