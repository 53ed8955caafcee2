use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ids::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovieRequest {
    pub user_id: UserId,
    pub user_name: String,
    pub request: String,
}

/// A title a user asked to have posted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovieRequest {
    pub id: Uuid,
    pub user_id: UserId,
    pub user_name: String,
    pub request: String,
    pub created_at: DateTime<Utc>,
}

impl NewMovieRequest {
    pub fn into_request(self) -> MovieRequest {
        MovieRequest {
            id: Uuid::now_v7(),
            user_id: self.user_id,
            user_name: self.user_name,
            request: self.request,
            created_at: Utc::now(),
        }
    }
}
