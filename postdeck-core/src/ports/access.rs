use async_trait::async_trait;
use postdeck_model::UserId;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Allowed,
    /// The user has to join the gating channel first.
    MustJoin { join_link: String },
}

/// Subscription gate consulted before any command runs.
#[async_trait]
pub trait AccessGate: Send + Sync {
    async fn check(&self, user: UserId) -> Result<GateVerdict>;
}
