use async_trait::async_trait;
use postdeck_model::MovieRequest;

use crate::error::Result;

#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn insert(&self, request: &MovieRequest) -> Result<()>;
    async fn count(&self) -> Result<u64>;
}
