use async_trait::async_trait;
use postdeck_model::{MessageRef, PublishedPost};

use crate::error::Result;

/// Keyboards of published posts, keyed by channel message.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert or replace the post stored for `post.message`.
    async fn save(&self, post: &PublishedPost) -> Result<()>;
    async fn find(&self, message: MessageRef) -> Result<Option<PublishedPost>>;
}
