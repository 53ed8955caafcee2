use async_trait::async_trait;
use postdeck_model::ShortenerCredentials;

use crate::error::Result;

#[async_trait]
pub trait LinkShortener: Send + Sync {
    async fn shorten(&self, credentials: &ShortenerCredentials, long_url: &str) -> Result<String>;
}
