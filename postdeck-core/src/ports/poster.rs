use async_trait::async_trait;
use postdeck_model::PosterRef;

use crate::error::Result;

/// Produces the final poster image (watermark and badge overlay).
#[async_trait]
pub trait PosterRenderer: Send + Sync {
    async fn render(
        &self,
        poster: &PosterRef,
        watermark: Option<&str>,
        badge: Option<&str>,
    ) -> Result<PosterRef>;
}
