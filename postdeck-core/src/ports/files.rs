use async_trait::async_trait;
use postdeck_model::{FileRecord, RetrievalCode};

use crate::error::Result;

#[async_trait]
pub trait FileRecordRepository: Send + Sync {
    async fn insert(&self, record: &FileRecord) -> Result<()>;

    /// Every record sharing `code`, oldest first. Unknown codes yield an
    /// empty list.
    async fn find_by_code(&self, code: &RetrievalCode) -> Result<Vec<FileRecord>>;

    async fn code_exists(&self, code: &RetrievalCode) -> Result<bool>;

    async fn count(&self) -> Result<u64>;
}
