//! Resolves retrieval codes back to stored files and replays them.

use std::{any::type_name_of_val, fmt, sync::Arc, time::Duration};

use postdeck_model::{ChatId, FileRecord, MessageRef, RetrievalCode};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::ports::{FileRecordRepository, Messenger};

#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// No record carries the code.
    Expired,
    /// At least one record reached the user.
    Delivered {
        records: Vec<FileRecord>,
        delivered: Vec<MessageRef>,
        failed: usize,
        /// Set when a deletion of the delivered messages was scheduled.
        delete_after: Option<Duration>,
    },
    /// Records exist but none could be delivered.
    AllFailed { records: Vec<FileRecord> },
}

pub struct RetrievalService<R, M>
where
    R: FileRecordRepository + ?Sized,
    M: Messenger + ?Sized,
{
    files: Arc<R>,
    messenger: Arc<M>,
}

impl<R, M> fmt::Debug for RetrievalService<R, M>
where
    R: FileRecordRepository + ?Sized,
    M: Messenger + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievalService")
            .field("files", &type_name_of_val(self.files.as_ref()))
            .field("messenger", &type_name_of_val(self.messenger.as_ref()))
            .finish()
    }
}

impl<R, M> RetrievalService<R, M>
where
    R: FileRecordRepository + ?Sized,
    M: Messenger + ?Sized + 'static,
{
    pub fn new(files: Arc<R>, messenger: Arc<M>) -> Self {
        Self { files, messenger }
    }

    /// Every record stored under `code`; empty for unknown codes.
    pub async fn resolve(&self, code: &RetrievalCode) -> Result<Vec<FileRecord>> {
        self.files.find_by_code(code).await
    }

    /// Send every file of `code` to `chat`. Each record is tried through its
    /// content handle first and its archive copy second; records failing both
    /// are skipped.
    pub async fn deliver(&self, chat: ChatId, code: &RetrievalCode) -> Result<RetrievalOutcome> {
        let records = self.resolve(code).await?;
        if records.is_empty() {
            debug!(code = %code, "unknown retrieval code");
            return Ok(RetrievalOutcome::Expired);
        }

        let mut delivered = Vec::with_capacity(records.len());
        let mut failed = 0usize;
        for record in &records {
            match self.deliver_one(chat, record).await {
                Some(message) => delivered.push(message),
                None => failed += 1,
            }
        }

        if delivered.is_empty() {
            warn!(code = %code, records = records.len(), "no file of the group could be delivered");
            return Ok(RetrievalOutcome::AllFailed { records });
        }

        let delete_after = records
            .iter()
            .map(|record| record.delete_timer_seconds)
            .max()
            .filter(|seconds| *seconds > 0)
            .map(|seconds| Duration::from_secs(u64::from(seconds)));

        if let Some(delay) = delete_after {
            self.schedule_deletion(delivered.clone(), delay);
        }

        info!(
            code = %code,
            delivered = delivered.len(),
            failed,
            "retrieval served"
        );
        Ok(RetrievalOutcome::Delivered {
            records,
            delivered,
            failed,
            delete_after,
        })
    }

    async fn deliver_one(&self, chat: ChatId, record: &FileRecord) -> Option<MessageRef> {
        match self
            .messenger
            .send_cached_media(chat, &record.content_handle, &record.caption)
            .await
        {
            Ok(message) => return Some(message),
            Err(e) => debug!(record = %record.id, error = %e, "cached media send failed"),
        }

        let backup = record.backup_pointer?;
        match self
            .messenger
            .copy_message(chat, backup, Some(&record.caption), None)
            .await
        {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(record = %record.id, error = %e, "archive fallback failed");
                None
            }
        }
    }

    fn schedule_deletion(&self, messages: Vec<MessageRef>, delay: Duration) {
        let messenger = Arc::clone(&self.messenger);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for message in messages {
                if let Err(e) = messenger.delete_message(message).await {
                    debug!(error = %e, "scheduled deletion failed");
                }
            }
        });
    }
}
