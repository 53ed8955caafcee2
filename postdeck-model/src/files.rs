use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::code::RetrievalCode;
use crate::ids::{MessageRef, UserId};

/// Platform handle of a stored media object (a reusable file id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentHandle(pub String);

impl ContentHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One physically uploaded file. Several records may share a code when they
/// belong to the same group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileRecord {
    pub id: Uuid,
    pub code: RetrievalCode,
    pub content_handle: ContentHandle,
    /// Copy of the upload inside the archive channel, used when the content
    /// handle can no longer be delivered.
    pub backup_pointer: Option<MessageRef>,
    pub caption: String,
    /// Zero disables deferred deletion.
    pub delete_timer_seconds: u32,
    pub uploader_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Draft of a file record before its code is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFileRecord {
    pub content_handle: ContentHandle,
    pub backup_pointer: Option<MessageRef>,
    pub caption: String,
    pub delete_timer_seconds: u32,
    pub uploader_id: UserId,
}

impl NewFileRecord {
    pub fn into_record(self, code: RetrievalCode) -> FileRecord {
        FileRecord {
            id: Uuid::now_v7(),
            code,
            content_handle: self.content_handle,
            backup_pointer: self.backup_pointer,
            caption: self.caption,
            delete_timer_seconds: self.delete_timer_seconds,
            uploader_id: self.uploader_id,
            created_at: Utc::now(),
        }
    }
}
