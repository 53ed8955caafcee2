use chrono::{DateTime, Utc};

use crate::ids::{MessageRef, UserId};
use crate::keyboard::KeyboardLayout;

/// A compiled post published to a channel. Kept so the keyboard can be
/// extended later without reading it back from the platform.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PublishedPost {
    pub message: MessageRef,
    pub owner_id: UserId,
    pub layout: KeyboardLayout,
    pub published_at: DateTime<Utc>,
}

impl PublishedPost {
    pub fn new(message: MessageRef, owner_id: UserId, layout: KeyboardLayout) -> Self {
        Self {
            message,
            owner_id,
            layout,
            published_at: Utc::now(),
        }
    }
}
