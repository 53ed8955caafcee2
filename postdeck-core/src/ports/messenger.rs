use async_trait::async_trait;
use postdeck_model::{ChatId, ContentHandle, KeyboardLayout, MessageRef, PosterRef};

use crate::error::Result;

/// Result of sending a photo; the handle lets the same image be re-sent
/// without uploading it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPhoto {
    pub message: MessageRef,
    pub handle: Option<ContentHandle>,
}

/// Messaging-platform client as seen by the core.
///
/// Rate-limit backoff and request timeouts are the implementation's concern.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<MessageRef>;

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<()>;

    async fn edit_keyboard(&self, message: MessageRef, keyboard: &KeyboardLayout) -> Result<()>;

    async fn delete_message(&self, message: MessageRef) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>, alert: bool)
    -> Result<()>;

    /// Re-send stored media by its platform handle.
    async fn send_cached_media(
        &self,
        chat: ChatId,
        handle: &ContentHandle,
        caption: &str,
    ) -> Result<MessageRef>;

    /// Copy an existing message, optionally replacing caption and keyboard.
    async fn copy_message(
        &self,
        chat: ChatId,
        source: MessageRef,
        caption: Option<&str>,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<MessageRef>;

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &PosterRef,
        caption: &str,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<SentPhoto>;

    /// Resolve a public `@username` to its chat id.
    async fn resolve_username(&self, username: &str) -> Result<ChatId>;
}
