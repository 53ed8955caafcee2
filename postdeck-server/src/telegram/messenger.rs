use async_trait::async_trait;
use postdeck_core::error::{PostError, Result};
use postdeck_core::ports::{Messenger, SentPhoto};
use postdeck_model::{ChatId, ContentHandle, KeyboardLayout, MessageRef, PosterRef};
use teloxide::prelude::*;
use teloxide::types::{InputFile, Recipient};
use url::Url;

use super::{MediaHandle, message_ref, to_chat, to_markup, to_message_id};

/// [`Messenger`] backed by the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn input_file(handle: &MediaHandle) -> InputFile {
        InputFile::file_id(handle.file_id().to_string())
    }

    fn poster_file(poster: &PosterRef) -> Result<InputFile> {
        match poster {
            PosterRef::Remote(url) => {
                let url = Url::parse(url).map_err(|e| PostError::collaborator("poster url", e))?;
                Ok(InputFile::url(url))
            }
            PosterRef::Staged(handle) => Ok(Self::input_file(&MediaHandle::Photo(
                MediaHandle::parse(handle).file_id().to_string(),
            ))),
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<MessageRef> {
        let mut request = self.bot.send_message(to_chat(chat), text);
        if let Some(layout) = keyboard {
            request = request.reply_markup(to_markup(layout)?);
        }
        let sent = request
            .await
            .map_err(|e| PostError::collaborator("send message", e))?;
        Ok(message_ref(sent.chat.id, sent.id))
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<()> {
        let mut request = self.bot.edit_message_text(
            to_chat(message.chat),
            to_message_id(message.message),
            text,
        );
        if let Some(layout) = keyboard {
            request = request.reply_markup(to_markup(layout)?);
        }
        request
            .await
            .map_err(|e| PostError::collaborator("edit message", e))?;
        Ok(())
    }

    async fn edit_keyboard(&self, message: MessageRef, keyboard: &KeyboardLayout) -> Result<()> {
        self.bot
            .edit_message_reply_markup(to_chat(message.chat), to_message_id(message.message))
            .reply_markup(to_markup(keyboard)?)
            .await
            .map_err(|e| PostError::collaborator("edit keyboard", e))?;
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<()> {
        self.bot
            .delete_message(to_chat(message.chat), to_message_id(message.message))
            .await
            .map_err(|e| PostError::collaborator("delete message", e))?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<()> {
        let mut request = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(text) = text {
            request = request.text(text).show_alert(alert);
        }
        request
            .await
            .map_err(|e| PostError::collaborator("answer callback", e))?;
        Ok(())
    }

    async fn send_cached_media(
        &self,
        chat: ChatId,
        handle: &ContentHandle,
        caption: &str,
    ) -> Result<MessageRef> {
        let media = MediaHandle::parse(handle);
        let file = Self::input_file(&media);
        let sent = match media {
            MediaHandle::Video(_) => self.bot.send_video(to_chat(chat), file).caption(caption).await,
            MediaHandle::Document(_) => {
                self.bot
                    .send_document(to_chat(chat), file)
                    .caption(caption)
                    .await
            }
            MediaHandle::Photo(_) => self.bot.send_photo(to_chat(chat), file).caption(caption).await,
        }
        .map_err(|e| PostError::collaborator("send media", e))?;
        Ok(message_ref(sent.chat.id, sent.id))
    }

    async fn copy_message(
        &self,
        chat: ChatId,
        source: MessageRef,
        caption: Option<&str>,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<MessageRef> {
        let mut request = self.bot.copy_message(
            to_chat(chat),
            to_chat(source.chat),
            to_message_id(source.message),
        );
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        if let Some(layout) = keyboard {
            request = request.reply_markup(to_markup(layout)?);
        }
        let copied = request
            .await
            .map_err(|e| PostError::collaborator("copy message", e))?;
        Ok(message_ref(to_chat(chat), copied))
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &PosterRef,
        caption: &str,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<SentPhoto> {
        let mut request = self
            .bot
            .send_photo(to_chat(chat), Self::poster_file(photo)?)
            .caption(caption);
        if let Some(layout) = keyboard {
            request = request.reply_markup(to_markup(layout)?);
        }
        let sent = request
            .await
            .map_err(|e| PostError::collaborator("send photo", e))?;

        // Largest size last; its id re-sends the same image.
        let handle = sent
            .photo()
            .and_then(|sizes| sizes.last())
            .map(|size| MediaHandle::Photo(size.file.id.to_string()).into_content_handle());
        Ok(SentPhoto {
            message: message_ref(sent.chat.id, sent.id),
            handle,
        })
    }

    async fn resolve_username(&self, username: &str) -> Result<ChatId> {
        let username = format!("@{}", username.trim_start_matches('@'));
        let chat = self
            .bot
            .get_chat(Recipient::ChannelUsername(username))
            .await
            .map_err(|e| PostError::collaborator("resolve username", e))?;
        Ok(ChatId(chat.id.0))
    }
}
