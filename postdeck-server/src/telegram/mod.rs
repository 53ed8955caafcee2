//! Telegram Bot API adapter: update classification, the `Messenger` port and
//! the membership gate.

pub mod dispatch;
pub mod gate;
pub mod messenger;

use std::fmt;

use postdeck_core::conversation::FileKind;
use postdeck_core::error::{PostError, Result};
use postdeck_model::{ButtonTarget, ChatId, ContentHandle, KeyboardLayout, MessageId, MessageRef};
use teloxide::types::{self as tg, InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

pub use dispatch::run_dispatcher;
pub use gate::ChannelGate;
pub use messenger::TelegramMessenger;

/// Callback token carried by informational buttons.
const MARKER_TOKEN: &str = "ignore";

/// A platform file id tagged with the send method it needs. Stored as the
/// content handle of file records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaHandle {
    Video(String),
    Document(String),
    Photo(String),
}

impl MediaHandle {
    pub fn new(kind: FileKind, file_id: impl Into<String>) -> Self {
        let file_id = file_id.into();
        match kind {
            FileKind::Video => MediaHandle::Video(file_id),
            FileKind::Document => MediaHandle::Document(file_id),
            FileKind::Photo => MediaHandle::Photo(file_id),
        }
    }

    /// Untagged handles are treated as documents.
    pub fn parse(handle: &ContentHandle) -> Self {
        let raw = handle.as_str();
        match raw.split_once(':') {
            Some(("video", id)) => MediaHandle::Video(id.to_string()),
            Some(("document", id)) => MediaHandle::Document(id.to_string()),
            Some(("photo", id)) => MediaHandle::Photo(id.to_string()),
            _ => MediaHandle::Document(raw.to_string()),
        }
    }

    pub fn file_id(&self) -> &str {
        match self {
            MediaHandle::Video(id) | MediaHandle::Document(id) | MediaHandle::Photo(id) => id,
        }
    }

    pub fn into_content_handle(self) -> ContentHandle {
        ContentHandle::new(self.to_string())
    }
}

impl fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaHandle::Video(id) => write!(f, "video:{id}"),
            MediaHandle::Document(id) => write!(f, "document:{id}"),
            MediaHandle::Photo(id) => write!(f, "photo:{id}"),
        }
    }
}

pub(crate) fn to_chat(chat: ChatId) -> tg::ChatId {
    tg::ChatId(chat.0)
}

pub(crate) fn to_message_id(message: MessageId) -> tg::MessageId {
    tg::MessageId(message.0)
}

pub(crate) fn message_ref(chat: tg::ChatId, message: tg::MessageId) -> MessageRef {
    MessageRef::new(ChatId(chat.0), MessageId(message.0))
}

/// Convert a keyboard into inline markup. Marker buttons become inert
/// callback buttons.
pub(crate) fn to_markup(layout: &KeyboardLayout) -> Result<InlineKeyboardMarkup> {
    let mut rows = Vec::with_capacity(layout.rows().len());
    for row in layout.rows() {
        let mut buttons = Vec::with_capacity(row.len());
        for spec in row {
            let button = match &spec.target {
                ButtonTarget::Link(link) => {
                    let url = Url::parse(link)
                        .map_err(|e| PostError::collaborator("keyboard link", e))?;
                    InlineKeyboardButton::url(spec.label.clone(), url)
                }
                ButtonTarget::Callback(token) => {
                    InlineKeyboardButton::callback(spec.label.clone(), token.clone())
                }
                ButtonTarget::Marker => {
                    InlineKeyboardButton::callback(spec.label.clone(), MARKER_TOKEN)
                }
            };
            buttons.push(button);
        }
        rows.push(buttons);
    }
    Ok(InlineKeyboardMarkup::new(rows))
}
