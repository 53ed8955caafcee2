//! The conversation layer: inbound events, button actions, commands and the
//! state machine that ties the other core components together.

pub mod caption;
pub mod command;
pub mod event;
pub mod intent;
mod machine;
pub mod panel;

use std::{any::type_name_of_val, fmt, sync::Arc, time::Duration};

use postdeck_model::{ChatId, UserId};

use crate::ports::{
    AccessGate, FileRecordRepository, LinkShortener, Messenger, MetadataProvider,
    OwnerRepository, PostRepository, PosterRenderer, RequestRepository,
};

pub use command::Command;
pub use event::{FileKind, Inbound, InboundEvent, IncomingFile, Sender};
pub use intent::{CallbackAction, LanguageChoice, UnknownAction};
pub use machine::StateMachine;

/// Deployment-level knobs of the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantSettings {
    /// The bot owner; the only user allowed to run admin actions.
    pub owner_id: UserId,
    /// Channel receiving backup copies of every upload and request notices.
    pub archive_chat: ChatId,
    pub bot_username: String,
    /// Redirect page that forwards `?code=` to the bot.
    pub blog_url: Option<String>,
    /// Pause between two sends of a broadcast.
    pub broadcast_delay: Duration,
    /// Appended to every channel caption.
    pub caption_footer: Option<String>,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            owner_id: UserId(0),
            archive_chat: ChatId(0),
            bot_username: String::new(),
            blog_url: None,
            broadcast_delay: Duration::from_millis(50),
            caption_footer: None,
        }
    }
}

/// Every external system the state machine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub messenger: Arc<dyn Messenger>,
    pub files: Arc<dyn FileRecordRepository>,
    pub owners: Arc<dyn OwnerRepository>,
    pub requests: Arc<dyn RequestRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub gate: Arc<dyn AccessGate>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub shortener: Arc<dyn LinkShortener>,
    pub poster: Arc<dyn PosterRenderer>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("messenger", &type_name_of_val(self.messenger.as_ref()))
            .field("files", &type_name_of_val(self.files.as_ref()))
            .field("owners", &type_name_of_val(self.owners.as_ref()))
            .field("requests", &type_name_of_val(self.requests.as_ref()))
            .field("posts", &type_name_of_val(self.posts.as_ref()))
            .field("gate", &type_name_of_val(self.gate.as_ref()))
            .field("metadata", &type_name_of_val(self.metadata.as_ref()))
            .field("shortener", &type_name_of_val(self.shortener.as_ref()))
            .field("poster", &type_name_of_val(self.poster.as_ref()))
            .finish()
    }
}
