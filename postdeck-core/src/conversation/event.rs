use postdeck_model::{ContentHandle, MessageRef, UserId};

use super::command::Command;
use super::intent::CallbackAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Video,
    Document,
    Photo,
}

/// A media message as received from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub kind: FileKind,
    pub handle: ContentHandle,
    pub file_name: Option<String>,
    pub caption: Option<String>,
    /// The user's message carrying the file.
    pub origin: MessageRef,
}

impl IncomingFile {
    pub fn is_media(&self) -> bool {
        matches!(self.kind, FileKind::Video | FileKind::Document)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub first_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command {
        message: MessageRef,
        command: Command,
    },
    Text {
        message: MessageRef,
        text: String,
    },
    File(IncomingFile),
    Callback {
        callback_id: String,
        /// Message the pressed keyboard belongs to, when still accessible.
        origin: Option<MessageRef>,
        action: CallbackAction,
    },
}

/// One event of one user, classified at the platform boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub sender: Sender,
    pub event: InboundEvent,
}

impl Inbound {
    pub fn new(sender: Sender, event: InboundEvent) -> Self {
        Self { sender, event }
    }
}
