#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use postdeck_core::conversation::{
    AssistantSettings, CallbackAction, Collaborators, Command, FileKind, Inbound, InboundEvent,
    IncomingFile, Sender, StateMachine,
};
use postdeck_core::error::{PostError, Result};
use postdeck_core::infra::{
    InMemoryFileRecords, InMemoryOwners, InMemoryPosts, InMemoryRequests, OpenGate,
    PassthroughPoster,
};
use postdeck_core::ports::{
    LinkShortener, Messenger, MetadataProvider, OwnerRepository, SearchHit, SentPhoto,
};
use postdeck_core::session::WizardState;
use postdeck_model::{
    ChatId, ContentHandle, KeyboardLayout, MediaKind, MessageId, MessageRef, OwnerSettings,
    PosterRef, ShortenerCredentials, SubjectDetails, UserId,
};
use tokio::sync::Mutex;

pub const OWNER: i64 = 1;
pub const ARCHIVE: ChatId = ChatId(-100_999);
pub const BOT: &str = "deck_bot";

/// One call made against the messenger.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat: ChatId,
        text: String,
        keyboard: Option<KeyboardLayout>,
    },
    Edit {
        message: MessageRef,
        text: String,
        keyboard: Option<KeyboardLayout>,
    },
    KeyboardEdit {
        message: MessageRef,
        keyboard: KeyboardLayout,
    },
    Delete(MessageRef),
    Answer {
        callback_id: String,
        text: Option<String>,
        alert: bool,
    },
    Media {
        chat: ChatId,
        handle: ContentHandle,
        caption: String,
    },
    Copy {
        chat: ChatId,
        source: MessageRef,
        caption: Option<String>,
        keyboard: Option<KeyboardLayout>,
    },
    Photo {
        chat: ChatId,
        photo: PosterRef,
        caption: String,
        keyboard: Option<KeyboardLayout>,
    },
}

/// Messenger that records every call and answers with fresh message ids.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    log: Mutex<Vec<Sent>>,
    next_id: AtomicI32,
    failing_handles: Mutex<HashSet<String>>,
    fail_copies_to: Mutex<HashSet<ChatId>>,
    fail_keyboard_edits: AtomicBool,
    usernames: Mutex<HashMap<String, ChatId>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(1000),
            ..Self::default()
        }
    }

    fn message_in(&self, chat: ChatId) -> MessageRef {
        MessageRef::new(chat, MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn record(&self, sent: Sent) {
        self.log.lock().await.push(sent);
    }

    pub async fn fail_handle(&self, handle: &str) {
        self.failing_handles.lock().await.insert(handle.to_string());
    }

    pub async fn fail_copies_to(&self, chat: ChatId) {
        self.fail_copies_to.lock().await.insert(chat);
    }

    pub fn fail_keyboard_edits(&self, fail: bool) {
        self.fail_keyboard_edits.store(fail, Ordering::SeqCst);
    }

    pub async fn register_username(&self, username: &str, chat: ChatId) {
        self.usernames.lock().await.insert(username.to_string(), chat);
    }

    pub async fn log(&self) -> Vec<Sent> {
        self.log.lock().await.clone()
    }

    /// Texts sent to or edited into `chat`, in order.
    pub async fn texts_to(&self, chat: ChatId) -> Vec<String> {
        self.log
            .lock()
            .await
            .iter()
            .filter_map(|sent| match sent {
                Sent::Text { chat: c, text, .. } if *c == chat => Some(text.clone()),
                Sent::Edit { message, text, .. } if message.chat == chat => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn last_text_to(&self, chat: ChatId) -> Option<String> {
        self.texts_to(chat).await.pop()
    }

    /// Keyboards attached to texts sent to `chat`, in order.
    pub async fn keyboards_to(&self, chat: ChatId) -> Vec<KeyboardLayout> {
        self.log
            .lock()
            .await
            .iter()
            .filter_map(|sent| match sent {
                Sent::Text {
                    chat: c,
                    keyboard: Some(keyboard),
                    ..
                } if *c == chat => Some(keyboard.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn answers(&self) -> Vec<(Option<String>, bool)> {
        self.log
            .lock()
            .await
            .iter()
            .filter_map(|sent| match sent {
                Sent::Answer { text, alert, .. } => Some((text.clone(), *alert)),
                _ => None,
            })
            .collect()
    }

    pub async fn media_to(&self, chat: ChatId) -> Vec<ContentHandle> {
        self.log
            .lock()
            .await
            .iter()
            .filter_map(|sent| match sent {
                Sent::Media { chat: c, handle, .. } if *c == chat => Some(handle.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn deleted(&self) -> Vec<MessageRef> {
        self.log
            .lock()
            .await
            .iter()
            .filter_map(|sent| match sent {
                Sent::Delete(message) => Some(*message),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<MessageRef> {
        self.record(Sent::Text {
            chat,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        })
        .await;
        Ok(self.message_in(chat))
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<()> {
        self.record(Sent::Edit {
            message,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        })
        .await;
        Ok(())
    }

    async fn edit_keyboard(&self, message: MessageRef, keyboard: &KeyboardLayout) -> Result<()> {
        if self.fail_keyboard_edits.load(Ordering::SeqCst) {
            return Err(PostError::collaborator("edit keyboard", "message is not modified"));
        }
        self.record(Sent::KeyboardEdit {
            message,
            keyboard: keyboard.clone(),
        })
        .await;
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<()> {
        self.record(Sent::Delete(message)).await;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<()> {
        self.record(Sent::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
            alert,
        })
        .await;
        Ok(())
    }

    async fn send_cached_media(
        &self,
        chat: ChatId,
        handle: &ContentHandle,
        caption: &str,
    ) -> Result<MessageRef> {
        if self.failing_handles.lock().await.contains(handle.as_str()) {
            return Err(PostError::collaborator("send media", "file reference expired"));
        }
        self.record(Sent::Media {
            chat,
            handle: handle.clone(),
            caption: caption.to_string(),
        })
        .await;
        Ok(self.message_in(chat))
    }

    async fn copy_message(
        &self,
        chat: ChatId,
        source: MessageRef,
        caption: Option<&str>,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<MessageRef> {
        if self.fail_copies_to.lock().await.contains(&chat) {
            return Err(PostError::collaborator("copy message", "chat unavailable"));
        }
        self.record(Sent::Copy {
            chat,
            source,
            caption: caption.map(str::to_string),
            keyboard: keyboard.cloned(),
        })
        .await;
        Ok(self.message_in(chat))
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &PosterRef,
        caption: &str,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<SentPhoto> {
        self.record(Sent::Photo {
            chat,
            photo: photo.clone(),
            caption: caption.to_string(),
            keyboard: keyboard.cloned(),
        })
        .await;
        let message = self.message_in(chat);
        Ok(SentPhoto {
            message,
            handle: Some(ContentHandle::new(format!("photo-{}", message.message))),
        })
    }

    async fn resolve_username(&self, username: &str) -> Result<ChatId> {
        self.usernames
            .lock()
            .await
            .get(username.trim_start_matches('@'))
            .copied()
            .ok_or_else(|| PostError::collaborator("resolve username", "unknown chat"))
    }
}

/// Metadata service with a single known series.
#[derive(Debug, Default)]
pub struct StaticMetadata;

pub fn dark() -> SubjectDetails {
    SubjectDetails {
        kind: MediaKind::Tv,
        title: Some("Dark".into()),
        year: Some("2017".into()),
        rating: Some(8.4),
        genres: vec!["Crime".into(), "Drama".into()],
        poster: None,
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadata {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        if !query.eq_ignore_ascii_case("dark") {
            return Ok(Vec::new());
        }
        Ok(vec![
            SearchHit {
                kind: MediaKind::Tv,
                id: 70523,
                title: "Dark".into(),
                year: Some("2017".into()),
            },
            SearchHit {
                kind: MediaKind::Movie,
                id: 155,
                title: "The Dark Knight".into(),
                year: Some("2008".into()),
            },
        ])
    }

    async fn find_by_imdb(&self, _imdb_id: &str) -> Result<Vec<SearchHit>> {
        Ok(Vec::new())
    }

    async fn details(&self, kind: MediaKind, id: u64) -> Result<SubjectDetails> {
        match (kind, id) {
            (MediaKind::Tv, 70523) => Ok(dark()),
            _ => Err(PostError::NotFound(format!("{kind}/{id}"))),
        }
    }
}

/// Shortener returning `https://s.ex/<n>`, counting its calls.
#[derive(Debug, Default)]
pub struct CountingShortener {
    pub calls: AtomicUsize,
    pub broken: AtomicBool,
}

#[async_trait]
impl LinkShortener for CountingShortener {
    async fn shorten(&self, _credentials: &ShortenerCredentials, _long_url: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.broken.load(Ordering::SeqCst) {
            return Err(PostError::collaborator("link shortening", "service down"));
        }
        Ok(format!("https://s.ex/{n}"))
    }
}

pub fn settings() -> AssistantSettings {
    AssistantSettings {
        owner_id: UserId(OWNER),
        archive_chat: ARCHIVE,
        bot_username: BOT.into(),
        blog_url: None,
        broadcast_delay: Duration::ZERO,
        caption_footer: None,
    }
}

/// A state machine wired to in-memory collaborators.
#[derive(Debug)]
pub struct Harness {
    pub machine: StateMachine,
    pub messenger: Arc<RecordingMessenger>,
    pub files: Arc<InMemoryFileRecords>,
    pub owners: Arc<InMemoryOwners>,
    pub requests: Arc<InMemoryRequests>,
    pub posts: Arc<InMemoryPosts>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_shortener(Arc::new(CountingShortener::default()))
    }

    pub fn with_shortener(shortener: Arc<dyn LinkShortener>) -> Self {
        let messenger = Arc::new(RecordingMessenger::new());
        let files = Arc::new(InMemoryFileRecords::new());
        let owners = Arc::new(InMemoryOwners::new());
        let requests = Arc::new(InMemoryRequests::new());
        let posts = Arc::new(InMemoryPosts::new());

        let deps = Collaborators {
            messenger: messenger.clone(),
            files: files.clone(),
            owners: owners.clone(),
            requests: requests.clone(),
            posts: posts.clone(),
            gate: Arc::new(OpenGate),
            metadata: Arc::new(StaticMetadata),
            shortener,
            poster: Arc::new(PassthroughPoster),
        };

        Self {
            machine: StateMachine::new(settings(), deps),
            messenger,
            files,
            owners,
            requests,
            posts,
        }
    }

    pub async fn send(&self, inbound: Inbound) {
        self.machine.handle(inbound).await;
    }

    pub async fn owners_settings(&self, user: i64) -> OwnerSettings {
        self.owners
            .get(UserId(user))
            .await
            .unwrap()
            .expect("user row should exist")
    }

    pub async fn state_of(&self, user: i64) -> Option<WizardState> {
        self.machine
            .session_snapshot(UserId(user))
            .await
            .map(|session| session.state)
    }
}

pub fn sender(user: i64) -> Sender {
    Sender {
        id: UserId(user),
        first_name: format!("User{user}"),
    }
}

fn user_message(user: i64, id: i32) -> MessageRef {
    MessageRef::new(ChatId(user), MessageId(id))
}

pub fn command(user: i64, text: &str) -> Inbound {
    let command = Command::parse(text).expect("test command should parse");
    Inbound::new(
        sender(user),
        InboundEvent::Command {
            message: user_message(user, 1),
            command,
        },
    )
}

pub fn text(user: i64, text: &str) -> Inbound {
    Inbound::new(
        sender(user),
        InboundEvent::Text {
            message: user_message(user, 2),
            text: text.to_string(),
        },
    )
}

pub fn document(user: i64, file_name: &str, message_id: i32) -> Inbound {
    Inbound::new(
        sender(user),
        InboundEvent::File(IncomingFile {
            kind: FileKind::Document,
            handle: ContentHandle::new(format!("doc-{file_name}")),
            file_name: Some(file_name.to_string()),
            caption: None,
            origin: user_message(user, message_id),
        }),
    )
}

pub fn photo(user: i64, handle: &str) -> Inbound {
    Inbound::new(
        sender(user),
        InboundEvent::File(IncomingFile {
            kind: FileKind::Photo,
            handle: ContentHandle::new(handle),
            file_name: None,
            caption: None,
            origin: user_message(user, 3),
        }),
    )
}

pub fn press(user: i64, action: CallbackAction) -> Inbound {
    Inbound::new(
        sender(user),
        InboundEvent::Callback {
            callback_id: format!("cb-{user}"),
            origin: None,
            action,
        },
    )
}
