use std::{fmt, sync::Arc};

use postdeck_model::{
    ButtonSpec, ButtonTarget, ChatId, KeyboardLayout, MessageRef, NewFileRecord, NewMovieRequest,
    OwnerSettings, PosterRef, PublishedPost, RetrievalCode, UserId,
};
use tracing::{debug, info, warn};
use url::Url;

use super::caption;
use super::command::Command;
use super::event::{FileKind, Inbound, InboundEvent, IncomingFile, Sender};
use super::intent::{CallbackAction, LanguageChoice};
use super::panel;
use super::{AssistantSettings, Collaborators};
use crate::error::{ErrorClass, ExpiredKind, PostError, Result};
use crate::layout::{LayoutCompiler, TUTORIAL_LABEL};
use crate::links::{LinkBuilder, PostLink, post_url};
use crate::metadata::{DetectionMode, FALLBACK_QUALITY, GroupKey, MetadataExtractor};
use crate::ports::{
    FileRecordRepository, GateVerdict, LookupQuery, Messenger, OwnerSettingChange,
};
use crate::registry::CodeRegistry;
use crate::retrieval::{RetrievalOutcome, RetrievalService};
use crate::session::{Expected, PreviewScratch, Session, SessionStore, WizardState};

const GENERIC_FAILURE: &str = "❌ Something went wrong. Please try again.";
const AUTO_DETECT_PROMPT: &str = "🟢 Auto-Detect Mode Active\n\n👉 Send ALL your files now (480p, 720p, 1080p Mixed).\n🤖 Bot will read filename (e.g. S01E05) and organize them automatically.";
const BATCH_SEASON_PROMPT: &str = "📝 Enter Season Number (Optional)\n\n👉 Type a prefix like S1 or Season 1.\nButtons will look like: S1 E1, S1 E2 etc.\n\n👇 Click Skip to use default (Episode 1).";
const SETUP_HELP: &str = "⚙️ Commands:\n/setapi <key> [domain]\n/setshortener <domain>\n/setwatermark <text>\n/settimer <minutes>\n/settutorial <link>\n/addchannel <id>";

/// Reply attached to a callback answer.
struct Notice {
    text: String,
    alert: bool,
}

impl Notice {
    fn alert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alert: true,
        }
    }
}

/// Where the next upload goes and how it is labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UploadTarget {
    key: GroupKey,
    quality: String,
    label: String,
}

/// Drives every conversation. Owns the per-user sessions and routes each
/// inbound event to the handler of the user's current state.
///
/// Each event of a user is handled while holding that user's session guard,
/// so events of one user never interleave. Errors never escape [`handle`];
/// they are turned into replies according to their [`ErrorClass`].
///
/// [`handle`]: StateMachine::handle
pub struct StateMachine {
    settings: AssistantSettings,
    deps: Collaborators,
    sessions: SessionStore,
    registry: CodeRegistry<dyn FileRecordRepository>,
    retrieval: RetrievalService<dyn FileRecordRepository, dyn Messenger>,
    links: LinkBuilder,
    compiler: LayoutCompiler,
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("settings", &self.settings)
            .field("deps", &self.deps)
            .field("active_sessions", &self.sessions.active_count())
            .field("compiler", &self.compiler)
            .finish()
    }
}

impl StateMachine {
    pub fn new(settings: AssistantSettings, deps: Collaborators) -> Self {
        let links = LinkBuilder::new(settings.bot_username.clone(), settings.blog_url.clone());
        Self {
            registry: CodeRegistry::new(Arc::clone(&deps.files)),
            retrieval: RetrievalService::new(Arc::clone(&deps.files), Arc::clone(&deps.messenger)),
            sessions: SessionStore::new(),
            compiler: LayoutCompiler::new(),
            links,
            settings,
            deps,
        }
    }

    pub fn with_layout_compiler(mut self, compiler: LayoutCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Copy of `user`'s session once any in-flight event has finished.
    pub async fn session_snapshot(&self, user: UserId) -> Option<Session> {
        self.sessions.snapshot(user).await
    }

    /// Handle one inbound event to completion.
    pub async fn handle(&self, inbound: Inbound) {
        let Inbound { sender, event } = inbound;
        match event {
            InboundEvent::Callback {
                callback_id,
                origin,
                action,
            } => {
                debug!(user = %sender.id, action = %action, "callback received");
                let (text, alert) = match self.on_callback(&sender, origin, action).await {
                    Ok(Some(notice)) => (Some(notice.text), notice.alert),
                    Ok(None) => (None, false),
                    Err(err) => (Some(self.reply_for(&sender, &err)), true),
                };
                if let Err(e) = self
                    .deps
                    .messenger
                    .answer_callback(&callback_id, text.as_deref(), alert)
                    .await
                {
                    debug!(user = %sender.id, error = %e, "callback answer failed");
                }
            }
            event => {
                if let Err(err) = self.on_message(&sender, event).await {
                    let reply = self.reply_for(&sender, &err);
                    if let Err(e) = self.say(sender.id.private_chat(), &reply).await {
                        warn!(user = %sender.id, error = %e, "failed to report error to user");
                    }
                }
            }
        }
    }

    fn reply_for(&self, sender: &Sender, err: &PostError) -> String {
        match err.kind() {
            ErrorClass::UserInput => err.to_string(),
            ErrorClass::Expired => match err {
                PostError::Expired(ExpiredKind::Code) => "❌ Link Expired or Invalid.".to_string(),
                PostError::Expired(ExpiredKind::Post) => {
                    "❌ Post not found. Only posts published through this bot can be edited."
                        .to_string()
                }
                _ => "⌛ Session expired. Please start again.".to_string(),
            },
            ErrorClass::Collaborator => {
                warn!(user = %sender.id, error = %err, "step failed");
                GENERIC_FAILURE.to_string()
            }
        }
    }

    async fn on_message(&self, sender: &Sender, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Command { command, .. } => {
                self.touch_user(sender).await;
                if !self.passes_gate(sender).await? {
                    return Ok(());
                }
                if let Command::Start(Some(code)) = &command {
                    return self.serve_code(sender, code).await;
                }

                let mut guard = self.sessions.acquire(sender.id).await;
                let slot: &mut Option<Session> = &mut guard;
                if command.starts_conversation() {
                    *slot = None;
                }
                self.on_command(sender, slot, command).await
            }
            InboundEvent::Callback { .. } => Ok(()),
            event => {
                let mut guard = self.sessions.acquire(sender.id).await;
                self.on_session_message(sender, &mut guard, event).await
            }
        }
    }

    // ---- commands -------------------------------------------------------

    async fn on_command(
        &self,
        sender: &Sender,
        slot: &mut Option<Session>,
        command: Command,
    ) -> Result<()> {
        let chat = sender.id.private_chat();
        debug!(user = %sender.id, command = ?command, "command received");
        match command {
            Command::Start(_) => self.show_menu(sender).await,
            Command::Post(query) => {
                if !self.require_premium(sender).await? {
                    return Ok(());
                }
                self.lookup(sender, slot, &query).await
            }
            Command::Manual => {
                self.send(
                    chat,
                    "📝 Manual Post Creation\n\nWhat are you uploading?",
                    Some(&panel::manual_type_keyboard()),
                )
                .await
            }
            Command::AddEpisode(link) => {
                if !self.require_premium(sender).await? {
                    return Ok(());
                }
                self.open_post(sender, slot, link.as_deref()).await
            }
            settings => self.apply_setting(sender, settings).await,
        }
    }

    async fn show_menu(&self, sender: &Sender) -> Result<()> {
        let chat = sender.id.private_chat();
        if sender.id == self.settings.owner_id {
            return self
                .send(
                    chat,
                    "👑 Welcome Boss!\n\nAdmin Control Panel:",
                    Some(&panel::admin_menu()),
                )
                .await;
        }

        let is_premium = self.is_premium(sender.id).await?;
        let status = if is_premium {
            "💎 Premium User"
        } else {
            "👤 Free User"
        };
        let text = format!(
            "👋 Hello {}!\n\nYour Status: {status}\n\n👇 Available Commands:\n/post <Name/Link> - Auto Post (Supports IMDb/TMDB)\n/manual - Manual Post (Free for All)\n/addep <Link> - Add Episode to Old Post",
            sender.first_name
        );
        self.send(
            chat,
            &text,
            Some(&panel::user_menu(is_premium, self.settings.owner_id)),
        )
        .await
    }

    async fn serve_code(&self, sender: &Sender, raw: &str) -> Result<()> {
        let chat = sender.id.private_chat();
        let code = RetrievalCode::parse(raw).map_err(|_| PostError::Expired(ExpiredKind::Code))?;

        match self.retrieval.deliver(chat, &code).await? {
            RetrievalOutcome::Expired => Err(PostError::Expired(ExpiredKind::Code)),
            RetrievalOutcome::AllFailed { .. } => self.say(chat, "❌ Error: File not found.").await,
            RetrievalOutcome::Delivered {
                delete_after: Some(delay),
                ..
            } => {
                let minutes = delay.as_secs().div_ceil(60);
                self.say(
                    chat,
                    &format!(
                        "⚠️ Auto-Delete Enabled!\n\nThis file will be deleted in {minutes} minutes."
                    ),
                )
                .await
            }
            RetrievalOutcome::Delivered { .. } => Ok(()),
        }
    }

    async fn lookup(&self, sender: &Sender, slot: &mut Option<Session>, query: &str) -> Result<()> {
        let chat = sender.id.private_chat();
        if query.is_empty() {
            return Err(PostError::user_input(
                "Usage:\n/post Spiderman\n/post https://www.imdb.com/title/tt12345/",
            ));
        }

        let hits = match LookupQuery::parse(query) {
            LookupQuery::Direct { kind, id } => {
                let details = self
                    .deps
                    .metadata
                    .details(kind, id)
                    .await
                    .map_err(|e| match e {
                        PostError::NotFound(_) => PostError::user_input("❌ Invalid TMDB Link."),
                        other => other,
                    })?;
                let text = format!("✅ Found: {}\n\n🌐 Select Language:", details.display_title());
                *slot = Some(Session::for_subject(details));
                return self
                    .send(chat, &text, Some(&panel::language_keyboard()))
                    .await;
            }
            LookupQuery::Imdb(imdb_id) => {
                let hits = self.deps.metadata.find_by_imdb(&imdb_id).await?;
                if hits.is_empty() {
                    return Err(PostError::user_input(
                        "❌ IMDb ID not found in TMDB database.",
                    ));
                }
                hits
            }
            LookupQuery::Search(text) => self.deps.metadata.search(&text).await?,
        };

        if hits.is_empty() {
            return Err(PostError::user_input("❌ No results found!"));
        }
        self.send(
            chat,
            &format!("👇 Found {} Result(s):", hits.len()),
            Some(&panel::search_results(&hits)),
        )
        .await
    }

    async fn open_post(
        &self,
        sender: &Sender,
        slot: &mut Option<Session>,
        link: Option<&str>,
    ) -> Result<()> {
        let raw =
            link.ok_or_else(|| PostError::user_input("⚠️ Usage:\n/addep <Channel_Post_Link>"))?;

        let (message, username) = match PostLink::parse(raw)? {
            PostLink::Private(message) => (message, None),
            PostLink::Public { username, message } => {
                let chat = self.deps.messenger.resolve_username(&username).await?;
                (MessageRef::new(chat, message), Some(username))
            }
        };

        let post = self
            .deps
            .posts
            .find(message)
            .await?
            .filter(|post| post.owner_id == sender.id)
            .ok_or(PostError::Expired(ExpiredKind::Post))?;

        info!(user = %sender.id, chat = %message.chat, message = %message.message, "editing published post");
        *slot = Some(Session::for_edit(post, username));
        self.say(sender.id.private_chat(), "✅ Post Found!\n📂 Send the New File:")
            .await
    }

    async fn apply_setting(&self, sender: &Sender, command: Command) -> Result<()> {
        let user = sender.id;
        let owners = &self.deps.owners;

        let reply = match command {
            Command::SetWatermark(text) if text.is_empty() => {
                owners.apply(user, OwnerSettingChange::Watermark(None)).await?;
                "✅ Watermark removed.".to_string()
            }
            Command::SetWatermark(text) => {
                owners
                    .apply(user, OwnerSettingChange::Watermark(Some(text.clone())))
                    .await?;
                format!("✅ Watermark set: {text}")
            }
            Command::SetApi { key, domain } => {
                let key = key
                    .ok_or_else(|| PostError::user_input("❌ Usage: /setapi KEY [DOMAIN]"))?;
                owners
                    .apply(user, OwnerSettingChange::ShortenerApiKey(key))
                    .await?;
                if let Some(domain) = domain {
                    owners
                        .apply(
                            user,
                            OwnerSettingChange::ShortenerDomain(normalize_domain(&domain)),
                        )
                        .await?;
                }
                "✅ API Key Saved.".to_string()
            }
            Command::SetShortener(domain) => {
                let domain = domain
                    .map(|d| normalize_domain(&d))
                    .filter(|d| !d.is_empty())
                    .ok_or_else(|| PostError::user_input("❌ Usage: /setshortener short.example"))?;
                owners
                    .apply(user, OwnerSettingChange::ShortenerDomain(domain.clone()))
                    .await?;
                format!("✅ Shortener set: {domain}")
            }
            Command::SetTimer(None) => {
                owners.apply(user, OwnerSettingChange::DeleteTimer(0)).await?;
                "✅ Auto-Delete DISABLED.".to_string()
            }
            Command::SetTimer(Some(raw)) => {
                let minutes: u32 = raw
                    .parse()
                    .map_err(|_| PostError::user_input("❌ Usage: /settimer 10"))?;
                owners
                    .apply(
                        user,
                        OwnerSettingChange::DeleteTimer(minutes.saturating_mul(60)),
                    )
                    .await?;
                if minutes == 0 {
                    "✅ Auto-Delete DISABLED.".to_string()
                } else {
                    format!("✅ Timer set: {minutes} Minutes")
                }
            }
            Command::AddChannel(raw) => {
                let chat = parse_channel(raw.as_deref(), "/addchannel")?;
                owners.apply(user, OwnerSettingChange::AddChannel(chat)).await?;
                format!("✅ Channel {chat} added.")
            }
            Command::DelChannel(raw) => {
                let chat = parse_channel(raw.as_deref(), "/delchannel")?;
                owners
                    .apply(user, OwnerSettingChange::RemoveChannel(chat))
                    .await?;
                format!("✅ Channel {chat} removed.")
            }
            Command::MyChannels => {
                let channels = owners
                    .get(user)
                    .await?
                    .map(|settings| settings.channel_ids)
                    .unwrap_or_default();
                if channels.is_empty() {
                    "❌ No channels saved.".to_string()
                } else {
                    let list = channels
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n");
                    format!("📋 Channels:\n{list}")
                }
            }
            Command::SetTutorial(link) => {
                let link = link
                    .filter(|link| Url::parse(link).is_ok())
                    .ok_or_else(|| {
                        PostError::user_input("❌ Usage: /settutorial https://example.com/how-to")
                    })?;
                owners
                    .apply(user, OwnerSettingChange::Tutorial(Some(link)))
                    .await?;
                "✅ Tutorial Link Saved.".to_string()
            }
            Command::Start(_) | Command::Post(_) | Command::Manual | Command::AddEpisode(_) => {
                return Ok(());
            }
        };

        self.say(user.private_chat(), &reply).await
    }

    // ---- text and file messages -----------------------------------------

    async fn on_session_message(
        &self,
        sender: &Sender,
        slot: &mut Option<Session>,
        event: InboundEvent,
    ) -> Result<()> {
        let Some(state) = slot.as_ref().map(|session| session.state) else {
            debug!(user = %sender.id, "message outside a conversation ignored");
            return Ok(());
        };

        match (state.expected(), event) {
            (Expected::AnyMessage, InboundEvent::Text { message, .. }) => {
                self.broadcast(sender, slot, message).await
            }
            (Expected::AnyMessage, InboundEvent::File(file)) => {
                self.broadcast(sender, slot, file.origin).await
            }
            (Expected::Text, InboundEvent::Text { text, .. }) if !text.trim().is_empty() => {
                self.on_text(sender, slot, text.trim()).await
            }
            (Expected::Media, InboundEvent::File(file)) if file.is_media() => {
                if state == WizardState::WaitFileForEdit {
                    self.stage_edit_file(slot, file, sender).await
                } else {
                    self.upload(sender, slot, file).await
                }
            }
            (Expected::Photo, InboundEvent::File(file)) if file.kind == FileKind::Photo => {
                self.store_poster(sender, slot, file).await
            }
            (expected, _) => {
                debug!(user = %sender.id, state = state.name(), "unexpected event kind");
                Err(PostError::user_input(corrective_prompt(expected)))
            }
        }
    }

    async fn on_text(&self, sender: &Sender, slot: &mut Option<Session>, text: &str) -> Result<()> {
        let chat = sender.id.private_chat();
        let Some(session) = slot.as_mut() else {
            return Ok(());
        };

        let state = session.state;
        match state {
            WizardState::WaitRequestText => {
                let request = NewMovieRequest {
                    user_id: sender.id,
                    user_name: sender.first_name.clone(),
                    request: text.to_string(),
                }
                .into_request();
                self.deps.requests.insert(&request).await?;

                let notice = format!(
                    "📨 New Request!\n👤 {} ({})\n📝 {text}",
                    sender.first_name, sender.id
                );
                if let Err(e) = self.say(self.settings.archive_chat, &notice).await {
                    warn!(user = %sender.id, error = %e, "request notice not delivered");
                }
                *slot = None;
                self.say(chat, "✅ Request submitted!").await
            }
            WizardState::AdminAddPremiumWait => self.set_premium(sender, slot, text, true).await,
            WizardState::AdminRemovePremiumWait => {
                self.set_premium(sender, slot, text, false).await
            }
            WizardState::WaitManualTitle => {
                session.details.title = Some(text.to_string());
                session.state = WizardState::WaitManualYear;
                self.say(chat, "✅ Title Saved.\n\n📅 Send Year: (e.g. 2024, or skip)")
                    .await
            }
            WizardState::WaitManualYear => {
                session.details.year = if is_skip(text) {
                    None
                } else {
                    let year: u16 = text.parse().map_err(|_| {
                        PostError::user_input("❌ Send the year as a number (e.g. 2024) or skip.")
                    })?;
                    Some(year.to_string())
                };
                session.state = WizardState::WaitManualRating;
                self.say(chat, "✅ Year Saved.\n\n⭐ Send Rating: (e.g. 7.5, or skip)")
                    .await
            }
            WizardState::WaitManualRating => {
                session.details.rating = if is_skip(text) {
                    None
                } else {
                    let rating = text
                        .replace(',', ".")
                        .parse::<f32>()
                        .ok()
                        .filter(|r| (0.0..=10.0).contains(r))
                        .ok_or_else(|| {
                            PostError::user_input("❌ Send a rating between 0 and 10 (e.g. 7.5) or skip.")
                        })?;
                    Some(rating)
                };
                session.state = WizardState::WaitManualGenres;
                self.say(
                    chat,
                    "✅ Rating Saved.\n\n🎭 Send Genres: (comma separated, or skip)",
                )
                .await
            }
            WizardState::WaitManualGenres => {
                session.details.genres = if is_skip(text) {
                    Vec::new()
                } else {
                    text.split(',')
                        .map(str::trim)
                        .filter(|genre| !genre.is_empty())
                        .map(str::to_string)
                        .collect()
                };
                session.state = WizardState::WaitManualPoster;
                self.say(chat, "✅ Genres Saved.\n\n🖼 Send Poster Photo:").await
            }
            WizardState::WaitCustomLang => {
                session.language = Some(text.to_string());
                self.say(chat, &format!("✅ Language Set: {text}")).await?;
                self.show_panel(chat, session, None).await
            }
            WizardState::WaitBadgeText => {
                session.badge_text = Some(text.to_string());
                self.show_panel(chat, session, None).await
            }
            WizardState::WaitCustomButtonName => {
                session.mode.reset();
                session.current_quality = None;
                session.custom_button = Some(text.to_string());
                session.state = WizardState::WaitFileUpload;
                self.send(
                    chat,
                    &format!("📤 Upload File for: '{text}'\n👉 Send Video/File now."),
                    Some(&panel::back_to_panel("🔙 Back")),
                )
                .await
            }
            WizardState::WaitBatchSeasonInput => {
                session.custom_button = None;
                session.current_quality = None;
                session.mode.start_batch(Some(text.to_string()));
                session.state = WizardState::WaitFileUpload;
                self.send(
                    chat,
                    &format!("🟢 Batch Mode Active\nPrefix: {text}\n\n👉 Send files now."),
                    Some(&panel::back_to_panel("🔙 Stop Batch")),
                )
                .await
            }
            WizardState::WaitButtonNameForEdit => self.finish_edit(sender, slot, text).await,
            other => Err(PostError::user_input(corrective_prompt(other.expected()))),
        }
    }

    async fn set_premium(
        &self,
        sender: &Sender,
        slot: &mut Option<Session>,
        text: &str,
        premium: bool,
    ) -> Result<()> {
        if sender.id != self.settings.owner_id {
            *slot = None;
            return Ok(());
        }
        let target: UserId = text
            .parse()
            .map_err(|_| PostError::user_input("❌ Invalid ID. Send a numeric user id."))?;
        self.deps
            .owners
            .apply(target, OwnerSettingChange::Premium(premium))
            .await?;
        info!(target_user = %target, premium, "premium status changed");

        *slot = None;
        let reply = if premium {
            format!("✅ Premium Added: {target}")
        } else {
            format!("✅ Premium Removed: {target}")
        };
        self.say(sender.id.private_chat(), &reply).await
    }

    async fn broadcast(
        &self,
        sender: &Sender,
        slot: &mut Option<Session>,
        message: MessageRef,
    ) -> Result<()> {
        if sender.id != self.settings.owner_id {
            *slot = None;
            return Ok(());
        }
        let chat = sender.id.private_chat();
        let messenger = &self.deps.messenger;

        let status = messenger.send_text(chat, "📣 Broadcasting...", None).await?;
        let users = self.deps.owners.list_user_ids().await?;

        let (mut sent, mut failed) = (0usize, 0usize);
        for user in users {
            match messenger
                .copy_message(user.private_chat(), message, None, None)
                .await
            {
                Ok(_) => sent += 1,
                Err(e) => {
                    failed += 1;
                    debug!(user = %user, error = %e, "broadcast copy failed");
                }
            }
            tokio::time::sleep(self.settings.broadcast_delay).await;
        }
        info!(sent, failed, "broadcast finished");

        *slot = None;
        messenger
            .edit_text(
                status,
                &format!("✅ Broadcast complete.\nSent: {sent}\nFailed: {failed}"),
                None,
            )
            .await
    }

    async fn store_poster(
        &self,
        sender: &Sender,
        slot: &mut Option<Session>,
        file: IncomingFile,
    ) -> Result<()> {
        let Some(session) = slot.as_mut() else {
            return Ok(());
        };
        session.details.poster = Some(PosterRef::Staged(file.handle));
        session.state = WizardState::WaitLang;
        self.send(
            sender.id.private_chat(),
            "✅ Poster Saved.\n\n🌐 Select Language:",
            Some(&panel::language_keyboard()),
        )
        .await
    }

    /// The upload pipeline: archive, name, register, link, reply.
    async fn upload(
        &self,
        sender: &Sender,
        slot: &mut Option<Session>,
        file: IncomingFile,
    ) -> Result<()> {
        let chat = sender.id.private_chat();
        let Some(session) = slot.as_mut() else {
            return Ok(());
        };
        let target = upload_target(session, &file)?;

        let backup = self.archive(sender.id, &file, &target.label, false).await?;
        let owner = self.deps.owners.get(sender.id).await?;
        let draft = NewFileRecord {
            content_handle: file.handle.clone(),
            backup_pointer: Some(backup),
            caption: caption::file_caption(
                &session.details,
                session.language_or_unknown(),
                &target.label,
                self.links.bot_username(),
            ),
            delete_timer_seconds: owner.as_ref().map_or(0, |o| o.delete_timer_seconds),
            uploader_id: sender.id,
        };

        let registration = self
            .registry
            .register_upload(&mut session.group_codes, &target.key, draft)
            .await?;
        if registration.is_new_group {
            let link = self.public_link(owner.as_ref(), &registration.code).await;
            session
                .group_links
                .insert_new(target.key.clone(), link, target.quality.clone());
        } else {
            session.group_links.add_quality(&target.key, &target.quality);
        }
        info!(
            user = %sender.id,
            group = %target.key,
            quality = %target.quality,
            code = %registration.code,
            is_new_group = registration.is_new_group,
            "upload registered"
        );

        self.delete_quietly(file.origin).await;

        if session.mode.batch {
            session.mode.episode_counter += 1;
            self.send(
                chat,
                &format!("✅ {} Saved!\n👇 Send Next Episode...", target.label),
                Some(&panel::back_to_panel("🔙 Stop Batch")),
            )
            .await
        } else if session.mode.auto_detect {
            self.send(
                chat,
                &format!("✅ Detected: {}\n👇 Send Next File...", target.label),
                Some(&panel::auto_detect_progress()),
            )
            .await
        } else {
            self.show_panel(chat, session, None).await
        }
    }

    async fn stage_edit_file(
        &self,
        slot: &mut Option<Session>,
        file: IncomingFile,
        sender: &Sender,
    ) -> Result<()> {
        let session = slot
            .as_mut()
            .ok_or(PostError::Expired(ExpiredKind::Session))?;
        let edit = session
            .edit
            .as_mut()
            .ok_or(PostError::Expired(ExpiredKind::Session))?;
        edit.pending_file = Some(file);
        session.state = WizardState::WaitButtonNameForEdit;
        self.say(
            sender.id.private_chat(),
            "📝 File Received!\n\n👉 Enter Button Name:",
        )
        .await
    }

    /// Register the staged file and append its button to the published post.
    async fn finish_edit(
        &self,
        sender: &Sender,
        slot: &mut Option<Session>,
        name: &str,
    ) -> Result<()> {
        let chat = sender.id.private_chat();
        let Some(session) = slot.as_mut() else {
            return Ok(());
        };
        let edit = session
            .edit
            .as_mut()
            .ok_or(PostError::Expired(ExpiredKind::Session))?;
        let file = edit
            .pending_file
            .clone()
            .ok_or(PostError::Expired(ExpiredKind::Session))?;

        let max = self.compiler.max_buttons();
        if edit.post.layout.button_count() >= max {
            *slot = None;
            return self
                .say(
                    chat,
                    &format!("⚠️ Limit Reached: this post already holds {max} buttons."),
                )
                .await;
        }

        let (code, link) = match edit.staged_link.clone() {
            Some(staged) => staged,
            None => {
                let backup = self.archive(sender.id, &file, name, true).await?;
                let owner = self.deps.owners.get(sender.id).await?;
                let draft = NewFileRecord {
                    content_handle: file.handle.clone(),
                    backup_pointer: Some(backup),
                    caption: caption::update_file_caption(name, self.links.bot_username()),
                    delete_timer_seconds: owner.as_ref().map_or(0, |o| o.delete_timer_seconds),
                    uploader_id: sender.id,
                };
                let registration = self.registry.register_standalone(draft).await?;
                let link = self.public_link(owner.as_ref(), &registration.code).await;
                edit.staged_link = Some((registration.code.clone(), link.clone()));
                (registration.code, link)
            }
        };

        // The session's layout only changes once the post is saved.
        let mut post = edit.post.clone();
        append_button(&mut post.layout, ButtonSpec::link(name, link), name);
        self.deps
            .messenger
            .edit_keyboard(post.message, &post.layout)
            .await?;
        self.deps.posts.save(&post).await?;
        info!(user = %sender.id, code = %code, label = name, "button added to published post");

        edit.post = post;
        edit.added_label = Some(name.to_string());
        edit.staged_link = None;
        edit.pending_file = None;
        session.state = WizardState::AwaitRepost;
        self.send(
            chat,
            &format!("✅ Added: {name}\n\n🚀 Repost to Channel?"),
            Some(&panel::repost_options()),
        )
        .await
    }

    // ---- button presses -------------------------------------------------

    async fn on_callback(
        &self,
        sender: &Sender,
        origin: Option<MessageRef>,
        action: CallbackAction,
    ) -> Result<Option<Notice>> {
        if action.is_admin() && sender.id != self.settings.owner_id {
            debug!(user = %sender.id, action = %action, "admin action from non-owner ignored");
            return Ok(None);
        }

        let chat = sender.id.private_chat();
        let mut guard = self.sessions.acquire(sender.id).await;
        let slot: &mut Option<Session> = &mut guard;

        match action {
            CallbackAction::Ignore => Ok(None),
            CallbackAction::AdminStats => {
                let users = self.deps.owners.counts().await?;
                let files = self.deps.files.count().await?;
                let requests = self.deps.requests.count().await?;
                Ok(Some(Notice::alert(format!(
                    "📊 Total Users: {}\n💎 Premium: {}\n📂 Files: {files}\n📨 Requests: {requests}",
                    users.total, users.premium
                ))))
            }
            CallbackAction::AdminBroadcast => {
                *slot = Some(Session::new(WizardState::AdminBroadcastWait));
                self.render(chat, origin, "📢 Broadcast Mode\n\nSend message to broadcast.", None)
                    .await?;
                Ok(None)
            }
            CallbackAction::AdminAddPremium => {
                *slot = Some(Session::new(WizardState::AdminAddPremiumWait));
                self.render(chat, origin, "➕ Add Premium\n\nSend User ID.", None)
                    .await?;
                Ok(None)
            }
            CallbackAction::AdminRemovePremium => {
                *slot = Some(Session::new(WizardState::AdminRemovePremiumWait));
                self.render(chat, origin, "➖ Remove Premium\n\nSend User ID.", None)
                    .await?;
                Ok(None)
            }
            CallbackAction::MyAccount => {
                let status = if self.is_premium(sender.id).await? {
                    "Premium 💎"
                } else {
                    "Free 👤"
                };
                Ok(Some(Notice::alert(format!(
                    "User: {}\nStatus: {status}",
                    sender.first_name
                ))))
            }
            CallbackAction::ApiHelp => Ok(Some(Notice::alert(SETUP_HELP))),
            CallbackAction::RequestMovie => {
                *slot = Some(Session::new(WizardState::WaitRequestText));
                self.render(
                    chat,
                    origin,
                    "📝 Request System\n\n✍️ Please type the Name of the Movie or Series you want:",
                    Some(&panel::cancel_request()),
                )
                .await?;
                Ok(None)
            }
            CallbackAction::CancelRequest => {
                *slot = None;
                self.render(chat, origin, "❌ Request Cancelled.", None).await?;
                Ok(None)
            }
            CallbackAction::ManualType(kind) => {
                *slot = Some(Session::manual(kind));
                self.render(
                    chat,
                    origin,
                    &format!("📝 Step 1: Send the Title of the {}.", kind.display_name()),
                    None,
                )
                .await?;
                Ok(None)
            }
            CallbackAction::Select { kind, id } => {
                let details = self.deps.metadata.details(kind, id).await.map_err(|e| match e {
                    PostError::NotFound(_) => PostError::user_input("Error fetching details!"),
                    other => other,
                })?;
                let text = format!("✅ Selected: {}\n\n🌐 Select Language:", details.display_title());
                *slot = Some(Session::for_subject(details));
                self.render(chat, origin, &text, Some(&panel::language_keyboard()))
                    .await?;
                Ok(None)
            }
            CallbackAction::Language(choice) => {
                let session = posting(slot, |state| state == WizardState::WaitLang)?;
                match choice {
                    LanguageChoice::Preset(language) => {
                        session.language = Some(language);
                        self.show_panel(chat, session, origin).await?;
                    }
                    LanguageChoice::Custom => {
                        session.state = WizardState::WaitCustomLang;
                        self.render(
                            chat,
                            origin,
                            "✍️ Type Your Custom Language:\n(e.g. Tamil, French, Spanish Dubbed)",
                            None,
                        )
                        .await?;
                    }
                }
                Ok(None)
            }
            CallbackAction::Upload(quality) => {
                let session = posting(slot, on_panel)?;
                session.mode.reset();
                session.custom_button = None;
                session.state = WizardState::WaitFileUpload;
                let text = format!(
                    "📤 Upload Mode: {quality}\n\n👉 Forward or Send the video file here.\n🤖 Bot will backup to Log Channel & create a Short Link."
                );
                session.current_quality = Some(quality);
                self.render(chat, origin, &text, Some(&panel::back_to_panel("🔙 Back")))
                    .await?;
                Ok(None)
            }
            CallbackAction::ToggleAutoDetect => {
                let session = posting(slot, on_panel)?;
                if session.mode.auto_detect {
                    session.mode.reset();
                    session.current_quality = None;
                    self.show_panel(chat, session, origin).await?;
                    return Ok(Some(Notice::alert("🔴 Auto-Detect Disabled.")));
                }
                session.mode.start_auto_detect();
                session.custom_button = None;
                session.current_quality = None;
                session.state = WizardState::WaitFileUpload;
                self.render(
                    chat,
                    origin,
                    AUTO_DETECT_PROMPT,
                    Some(&panel::back_to_panel("🔙 Back to Panel")),
                )
                .await?;
                Ok(None)
            }
            CallbackAction::ToggleBatch => {
                let session = posting(slot, on_panel)?;
                if session.mode.batch {
                    session.mode.reset();
                    self.show_panel(chat, session, origin).await?;
                    return Ok(Some(Notice::alert("🔴 Batch Mode Disabled.")));
                }
                session.state = WizardState::WaitBatchSeasonInput;
                self.render(
                    chat,
                    origin,
                    BATCH_SEASON_PROMPT,
                    Some(&panel::batch_season_prompt()),
                )
                .await?;
                Ok(None)
            }
            CallbackAction::BatchSkipSeason => {
                let session = posting(slot, |state| state == WizardState::WaitBatchSeasonInput)?;
                session.custom_button = None;
                session.current_quality = None;
                session.mode.start_batch(None);
                session.state = WizardState::WaitFileUpload;
                self.render(
                    chat,
                    origin,
                    "🟢 Batch Mode Active (Default)\n\n👉 Send files now.\nNaming: Episode 1, Episode 2...",
                    Some(&panel::back_to_panel("🔙 Stop Batch")),
                )
                .await?;
                Ok(None)
            }
            CallbackAction::AddCustomButton => {
                let session = posting(slot, on_panel)?;
                session.state = WizardState::WaitCustomButtonName;
                self.render(
                    chat,
                    origin,
                    "📝 Enter Custom Button Name:\n(e.g. Episode 1, Zip File)",
                    None,
                )
                .await?;
                Ok(None)
            }
            CallbackAction::SetBadge => {
                let session = posting(slot, on_panel)?;
                session.state = WizardState::WaitBadgeText;
                self.render(
                    chat,
                    origin,
                    "✍️ Enter the text for the Badge:\n(e.g., 4K HDR, Dual Audio)",
                    None,
                )
                .await?;
                Ok(None)
            }
            CallbackAction::BackToPanel => {
                let session = posting(slot, |state| {
                    state.accepts_panel() || state == WizardState::WaitBatchSeasonInput
                })?;
                session.mode.reset();
                self.show_panel(chat, session, origin).await?;
                Ok(None)
            }
            CallbackAction::Finish => self.compile_preview(sender, slot, origin).await,
            CallbackAction::SendToChannel(target) => self.publish(sender, slot, target).await,
            CallbackAction::RepostFull => self.repost(sender, slot, origin, true).await,
            CallbackAction::RepostAlert => self.repost(sender, slot, origin, false).await,
            CallbackAction::ClosePost => {
                *slot = None;
                if let Some(message) = origin {
                    self.delete_quietly(message).await;
                }
                Ok(Some(Notice::alert("✅ Session Closed.")))
            }
        }
    }

    /// Compile caption, keyboard and poster, send the preview and offer the
    /// saved channels.
    async fn compile_preview(
        &self,
        sender: &Sender,
        slot: &mut Option<Session>,
        origin: Option<MessageRef>,
    ) -> Result<Option<Notice>> {
        let chat = sender.id.private_chat();
        let session = posting(slot, on_panel)?;
        if session.group_links.is_empty() {
            return Err(PostError::user_input("❌ No files uploaded!"));
        }

        let owner = self.deps.owners.get(sender.id).await?;
        let tutorial = owner.as_ref().and_then(|o| o.tutorial_url.as_deref());
        let compiled = self.compiler.compile(&session.group_links, tutorial);
        if let Some(first_omitted) = compiled.omitted_from {
            info!(user = %sender.id, first_omitted, "button ceiling reached, later episodes left out");
        }

        let caption = caption::channel_caption(
            &session.details,
            session.language_or_unknown(),
            self.settings.caption_footer.as_deref(),
        );

        let poster = match &session.details.poster {
            Some(poster) => {
                let watermark = owner.as_ref().and_then(|o| o.watermark_text.as_deref());
                let rendered = self
                    .deps
                    .poster
                    .render(poster, watermark, session.badge_text.as_deref())
                    .await?;
                let sent = self
                    .deps
                    .messenger
                    .send_photo(chat, &rendered, &caption, Some(&compiled.keyboard))
                    .await?;
                Some(sent.handle.map(PosterRef::Staged).unwrap_or(rendered))
            }
            None => {
                self.send(chat, &caption, Some(&compiled.keyboard)).await?;
                None
            }
        };

        if let Some(message) = origin {
            self.delete_quietly(message).await;
        }

        session.preview = Some(PreviewScratch {
            poster,
            caption,
            keyboard: compiled.keyboard,
        });
        session.state = WizardState::AwaitPublish;

        let channels = owner.map(|o| o.channel_ids).unwrap_or_default();
        if channels.is_empty() {
            self.say(chat, "⚠️ No Channels Saved! Add using /addchannel <id>.")
                .await?;
        }
        self.send(
            chat,
            "👇 Select Channel to Publish:",
            Some(&panel::channel_picker(&channels)),
        )
        .await?;
        Ok(None)
    }

    async fn publish(
        &self,
        sender: &Sender,
        slot: &mut Option<Session>,
        target: ChatId,
    ) -> Result<Option<Notice>> {
        let session = posting(slot, |state| state == WizardState::AwaitPublish)?;
        let preview = session
            .preview
            .as_ref()
            .ok_or(PostError::Expired(ExpiredKind::Session))?;

        let owner = self.deps.owners.get(sender.id).await?;
        if !owner.is_some_and(|o| o.channel_ids.contains(&target)) {
            return Err(PostError::user_input("❌ This channel is not in your list."));
        }

        let message = match &preview.poster {
            Some(poster) => {
                self.deps
                    .messenger
                    .send_photo(target, poster, &preview.caption, Some(&preview.keyboard))
                    .await?
                    .message
            }
            None => {
                self.deps
                    .messenger
                    .send_text(target, &preview.caption, Some(&preview.keyboard))
                    .await?
            }
        };

        self.deps
            .posts
            .save(&PublishedPost::new(
                message,
                sender.id,
                preview.keyboard.clone(),
            ))
            .await?;
        info!(user = %sender.id, channel = %target, message = %message.message, "post published");
        Ok(Some(Notice::alert(format!("✅ Posted to {target}"))))
    }

    async fn repost(
        &self,
        sender: &Sender,
        slot: &mut Option<Session>,
        origin: Option<MessageRef>,
        full: bool,
    ) -> Result<Option<Notice>> {
        let chat = sender.id.private_chat();
        let edit = slot
            .as_ref()
            .filter(|session| session.state == WizardState::AwaitRepost)
            .and_then(|session| session.edit.clone())
            .ok_or(PostError::Expired(ExpiredKind::Session))?;
        let post = edit.post;

        let done = if full {
            let fresh = self
                .deps
                .messenger
                .copy_message(post.message.chat, post.message, None, Some(&post.layout))
                .await?;
            self.deps
                .posts
                .save(&PublishedPost::new(fresh, sender.id, post.layout.clone()))
                .await?;
            "✅ Fresh Post Sent!"
        } else {
            let url = post_url(post.message, edit.channel_username.as_deref()).ok_or_else(|| {
                PostError::collaborator("update alert", "post has no public link")
            })?;
            let label = edit.added_label.as_deref().unwrap_or("New file");
            self.deps
                .messenger
                .send_text(
                    post.message.chat,
                    &format!("🔔 Update Alert!\n\n🆕 {label} has been added!\n👇 Click below to watch."),
                    Some(&panel::watch_now(&url)),
                )
                .await?;
            "✅ Alert Sent!"
        };

        *slot = None;
        self.render(chat, origin, done, None).await?;
        Ok(None)
    }

    // ---- helpers --------------------------------------------------------

    async fn show_panel(
        &self,
        chat: ChatId,
        session: &mut Session,
        origin: Option<MessageRef>,
    ) -> Result<()> {
        session.state = WizardState::Idle;
        let text = caption::panel_text(session);
        let keyboard = panel::upload_panel(&session.mode);
        let message = self.render(chat, origin, &text, Some(&keyboard)).await?;
        session.panel_message = Some(message);
        Ok(())
    }

    /// Edit `origin` in place when possible, otherwise send a new message.
    async fn render(
        &self,
        chat: ChatId,
        origin: Option<MessageRef>,
        text: &str,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<MessageRef> {
        if let Some(message) = origin {
            match self.deps.messenger.edit_text(message, text, keyboard).await {
                Ok(()) => return Ok(message),
                Err(e) => debug!(error = %e, "edit failed, sending a new message"),
            }
        }
        self.deps.messenger.send_text(chat, text, keyboard).await
    }

    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&KeyboardLayout>,
    ) -> Result<()> {
        self.deps.messenger.send_text(chat, text, keyboard).await?;
        Ok(())
    }

    async fn say(&self, chat: ChatId, text: &str) -> Result<()> {
        self.send(chat, text, None).await
    }

    async fn delete_quietly(&self, message: MessageRef) {
        if let Err(e) = self.deps.messenger.delete_message(message).await {
            debug!(error = %e, "message deletion failed");
        }
    }

    async fn archive(
        &self,
        user: UserId,
        file: &IncomingFile,
        item: &str,
        is_update: bool,
    ) -> Result<MessageRef> {
        let caption = caption::archive_caption(user, item, is_update);
        self.deps
            .messenger
            .copy_message(self.settings.archive_chat, file.origin, Some(&caption), None)
            .await
            .map_err(|e| PostError::collaborator("archive copy", e))
    }

    /// Long retrieval link, shortened with the owner's account when one is
    /// configured. Shortener failures fall back to the long link.
    async fn public_link(&self, owner: Option<&OwnerSettings>, code: &RetrievalCode) -> String {
        let long_url = self.links.retrieval_link(code);
        let Some(credentials) = owner.and_then(OwnerSettings::shortener) else {
            return long_url;
        };
        match self.deps.shortener.shorten(&credentials, &long_url).await {
            Ok(short) => short,
            Err(e) => {
                warn!(code = %code, domain = %credentials.domain, error = %e, "link shortening failed, using long link");
                long_url
            }
        }
    }

    async fn touch_user(&self, sender: &Sender) {
        if let Err(e) = self
            .deps
            .owners
            .upsert_user(sender.id, &sender.first_name)
            .await
        {
            warn!(user = %sender.id, error = %e, "failed to record user");
        }
    }

    async fn passes_gate(&self, sender: &Sender) -> Result<bool> {
        match self.deps.gate.check(sender.id).await {
            Ok(GateVerdict::Allowed) => Ok(true),
            Ok(GateVerdict::MustJoin { join_link }) => {
                self.send(
                    sender.id.private_chat(),
                    "❗ You must join our channel to use this bot.",
                    Some(&panel::join_channel(&join_link)),
                )
                .await?;
                Ok(false)
            }
            Err(e) => {
                warn!(user = %sender.id, error = %e, "membership check failed, letting user through");
                Ok(true)
            }
        }
    }

    async fn is_premium(&self, user: UserId) -> Result<bool> {
        if user == self.settings.owner_id {
            return Ok(true);
        }
        Ok(self
            .deps
            .owners
            .get(user)
            .await?
            .is_some_and(|settings| settings.is_premium))
    }

    async fn require_premium(&self, sender: &Sender) -> Result<bool> {
        if self.is_premium(sender.id).await? {
            return Ok(true);
        }
        self.send(
            sender.id.private_chat(),
            "⛔ Access Denied! Premium Feature\n\nPlease contact Admin to purchase.",
            Some(&panel::contact_admin(self.settings.owner_id)),
        )
        .await?;
        Ok(false)
    }
}

/// The session of the post-composition wizard when its state takes this
/// button. A wizard waiting for something else gets its corrective prompt and
/// keeps its state; no wizard at all means the session expired.
fn posting(
    slot: &mut Option<Session>,
    accepts: impl Fn(WizardState) -> bool,
) -> Result<&mut Session> {
    let session = slot
        .as_mut()
        .filter(|session| session.state.is_posting())
        .ok_or(PostError::Expired(ExpiredKind::Session))?;
    if accepts(session.state) {
        Ok(session)
    } else {
        Err(PostError::user_input(corrective_prompt(
            session.state.expected(),
        )))
    }
}

fn on_panel(state: WizardState) -> bool {
    state.accepts_panel()
}

fn corrective_prompt(expected: Expected) -> &'static str {
    match expected {
        Expected::Text => "❌ Please send text only.",
        Expected::Media => "❌ Please send a Video or Document file.",
        Expected::Photo => "❌ Please send a Photo.",
        Expected::Button | Expected::AnyMessage => "👆 Please use the buttons above.",
    }
}

fn is_skip(text: &str) -> bool {
    text.eq_ignore_ascii_case("skip")
}

fn normalize_domain(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

fn parse_channel(raw: Option<&str>, command: &str) -> Result<ChatId> {
    raw.and_then(|raw| raw.parse().ok())
        .ok_or_else(|| PostError::user_input(format!("❌ Usage: {command} -1001234567890")))
}

/// Group key, quality and label of the next upload. Auto-detect wins over
/// batch, batch over a custom button, a custom button over the picked
/// quality.
fn upload_target(session: &Session, file: &IncomingFile) -> Result<UploadTarget> {
    if session.mode.auto_detect {
        let name =
            MetadataExtractor::source_name(file.file_name.as_deref(), file.caption.as_deref());
        let extraction = MetadataExtractor::extract(name, DetectionMode::AutoDetect);
        let label = if extraction.episode.is_some() {
            format!("{} {}", extraction.key, extraction.quality)
        } else {
            extraction.key.to_string()
        };
        return Ok(UploadTarget {
            key: extraction.key,
            quality: extraction.quality,
            label,
        });
    }

    if session.mode.batch {
        let episode = session.mode.episode_counter.max(1);
        let name = match &session.mode.batch_prefix {
            Some(prefix) => format!("{prefix} E{episode}"),
            None => format!("Episode {episode}"),
        };
        return Ok(UploadTarget {
            key: GroupKey::new(name.clone()),
            quality: FALLBACK_QUALITY.to_string(),
            label: name,
        });
    }

    let label = session
        .custom_button
        .as_deref()
        .or(session.current_quality.as_deref())
        .ok_or_else(|| PostError::user_input("👆 Pick a quality on the panel first."))?;
    let extraction = MetadataExtractor::extract(label, DetectionMode::Manual { label });
    Ok(UploadTarget {
        key: extraction.key,
        quality: extraction.quality,
        label: label.to_string(),
    })
}

/// Episode buttons share the last link row while it has room; anything else
/// gets a row of its own. A trailing tutorial row stays last and rows holding
/// markers are never extended.
fn append_button(layout: &mut KeyboardLayout, button: ButtonSpec, name: &str) {
    let rows = layout.rows();
    let tutorial_last = rows.last().is_some_and(|row| is_tutorial_row(row));
    let content_end = rows.len() - usize::from(tutorial_last);

    if name.contains("Episode") && content_end > 0 {
        let shareable = layout.row_mut(content_end - 1).filter(|row| {
            row.len() < 3
                && row
                    .iter()
                    .all(|b| matches!(b.target, ButtonTarget::Link(_)))
        });
        if let Some(row) = shareable {
            row.push(button);
            return;
        }
    }
    layout.insert_row(content_end, vec![button]);
}

fn is_tutorial_row(row: &[ButtonSpec]) -> bool {
    matches!(row, [only] if only.label == TUTORIAL_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use postdeck_model::{ContentHandle, MessageId};

    fn file(name: Option<&str>) -> IncomingFile {
        IncomingFile {
            kind: FileKind::Document,
            handle: ContentHandle::new("file-1"),
            file_name: name.map(str::to_string),
            caption: None,
            origin: MessageRef::new(ChatId(9), MessageId(1)),
        }
    }

    #[test]
    fn auto_detect_names_group_by_episode() {
        let mut session = Session::new(WizardState::WaitFileUpload);
        session.mode.start_auto_detect();

        let target = upload_target(&session, &file(Some("Show.S01E05.720p.mkv"))).unwrap();
        assert_eq!(target.key, GroupKey::episodic(1, 5));
        assert_eq!(target.quality, "720p");
        assert_eq!(target.label, "S1 E5 720p");
    }

    #[test]
    fn batch_uses_prefix_and_counter() {
        let mut session = Session::new(WizardState::WaitFileUpload);
        session.mode.start_batch(Some("S2".into()));
        session.mode.episode_counter = 4;

        let target = upload_target(&session, &file(None)).unwrap();
        assert_eq!(target.key.as_str(), "S2 E4");
        assert_eq!(target.quality, FALLBACK_QUALITY);

        session.mode.start_batch(None);
        let target = upload_target(&session, &file(None)).unwrap();
        assert_eq!(target.label, "Episode 1");
    }

    #[test]
    fn custom_button_beats_picked_quality() {
        let mut session = Session::new(WizardState::WaitFileUpload);
        session.current_quality = Some("720p".into());
        assert_eq!(upload_target(&session, &file(None)).unwrap().label, "720p");

        session.custom_button = Some("Zip File".into());
        let target = upload_target(&session, &file(None)).unwrap();
        assert_eq!(target.key.as_str(), "Zip File");
    }

    #[test]
    fn upload_without_any_naming_is_rejected() {
        let session = Session::new(WizardState::WaitFileUpload);
        let err = upload_target(&session, &file(None)).unwrap_err();
        assert_eq!(err.kind(), ErrorClass::UserInput);
    }

    #[test]
    fn episode_buttons_fill_the_last_row_up_to_three() {
        let mut layout = KeyboardLayout::from_rows(vec![vec![
            ButtonSpec::link("Episode 1", "https://a"),
            ButtonSpec::link("Episode 2", "https://b"),
        ]]);
        append_button(&mut layout, ButtonSpec::link("Episode 3", "https://c"), "Episode 3");
        assert_eq!(layout.rows().len(), 1);

        append_button(&mut layout, ButtonSpec::link("Episode 4", "https://d"), "Episode 4");
        assert_eq!(layout.rows().len(), 2);

        append_button(&mut layout, ButtonSpec::link("Zip", "https://e"), "Zip");
        assert_eq!(layout.rows().len(), 3);
        assert_eq!(layout.button_count(), 5);
    }

    #[test]
    fn tutorial_row_stays_last() {
        let mut layout = KeyboardLayout::from_rows(vec![
            vec![ButtonSpec::link("Episode 1", "https://a")],
            vec![ButtonSpec::link(TUTORIAL_LABEL, "https://help")],
        ]);
        append_button(&mut layout, ButtonSpec::link("Episode 2", "https://b"), "Episode 2");
        append_button(&mut layout, ButtonSpec::link("Zip", "https://z"), "Zip");

        let labels: Vec<Vec<&str>> = layout
            .rows()
            .iter()
            .map(|row| row.iter().map(|b| b.label.as_str()).collect())
            .collect();
        assert_eq!(
            labels,
            vec![vec!["Episode 1", "Episode 2"], vec!["Zip"], vec![TUTORIAL_LABEL]]
        );
    }

    #[test]
    fn marker_rows_are_never_extended() {
        let mut layout = KeyboardLayout::from_rows(vec![
            vec![ButtonSpec::marker("🎬 Ep 1"), ButtonSpec::link("480p", "https://a")],
            vec![ButtonSpec::marker("⚠️ Limit Reached")],
        ]);
        append_button(&mut layout, ButtonSpec::link("Episode 2", "https://b"), "Episode 2");

        assert_eq!(layout.rows().len(), 3);
        assert_eq!(layout.rows()[1], vec![ButtonSpec::marker("⚠️ Limit Reached")]);
        assert_eq!(layout.rows()[2][0].label, "Episode 2");
    }

    #[test]
    fn domains_lose_scheme_and_trailing_slash() {
        assert_eq!(normalize_domain(" https://short.example/ "), "short.example");
    }
}
