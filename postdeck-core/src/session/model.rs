use postdeck_model::{
    KeyboardLayout, MediaKind, MessageRef, PosterRef, PublishedPost, RetrievalCode, SubjectDetails,
};

use crate::conversation::event::IncomingFile;
use crate::layout::GroupLinks;
use crate::registry::GroupCodes;

/// Position of a user inside a conversation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardState {
    /// Upload panel shown, waiting for a button.
    Idle,
    WaitRequestText,
    AdminBroadcastWait,
    AdminAddPremiumWait,
    AdminRemovePremiumWait,
    WaitManualTitle,
    WaitManualYear,
    WaitManualRating,
    WaitManualGenres,
    WaitManualPoster,
    WaitLang,
    WaitCustomLang,
    WaitBadgeText,
    WaitCustomButtonName,
    WaitBatchSeasonInput,
    WaitFileUpload,
    WaitFileForEdit,
    WaitButtonNameForEdit,
    /// Preview sent, waiting for a channel choice.
    AwaitPublish,
    /// Edited post updated, waiting for a repost choice.
    AwaitRepost,
}

/// The single kind of message a state consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Text,
    /// Video or document.
    Media,
    Photo,
    /// Any message, copied as is.
    AnyMessage,
    Button,
}

impl WizardState {
    pub fn expected(&self) -> Expected {
        use WizardState::*;
        match self {
            WaitRequestText | AdminAddPremiumWait | AdminRemovePremiumWait | WaitManualTitle
            | WaitManualYear | WaitManualRating | WaitManualGenres | WaitCustomLang
            | WaitBadgeText | WaitCustomButtonName | WaitBatchSeasonInput
            | WaitButtonNameForEdit => Expected::Text,
            WaitFileUpload | WaitFileForEdit => Expected::Media,
            WaitManualPoster => Expected::Photo,
            AdminBroadcastWait => Expected::AnyMessage,
            Idle | WaitLang | AwaitPublish | AwaitRepost => Expected::Button,
        }
    }

    /// States of the post-composition wizard.
    pub fn is_posting(&self) -> bool {
        use WizardState::*;
        !matches!(
            self,
            WaitRequestText
                | AdminBroadcastWait
                | AdminAddPremiumWait
                | AdminRemovePremiumWait
                | WaitFileForEdit
                | WaitButtonNameForEdit
                | AwaitRepost
        )
    }

    /// States in which the upload panel's buttons are live: the panel itself,
    /// an upload in progress and a sent preview.
    pub fn accepts_panel(&self) -> bool {
        matches!(
            self,
            WizardState::Idle | WizardState::WaitFileUpload | WizardState::AwaitPublish
        )
    }

    pub fn name(&self) -> &'static str {
        use WizardState::*;
        match self {
            Idle => "idle",
            WaitRequestText => "wait_request_text",
            AdminBroadcastWait => "admin_broadcast_wait",
            AdminAddPremiumWait => "admin_add_premium_wait",
            AdminRemovePremiumWait => "admin_remove_premium_wait",
            WaitManualTitle => "wait_manual_title",
            WaitManualYear => "wait_manual_year",
            WaitManualRating => "wait_manual_rating",
            WaitManualGenres => "wait_manual_genres",
            WaitManualPoster => "wait_manual_poster",
            WaitLang => "wait_lang",
            WaitCustomLang => "wait_custom_lang",
            WaitBadgeText => "wait_badge_text",
            WaitCustomButtonName => "wait_custom_button_name",
            WaitBatchSeasonInput => "wait_batch_season_input",
            WaitFileUpload => "wait_file_upload",
            WaitFileForEdit => "wait_file_for_edit",
            WaitButtonNameForEdit => "wait_button_name_for_edit",
            AwaitPublish => "await_publish",
            AwaitRepost => "await_repost",
        }
    }
}

/// How the next uploaded file is named.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeFlags {
    pub auto_detect: bool,
    pub batch: bool,
    pub batch_prefix: Option<String>,
    pub episode_counter: u32,
}

impl ModeFlags {
    pub fn start_batch(&mut self, prefix: Option<String>) {
        self.auto_detect = false;
        self.batch = true;
        self.batch_prefix = prefix;
        self.episode_counter = 1;
    }

    pub fn start_auto_detect(&mut self) {
        self.auto_detect = true;
        self.batch = false;
        self.batch_prefix = None;
    }

    pub fn reset(&mut self) {
        self.auto_detect = false;
        self.batch = false;
        self.batch_prefix = None;
    }
}

/// Scratch data of the edit-existing-post flow.
#[derive(Debug, Clone, PartialEq)]
pub struct EditScratch {
    pub post: PublishedPost,
    /// Username of a public channel, for alert links.
    pub channel_username: Option<String>,
    pub pending_file: Option<IncomingFile>,
    /// Code and public link already minted for `pending_file`, reused when
    /// updating the post has to be retried.
    pub staged_link: Option<(RetrievalCode, String)>,
    pub added_label: Option<String>,
}

/// A compiled post waiting to be published.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewScratch {
    pub poster: Option<PosterRef>,
    pub caption: String,
    pub keyboard: KeyboardLayout,
}

/// Everything a user's in-progress conversation holds. Lives in memory
/// only; a restart loses it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub state: WizardState,
    pub details: SubjectDetails,
    pub is_manual: bool,
    pub language: Option<String>,
    pub group_links: GroupLinks,
    pub group_codes: GroupCodes,
    pub mode: ModeFlags,
    pub current_quality: Option<String>,
    pub custom_button: Option<String>,
    pub badge_text: Option<String>,
    pub edit: Option<EditScratch>,
    pub preview: Option<PreviewScratch>,
    /// Message the last panel or prompt was rendered into.
    pub panel_message: Option<MessageRef>,
}

impl Session {
    /// A session for a side flow that needs no subject.
    pub fn new(state: WizardState) -> Self {
        Self {
            state,
            details: SubjectDetails::default(),
            is_manual: false,
            language: None,
            group_links: GroupLinks::new(),
            group_codes: GroupCodes::new(),
            mode: ModeFlags::default(),
            current_quality: None,
            custom_button: None,
            badge_text: None,
            edit: None,
            preview: None,
            panel_message: None,
        }
    }

    /// Start of the manual wizard.
    pub fn manual(kind: MediaKind) -> Self {
        Self {
            details: SubjectDetails::for_kind(kind),
            is_manual: true,
            ..Self::new(WizardState::WaitManualTitle)
        }
    }

    /// A subject picked from the metadata service, waiting for a language.
    pub fn for_subject(details: SubjectDetails) -> Self {
        Self {
            details,
            ..Self::new(WizardState::WaitLang)
        }
    }

    pub fn for_edit(post: PublishedPost, channel_username: Option<String>) -> Self {
        Self {
            edit: Some(EditScratch {
                post,
                channel_username,
                pending_file: None,
                staged_link: None,
                added_label: None,
            }),
            ..Self::new(WizardState::WaitFileForEdit)
        }
    }

    pub fn language_or_unknown(&self) -> &str {
        self.language.as_deref().unwrap_or("Unknown")
    }
}
