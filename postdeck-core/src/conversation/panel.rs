//! Keyboards shown during a conversation.

use postdeck_model::{ButtonSpec, ChatId, KeyboardLayout, MediaKind, UserId};

use super::caption::batch_toggle_label;
use super::intent::{CallbackAction, LanguageChoice, PRESET_LANGUAGES};
use crate::ports::SearchHit;
use crate::session::ModeFlags;

fn button(label: impl Into<String>, action: CallbackAction) -> ButtonSpec {
    ButtonSpec::callback(label, action.encode())
}

/// Link that opens a private chat with `user`.
pub fn user_link(user: UserId) -> String {
    format!("tg://user?id={user}")
}

pub fn upload_panel(mode: &ModeFlags) -> KeyboardLayout {
    let mut buttons: Vec<ButtonSpec> = ["480p", "720p", "1080p"]
        .into_iter()
        .map(|q| button(format!("📤 Upload {q}"), CallbackAction::Upload(q.to_string())))
        .collect();
    buttons.extend([
        button("📂 Auto-Detect (Web Series)", CallbackAction::ToggleAutoDetect),
        button(batch_toggle_label(mode), CallbackAction::ToggleBatch),
        button("➕ Custom Button / Episode", CallbackAction::AddCustomButton),
        button("🎨 Add Badge", CallbackAction::SetBadge),
        button("✅ FINISH & POST", CallbackAction::Finish),
    ]);
    KeyboardLayout::single_column(buttons)
}

pub fn language_keyboard() -> KeyboardLayout {
    let preset = |language: &str| {
        button(
            language,
            CallbackAction::Language(LanguageChoice::Preset(language.to_string())),
        )
    };
    let mut rows: Vec<Vec<ButtonSpec>> = PRESET_LANGUAGES
        .chunks(2)
        .map(|pair| pair.iter().map(|language| preset(language)).collect())
        .collect();
    rows.push(vec![button(
        "✍️ Custom Language",
        CallbackAction::Language(LanguageChoice::Custom),
    )]);
    KeyboardLayout::from_rows(rows)
}

pub fn manual_type_keyboard() -> KeyboardLayout {
    KeyboardLayout::from_rows(vec![vec![
        button("🎬 Movie", CallbackAction::ManualType(MediaKind::Movie)),
        button("📺 Web Series", CallbackAction::ManualType(MediaKind::Tv)),
    ]])
}

pub fn search_results(hits: &[SearchHit]) -> KeyboardLayout {
    KeyboardLayout::single_column(hits.iter().map(|hit| {
        button(
            hit.label(),
            CallbackAction::Select {
                kind: hit.kind,
                id: hit.id,
            },
        )
    }))
}

pub fn admin_menu() -> KeyboardLayout {
    KeyboardLayout::from_rows(vec![
        vec![
            button("📢 Broadcast", CallbackAction::AdminBroadcast),
            button("📊 Stats", CallbackAction::AdminStats),
        ],
        vec![
            button("➕ Add Premium", CallbackAction::AdminAddPremium),
            button("➖ Remove Premium", CallbackAction::AdminRemovePremium),
        ],
        vec![button("⚙️ Setup Instructions", CallbackAction::ApiHelp)],
    ])
}

pub fn user_menu(is_premium: bool, owner: UserId) -> KeyboardLayout {
    let mut rows = Vec::new();
    if !is_premium {
        rows.push(vec![ButtonSpec::link("💎 Buy Premium Access", user_link(owner))]);
    }
    rows.push(vec![button("👤 My Account", CallbackAction::MyAccount)]);
    rows.push(vec![button("🙏 Request Movie", CallbackAction::RequestMovie)]);
    KeyboardLayout::from_rows(rows)
}

pub fn contact_admin(owner: UserId) -> KeyboardLayout {
    KeyboardLayout::single_column([ButtonSpec::link("👑 Contact Admin", user_link(owner))])
}

pub fn join_channel(join_link: &str) -> KeyboardLayout {
    KeyboardLayout::single_column([ButtonSpec::link("👉 Join Channel", join_link)])
}

pub fn cancel_request() -> KeyboardLayout {
    KeyboardLayout::single_column([button("❌ Cancel", CallbackAction::CancelRequest)])
}

/// A single button leading back to the upload panel.
pub fn back_to_panel(label: &str) -> KeyboardLayout {
    KeyboardLayout::single_column([button(label, CallbackAction::BackToPanel)])
}

pub fn batch_season_prompt() -> KeyboardLayout {
    KeyboardLayout::single_column([
        button("⏭ SKIP (Default)", CallbackAction::BatchSkipSeason),
        button("❌ Cancel", CallbackAction::BackToPanel),
    ])
}

pub fn auto_detect_progress() -> KeyboardLayout {
    KeyboardLayout::single_column([button("✅ DONE", CallbackAction::Finish)])
}

pub fn channel_picker(channels: &[ChatId]) -> KeyboardLayout {
    let mut buttons: Vec<ButtonSpec> = channels
        .iter()
        .map(|chat| button(format!("📢 Post to: {chat}"), CallbackAction::SendToChannel(*chat)))
        .collect();
    buttons.push(button("✅ DONE / CLOSE", CallbackAction::ClosePost));
    KeyboardLayout::single_column(buttons)
}

pub fn repost_options() -> KeyboardLayout {
    KeyboardLayout::single_column([
        button("🚀 Repost Full Post", CallbackAction::RepostFull),
        button("🔔 Send Alert Only", CallbackAction::RepostAlert),
        button("❌ Done", CallbackAction::ClosePost),
    ])
}

pub fn watch_now(post_url: &str) -> KeyboardLayout {
    KeyboardLayout::single_column([ButtonSpec::link("🎬 Watch Now", post_url)])
}
