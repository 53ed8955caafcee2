//! Message texts built from session data.

use postdeck_model::{SubjectDetails, UserId};

use crate::layout::GroupLinks;
use crate::session::{ModeFlags, Session};

const RULE: &str = "━━━━━━━━━━━━━━━━━━";

/// Groups listed in the panel status.
pub const PANEL_STATUS_GROUPS: usize = 10;

/// Caption stored with every uploaded file and replayed on retrieval.
pub fn file_caption(
    details: &SubjectDetails,
    language: &str,
    label: &str,
    bot_username: &str,
) -> String {
    format!(
        "🎬 {} ({})\n🔰 Quality: {label}\n🔊 Language: {language}\n🎭 Genre: {}\n{RULE}\n🤖 @{bot_username}",
        details.display_title(),
        details.display_year(),
        details.display_genres(),
    )
}

/// Caption of a file added to an already published post.
pub fn update_file_caption(label: &str, bot_username: &str) -> String {
    format!("🎬 {label}\n{RULE}\n🤖 @{bot_username}")
}

/// Caption of the archive copy of an upload.
pub fn archive_caption(user: UserId, item: &str, is_update: bool) -> String {
    let tag = if is_update { "#UPDATE_POST" } else { "#BACKUP" };
    format!("{tag}\nUser: {user}\nItem: {item}")
}

/// Caption of the channel post.
pub fn channel_caption(details: &SubjectDetails, language: &str, footer: Option<&str>) -> String {
    let mut caption = format!(
        "🎬 {} ({})\n{RULE}\n⭐ Rating: {}/10\n🎭 Genre: {}\n🔊 Language: {language}\n{RULE}\n👀 WATCH ONLINE/📤 DOWNLOAD\n👇 High Speed | No Buffering 👇",
        details.display_title(),
        details.display_year(),
        details.display_rating(),
        details.display_genres(),
    );
    if let Some(footer) = footer.map(str::trim).filter(|f| !f.is_empty()) {
        caption.push_str("\n\n");
        caption.push_str(footer);
    }
    caption
}

/// Status text of the upload panel.
pub fn panel_text(session: &Session) -> String {
    let mode = mode_text(&session.mode);
    let status = group_status(&session.group_links);
    let badge = session.badge_text.as_deref().unwrap_or("None");
    format!(
        "📂 File Manager\n{mode}\n\n{status}\n\n🏷 Badge: {badge}\n\n👇 Tap a button to upload a file for that quality:"
    )
}

fn mode_text(mode: &ModeFlags) -> String {
    if mode.auto_detect {
        "🟢 AUTO-DETECT MODE ACTIVE\n👉 Send many files at once.\nBot will detect S01E01 and Quality from Filename.".to_string()
    } else if mode.batch {
        match &mode.batch_prefix {
            Some(prefix) => format!("🟢 BATCH MODE ACTIVE\nFiles will be named: {prefix} E1..."),
            None => "🟢 BATCH MODE ACTIVE".to_string(),
        }
    } else {
        String::new()
    }
}

fn group_status(groups: &GroupLinks) -> String {
    if groups.is_empty() {
        return "No files added yet.".to_string();
    }
    groups
        .recent(PANEL_STATUS_GROUPS)
        .iter()
        .map(|group| {
            if group.key.episode().is_some() {
                format!("✅ {} [{}] Added", group.key, group.qualities.join(", "))
            } else {
                format!("✅ {} Added", group.key)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Label used for the batch-mode button toggle.
pub fn batch_toggle_label(mode: &ModeFlags) -> String {
    if mode.auto_detect {
        "🟢 Auto-Detect Mode: ON (File Name)".to_string()
    } else if mode.batch {
        match &mode.batch_prefix {
            Some(prefix) => format!("🟢 Batch ON ({prefix})"),
            None => "🟢 Batch Mode: ON".to_string(),
        }
    } else {
        "📦 Start Batch/Season Upload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::GroupKey;
    use crate::session::WizardState;
    use postdeck_model::MediaKind;

    fn details() -> SubjectDetails {
        SubjectDetails {
            kind: MediaKind::Tv,
            title: Some("Dark".into()),
            year: Some("2017".into()),
            rating: Some(8.7),
            genres: vec!["Crime".into(), "Drama".into(), "Mystery".into(), "Sci-Fi".into()],
            poster: None,
        }
    }

    #[test]
    fn file_caption_names_quality_and_bot() {
        let caption = file_caption(&details(), "Hindi", "S1 E1", "deck_bot");
        assert!(caption.starts_with("🎬 Dark (2017)\n🔰 Quality: S1 E1"));
        assert!(caption.contains("🎭 Genre: Crime, Drama, Mystery\n"));
        assert!(caption.ends_with("🤖 @deck_bot"));
    }

    #[test]
    fn channel_caption_appends_footer_only_when_set() {
        let plain = channel_caption(&details(), "English", None);
        assert!(plain.contains("⭐ Rating: 8.7/10"));
        assert!(plain.ends_with("No Buffering 👇"));

        let with_footer = channel_caption(&details(), "English", Some("Join @requests"));
        assert!(with_footer.ends_with("\n\nJoin @requests"));

        assert_eq!(channel_caption(&details(), "English", Some("  ")), plain);
    }

    #[test]
    fn panel_lists_only_recent_groups() {
        let mut session = Session::new(WizardState::Idle);
        for episode in 1..=12 {
            session.group_links.insert_new(
                GroupKey::episodic(1, episode),
                format!("https://short.example/{episode}"),
                "720p",
            );
        }
        session.group_links.add_quality(&GroupKey::episodic(1, 12), "1080p");

        let text = panel_text(&session);
        assert!(!text.contains("S1 E2 ["));
        assert!(text.contains("✅ S1 E3 [720p] Added"));
        assert!(text.contains("✅ S1 E12 [720p, 1080p] Added"));
        assert!(text.contains("🏷 Badge: None"));
    }

    #[test]
    fn empty_panel_says_so() {
        let session = Session::new(WizardState::Idle);
        assert!(panel_text(&session).contains("No files added yet."));
    }
}
