use async_trait::async_trait;
use postdeck_model::{ChatId, OwnerSettings, UserId};

use crate::error::Result;

/// One mutation of an owner's settings. Applying a change creates the user
/// row when it does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerSettingChange {
    Watermark(Option<String>),
    ShortenerApiKey(String),
    ShortenerDomain(String),
    DeleteTimer(u32),
    AddChannel(ChatId),
    RemoveChannel(ChatId),
    Tutorial(Option<String>),
    Premium(bool),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserCounts {
    pub total: u64,
    pub premium: u64,
}

#[async_trait]
pub trait OwnerRepository: Send + Sync {
    /// Record that a user talked to the bot, refreshing the display name.
    async fn upsert_user(&self, user: UserId, first_name: &str) -> Result<()>;

    async fn get(&self, user: UserId) -> Result<Option<OwnerSettings>>;

    async fn apply(&self, user: UserId, change: OwnerSettingChange) -> Result<OwnerSettings>;

    async fn list_user_ids(&self) -> Result<Vec<UserId>>;

    async fn counts(&self) -> Result<UserCounts>;
}

/// Applies `change` to an in-memory settings value. Shared by adapters that
/// do not express the change in their own query language.
pub fn apply_change(settings: &mut OwnerSettings, change: OwnerSettingChange) {
    match change {
        OwnerSettingChange::Watermark(text) => settings.watermark_text = text,
        OwnerSettingChange::ShortenerApiKey(key) => settings.shortener_api_key = Some(key),
        OwnerSettingChange::ShortenerDomain(domain) => settings.shortener_domain = Some(domain),
        OwnerSettingChange::DeleteTimer(seconds) => settings.delete_timer_seconds = seconds,
        OwnerSettingChange::AddChannel(chat) => {
            if !settings.channel_ids.contains(&chat) {
                settings.channel_ids.push(chat);
            }
        }
        OwnerSettingChange::RemoveChannel(chat) => settings.channel_ids.retain(|c| *c != chat),
        OwnerSettingChange::Tutorial(url) => settings.tutorial_url = url,
        OwnerSettingChange::Premium(flag) => settings.is_premium = flag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_behave_like_a_set() {
        let mut settings = OwnerSettings::new(UserId(7), "Owner");
        apply_change(&mut settings, OwnerSettingChange::AddChannel(ChatId(-1001)));
        apply_change(&mut settings, OwnerSettingChange::AddChannel(ChatId(-1001)));
        apply_change(&mut settings, OwnerSettingChange::AddChannel(ChatId(-1002)));
        assert_eq!(settings.channel_ids, vec![ChatId(-1001), ChatId(-1002)]);

        apply_change(&mut settings, OwnerSettingChange::RemoveChannel(ChatId(-1001)));
        assert_eq!(settings.channel_ids, vec![ChatId(-1002)]);
    }
}
