use crate::ids::{ChatId, UserId};

/// Link-shortener account of an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShortenerCredentials {
    pub api_key: String,
    /// Bare host of the shortener service, e.g. `short.example`.
    pub domain: String,
}

/// Per-user configuration written by the settings commands and read by the
/// posting flow.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnerSettings {
    pub user_id: UserId,
    pub first_name: String,
    pub is_premium: bool,
    pub watermark_text: Option<String>,
    pub shortener_api_key: Option<String>,
    pub shortener_domain: Option<String>,
    pub delete_timer_seconds: u32,
    pub channel_ids: Vec<ChatId>,
    pub tutorial_url: Option<String>,
}

impl OwnerSettings {
    pub fn new(user_id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            user_id,
            first_name: first_name.into(),
            is_premium: false,
            watermark_text: None,
            shortener_api_key: None,
            shortener_domain: None,
            delete_timer_seconds: 0,
            channel_ids: Vec::new(),
            tutorial_url: None,
        }
    }

    /// Both halves of the shortener account, if configured.
    pub fn shortener(&self) -> Option<ShortenerCredentials> {
        match (&self.shortener_api_key, &self.shortener_domain) {
            (Some(api_key), Some(domain)) => Some(ShortenerCredentials {
                api_key: api_key.clone(),
                domain: domain.clone(),
            }),
            _ => None,
        }
    }
}
