use std::{env, time::Duration};

use anyhow::{Context, anyhow};
use postdeck_model::{ChatId, UserId};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BROADCAST_DELAY_MS: u64 = 50;
const DEFAULT_MEMBERSHIP_CACHE_SECS: u64 = 300;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Runtime configuration, read from the environment (and `.env` when
/// present).
#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub owner_id: UserId,
    /// Channel receiving backup copies and request notices.
    pub archive_chat: ChatId,
    /// Channel users must join, as a numeric id or `@username`.
    pub force_sub_channel: Option<String>,
    pub invite_link: Option<String>,
    pub tmdb_api_key: Option<String>,
    pub blog_url: Option<String>,
    pub caption_footer: Option<String>,

    pub database_url: Option<String>,
    pub database_max_connections: u32,

    pub server_host: String,
    pub server_port: u16,

    pub broadcast_delay: Duration,
    pub membership_cache: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("owner_id", &self.owner_id)
            .field("archive_chat", &self.archive_chat)
            .field("force_sub_channel", &self.force_sub_channel)
            .field("invite_link", &self.invite_link)
            .field("tmdb_api_key", &self.tmdb_api_key.as_ref().map(|_| "<redacted>"))
            .field("blog_url", &self.blog_url)
            .field("caption_footer", &self.caption_footer)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("database_max_connections", &self.database_max_connections)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("broadcast_delay", &self.broadcast_delay)
            .field("membership_cache", &self.membership_cache)
            .finish()
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source. Empty
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{key} must be set"));

        let owner_id: i64 = required("OWNER_ID")?
            .parse()
            .context("OWNER_ID must be a numeric user id")?;
        let archive_chat: i64 = required("LOG_CHANNEL_ID")?
            .parse()
            .context("LOG_CHANNEL_ID must be a numeric chat id")?;

        let server_port = match get("PORT") {
            Some(raw) => raw.parse().context("PORT must be a port number")?,
            None => DEFAULT_PORT,
        };
        let broadcast_delay_ms = match get("BROADCAST_DELAY_MS") {
            Some(raw) => raw
                .parse()
                .context("BROADCAST_DELAY_MS must be a number of milliseconds")?,
            None => DEFAULT_BROADCAST_DELAY_MS,
        };
        let membership_cache_secs = match get("MEMBERSHIP_CACHE_SECS") {
            Some(raw) => raw
                .parse()
                .context("MEMBERSHIP_CACHE_SECS must be a number of seconds")?,
            None => DEFAULT_MEMBERSHIP_CACHE_SECS,
        };
        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            None => DEFAULT_DATABASE_MAX_CONNECTIONS,
        };

        Ok(Self {
            bot_token: required("BOT_TOKEN")?,
            owner_id: UserId(owner_id),
            archive_chat: ChatId(archive_chat),
            force_sub_channel: get("FORCE_SUB_CHANNEL"),
            invite_link: get("INVITE_LINK"),
            tmdb_api_key: get("TMDB_API_KEY"),
            blog_url: get("BLOG_URL").map(|url| url.trim_end_matches('/').to_string()),
            caption_footer: get("CAPTION_FOOTER"),
            database_url: get("DATABASE_URL"),
            database_max_connections,
            server_host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            server_port,
            broadcast_delay: Duration::from_millis(broadcast_delay_ms),
            membership_cache: Duration::from_secs(membership_cache_secs),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
