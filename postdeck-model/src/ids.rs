use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Platform user identifier. In private chats it doubles as the chat id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserId(pub i64);

impl UserId {
    /// The private chat shared between the bot and this user.
    pub fn private_chat(self) -> ChatId {
        ChatId(self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| ModelError::InvalidIdentifier(s.to_string()))
    }
}

/// Chat identifier: a private chat, a group, or a channel (`-100…`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChatId(pub i64);

impl ChatId {
    const CHANNEL_PREFIX: &'static str = "-100";

    /// Build a channel id from the bare numeric part used in `t.me/c/<id>`
    /// links.
    pub fn from_channel_suffix(suffix: &str) -> Result<Self, ModelError> {
        if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
            return Err(ModelError::InvalidIdentifier(suffix.to_string()));
        }
        format!("{}{suffix}", Self::CHANNEL_PREFIX).parse()
    }

    /// The part after `-100` for channel ids, used when linking to posts in
    /// private channels.
    pub fn channel_suffix(&self) -> Option<String> {
        self.0
            .to_string()
            .strip_prefix(Self::CHANNEL_PREFIX)
            .map(str::to_string)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChatId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| ModelError::InvalidIdentifier(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageId(pub i32);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message addressed by chat and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageRef {
    pub chat: ChatId,
    pub message: MessageId,
}

impl MessageRef {
    pub fn new(chat: ChatId, message: MessageId) -> Self {
        Self { chat, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_suffix_round_trips_through_private_links() {
        let chat = ChatId::from_channel_suffix("1234567890").unwrap();
        assert_eq!(chat, ChatId(-1001234567890));
        assert_eq!(chat.channel_suffix().as_deref(), Some("1234567890"));
    }

    #[test]
    fn non_numeric_suffix_is_rejected() {
        assert!(ChatId::from_channel_suffix("abc").is_err());
        assert!(ChatId::from_channel_suffix("").is_err());
    }

    #[test]
    fn plain_chats_have_no_channel_suffix() {
        assert_eq!(ChatId(42).channel_suffix(), None);
    }
}
