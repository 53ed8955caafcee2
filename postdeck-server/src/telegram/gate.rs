use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use postdeck_core::error::{PostError, Result};
use postdeck_core::ports::{AccessGate, GateVerdict};
use postdeck_model::UserId;
use teloxide::prelude::*;
use teloxide::types::{self as tg, Recipient};
use tracing::debug;

/// Membership gate over a channel users must join. Confirmed members are
/// cached for `ttl`; everyone else is checked again on the next event.
#[derive(Debug)]
pub struct ChannelGate {
    bot: Bot,
    channel: Recipient,
    join_link: String,
    ttl: Duration,
    members: DashMap<UserId, Instant>,
}

impl ChannelGate {
    /// `channel` is a numeric chat id or an `@username`.
    pub fn new(bot: Bot, channel: &str, invite_link: Option<String>, ttl: Duration) -> Self {
        let channel = parse_recipient(channel);
        let join_link = invite_link.unwrap_or_else(|| match &channel {
            Recipient::ChannelUsername(name) => {
                format!("https://t.me/{}", name.trim_start_matches('@'))
            }
            Recipient::Id(_) => "https://t.me/".to_string(),
        });
        Self {
            bot,
            channel,
            join_link,
            ttl,
            members: DashMap::new(),
        }
    }

    fn is_cached_member(&self, user: UserId) -> bool {
        let fresh = self
            .members
            .get(&user)
            .map(|checked_at| checked_at.elapsed() < self.ttl);
        match fresh {
            Some(true) => true,
            Some(false) => {
                self.members.remove(&user);
                false
            }
            None => false,
        }
    }

    /// Remember a fresh check. Refusals are not kept so a user who joins
    /// passes on the next event.
    fn record_check(&self, user: UserId, is_member: bool) {
        self.members
            .retain(|_, checked_at| checked_at.elapsed() < self.ttl);
        if is_member {
            self.members.insert(user, Instant::now());
        }
    }

    async fn is_member(&self, user: UserId) -> Result<bool> {
        let user_id = u64::try_from(user.0)
            .map_err(|_| PostError::collaborator("membership check", "negative user id"))?;
        let member = self
            .bot
            .get_chat_member(self.channel.clone(), tg::UserId(user_id))
            .await
            .map_err(|e| PostError::collaborator("membership check", e))?;
        Ok(member.is_present())
    }
}

#[async_trait]
impl AccessGate for ChannelGate {
    async fn check(&self, user: UserId) -> Result<GateVerdict> {
        let is_member = if self.is_cached_member(user) {
            true
        } else {
            let is_member = self.is_member(user).await?;
            debug!(user = %user, is_member, "membership checked");
            self.record_check(user, is_member);
            is_member
        };

        Ok(if is_member {
            GateVerdict::Allowed
        } else {
            GateVerdict::MustJoin {
                join_link: self.join_link.clone(),
            }
        })
    }
}

fn parse_recipient(channel: &str) -> Recipient {
    let channel = channel.trim();
    match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(tg::ChatId(id)),
        Err(_) => Recipient::ChannelUsername(format!("@{}", channel.trim_start_matches('@'))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_parse_as_ids_or_usernames() {
        assert_eq!(
            parse_recipient("-1001234"),
            Recipient::Id(tg::ChatId(-1001234))
        );
        assert_eq!(
            parse_recipient("deck_news"),
            Recipient::ChannelUsername("@deck_news".into())
        );
        assert_eq!(
            parse_recipient("@deck_news"),
            Recipient::ChannelUsername("@deck_news".into())
        );
    }

    #[test]
    fn join_link_defaults_to_the_public_channel() {
        let gate = ChannelGate::new(
            Bot::new("123:abc"),
            "@deck_news",
            None,
            Duration::from_secs(300),
        );
        assert_eq!(gate.join_link, "https://t.me/deck_news");
    }

    fn gate(ttl: Duration) -> ChannelGate {
        ChannelGate::new(
            Bot::new("123:abc"),
            "-1001234",
            Some("https://t.me/+invite".into()),
            ttl,
        )
    }

    #[test]
    fn only_confirmed_members_are_remembered() {
        let gate = gate(Duration::from_secs(300));
        assert!(!gate.is_cached_member(UserId(5)));

        gate.record_check(UserId(5), true);
        gate.record_check(UserId(6), false);
        assert!(gate.is_cached_member(UserId(5)));
        assert!(!gate.is_cached_member(UserId(6)));
        assert_eq!(gate.members.len(), 1);
    }

    #[test]
    fn stale_members_are_dropped() {
        let gate = gate(Duration::ZERO);
        gate.record_check(UserId(5), true);
        gate.record_check(UserId(6), true);

        assert_eq!(gate.members.len(), 1, "older entries are swept on insert");
        assert!(!gate.is_cached_member(UserId(6)));
        assert!(gate.members.is_empty());
    }
}
