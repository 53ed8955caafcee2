//! Public links: retrieval deep links and channel post references.

use postdeck_model::{ChatId, MessageId, MessageRef, RetrievalCode};
use url::Url;

use crate::error::{PostError, Result};

/// Builds the long URL a retrieval code is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    bot_username: String,
    blog_url: Option<String>,
}

impl LinkBuilder {
    pub fn new(bot_username: impl Into<String>, blog_url: Option<String>) -> Self {
        let blog_url = blog_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| url.starts_with("http"));
        Self {
            bot_username: bot_username.into().trim_start_matches('@').to_string(),
            blog_url,
        }
    }

    /// `<blog>/?code=<code>` when a redirect page is configured, otherwise
    /// the bot deep link.
    pub fn retrieval_link(&self, code: &RetrievalCode) -> String {
        match &self.blog_url {
            Some(blog) => format!("{blog}/?code={code}"),
            None => format!("https://t.me/{}?start={code}", self.bot_username),
        }
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }
}

/// A channel post named by a `t.me` link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostLink {
    /// `t.me/c/<id>/<msg>`: private channel, id known.
    Private(MessageRef),
    /// `t.me/<username>/<msg>`: public channel, id still to be resolved.
    Public { username: String, message: MessageId },
}

impl PostLink {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || PostError::user_input("❌ Invalid link format! Send a link like https://t.me/c/123/45");

        let trimmed = raw.trim();
        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
        match url.host_str() {
            Some("t.me") | Some("telegram.me") | Some("www.t.me") => {}
            _ => return Err(invalid()),
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            ["c", chat, message, ..] => {
                let chat = ChatId::from_channel_suffix(chat).map_err(|_| invalid())?;
                let message = parse_message_id(message).ok_or_else(invalid)?;
                Ok(PostLink::Private(MessageRef::new(chat, message)))
            }
            [username, message] => {
                let message = parse_message_id(message).ok_or_else(invalid)?;
                Ok(PostLink::Public {
                    username: (*username).to_string(),
                    message,
                })
            }
            _ => Err(invalid()),
        }
    }
}

fn parse_message_id(raw: &str) -> Option<MessageId> {
    raw.parse::<i32>().ok().filter(|id| *id > 0).map(MessageId)
}

/// Link to a channel post, for update alerts.
pub fn post_url(post: MessageRef, username: Option<&str>) -> Option<String> {
    if let Some(suffix) = post.chat.channel_suffix() {
        return Some(format!("https://t.me/c/{suffix}/{}", post.message));
    }
    username.map(|name| {
        format!(
            "https://t.me/{}/{}",
            name.trim_start_matches('@'),
            post.message
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> RetrievalCode {
        RetrievalCode::parse("Ab3dE6gH").unwrap()
    }

    #[test]
    fn deep_link_without_blog() {
        let links = LinkBuilder::new("@deck_bot", None);
        assert_eq!(
            links.retrieval_link(&code()),
            "https://t.me/deck_bot?start=Ab3dE6gH"
        );
    }

    #[test]
    fn blog_redirect_when_configured() {
        let links = LinkBuilder::new("deck_bot", Some("https://blog.example/".into()));
        assert_eq!(
            links.retrieval_link(&code()),
            "https://blog.example/?code=Ab3dE6gH"
        );

        // not a URL, ignored
        let links = LinkBuilder::new("deck_bot", Some("blog".into()));
        assert!(links.retrieval_link(&code()).starts_with("https://t.me/"));
    }

    #[test]
    fn private_post_links_map_to_channel_ids() {
        assert_eq!(
            PostLink::parse("https://t.me/c/1234567890/42").unwrap(),
            PostLink::Private(MessageRef::new(ChatId(-1001234567890), MessageId(42)))
        );
    }

    #[test]
    fn public_post_links_keep_the_username() {
        assert_eq!(
            PostLink::parse("t.me/moviehub/7").unwrap(),
            PostLink::Public {
                username: "moviehub".into(),
                message: MessageId(7)
            }
        );
    }

    #[test]
    fn malformed_links_are_user_errors() {
        for raw in ["https://example.com/c/1/2", "https://t.me/c/abc/2", "t.me/onlyname", "nonsense"] {
            let err = PostLink::parse(raw).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorClass::UserInput, "{raw}");
        }
    }

    #[test]
    fn post_url_prefers_private_form() {
        let post = MessageRef::new(ChatId(-1009), MessageId(3));
        assert_eq!(post_url(post, None).as_deref(), Some("https://t.me/c/9/3"));

        let public = MessageRef::new(ChatId(55), MessageId(3));
        assert_eq!(
            post_url(public, Some("@chan")).as_deref(),
            Some("https://t.me/chan/3")
        );
        assert_eq!(post_url(public, None), None);
    }
}
