/// Slash commands understood by the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start [code]`
    Start(Option<String>),
    /// `/post <name | TMDB url | IMDb url>`
    Post(String),
    Manual,
    /// `/addep <post link>`
    AddEpisode(Option<String>),
    SetWatermark(String),
    /// `/setapi <key> [domain]`
    SetApi {
        key: Option<String>,
        domain: Option<String>,
    },
    SetShortener(Option<String>),
    /// `/settimer [minutes]`, no argument disables deletion.
    SetTimer(Option<String>),
    AddChannel(Option<String>),
    DelChannel(Option<String>),
    MyChannels,
    SetTutorial(Option<String>),
}

impl Command {
    /// Parse `/name[@bot] args`. Returns `None` for plain text and unknown
    /// commands.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let body = text.strip_prefix('/')?;
        let (head, rest) = match body.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (body, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
        let mut args = rest.split_whitespace();
        let first = args.next().map(str::to_string);

        let command = match name.as_str() {
            "start" => Command::Start(first),
            "post" => Command::Post(rest.to_string()),
            "manual" => Command::Manual,
            "addep" => Command::AddEpisode(first),
            "setwatermark" => Command::SetWatermark(rest.to_string()),
            "setapi" => Command::SetApi {
                key: first,
                domain: args.next().map(str::to_string),
            },
            "setshortener" => Command::SetShortener(first),
            "settimer" => Command::SetTimer(first),
            "addchannel" => Command::AddChannel(first),
            "delchannel" => Command::DelChannel(first),
            "mychannels" => Command::MyChannels,
            "settutorial" => Command::SetTutorial(first),
            _ => return None,
        };
        Some(command)
    }

    /// Commands that begin a new conversation and replace any current one.
    pub fn starts_conversation(&self) -> bool {
        matches!(
            self,
            Command::Start(None) | Command::Post(_) | Command::Manual | Command::AddEpisode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_with_and_without_code() {
        assert_eq!(Command::parse("/start"), Some(Command::Start(None)));
        assert_eq!(
            Command::parse("/start Ab3dE6gH"),
            Some(Command::Start(Some("Ab3dE6gH".into())))
        );
    }

    #[test]
    fn bot_suffix_and_case_are_ignored() {
        assert_eq!(Command::parse("/Manual@deck_bot"), Some(Command::Manual));
    }

    #[test]
    fn post_keeps_the_whole_query() {
        assert_eq!(
            Command::parse("/post  The Dark Knight "),
            Some(Command::Post("The Dark Knight".into()))
        );
    }

    #[test]
    fn setapi_takes_optional_domain() {
        assert_eq!(
            Command::parse("/setapi k3y short.example"),
            Some(Command::SetApi {
                key: Some("k3y".into()),
                domain: Some("short.example".into())
            })
        );
        assert_eq!(
            Command::parse("/setapi"),
            Some(Command::SetApi {
                key: None,
                domain: None
            })
        );
    }

    #[test]
    fn plain_text_and_unknown_commands_are_not_commands() {
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse("/dance"), None);
    }
}
