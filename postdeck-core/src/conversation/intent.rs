//! Button actions, decoded once from their callback tokens.

use std::fmt;
use std::str::FromStr;

use postdeck_model::{ChatId, MediaKind};
use thiserror::Error;

/// Presets offered on the language keyboard.
pub const PRESET_LANGUAGES: [&str; 4] = ["English", "Hindi", "Bengali", "Dual Audio"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageChoice {
    Preset(String),
    Custom,
}

/// Every action a button can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    AdminBroadcast,
    AdminStats,
    AdminAddPremium,
    AdminRemovePremium,
    MyAccount,
    ApiHelp,
    RequestMovie,
    CancelRequest,
    ManualType(MediaKind),
    Select { kind: MediaKind, id: u64 },
    Language(LanguageChoice),
    Upload(String),
    ToggleAutoDetect,
    ToggleBatch,
    BatchSkipSeason,
    AddCustomButton,
    SetBadge,
    BackToPanel,
    Finish,
    SendToChannel(ChatId),
    RepostFull,
    RepostAlert,
    ClosePost,
    /// Informational button, nothing to do.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown callback token: {0}")]
pub struct UnknownAction(pub String);

impl CallbackAction {
    pub fn decode(token: &str) -> Result<Self, UnknownAction> {
        let unknown = || UnknownAction(token.to_string());

        let action = match token {
            "admin_broadcast" => CallbackAction::AdminBroadcast,
            "admin_stats" => CallbackAction::AdminStats,
            "admin_add_premium" => CallbackAction::AdminAddPremium,
            "admin_rem_premium" => CallbackAction::AdminRemovePremium,
            "my_account" => CallbackAction::MyAccount,
            "api_help" => CallbackAction::ApiHelp,
            "request_movie" => CallbackAction::RequestMovie,
            "cancel_req" => CallbackAction::CancelRequest,
            "toggle_auto_detect" => CallbackAction::ToggleAutoDetect,
            "toggle_batch" => CallbackAction::ToggleBatch,
            "batch_skip_season" => CallbackAction::BatchSkipSeason,
            "add_custom_btn" => CallbackAction::AddCustomButton,
            "set_badge" => CallbackAction::SetBadge,
            "back_panel" => CallbackAction::BackToPanel,
            "proc_final" => CallbackAction::Finish,
            "repost_full" => CallbackAction::RepostFull,
            "repost_alert" => CallbackAction::RepostAlert,
            "close_post" => CallbackAction::ClosePost,
            "ignore" => CallbackAction::Ignore,
            "lang_custom" => CallbackAction::Language(LanguageChoice::Custom),
            _ => {
                if let Some(kind) = token.strip_prefix("manual_type_") {
                    CallbackAction::ManualType(MediaKind::parse(kind).ok_or_else(unknown)?)
                } else if let Some(rest) = token.strip_prefix("sel_") {
                    let (kind, id) = rest.split_once('_').ok_or_else(unknown)?;
                    CallbackAction::Select {
                        kind: MediaKind::parse(kind).ok_or_else(unknown)?,
                        id: id.parse().map_err(|_| unknown())?,
                    }
                } else if let Some(language) = token.strip_prefix("lang_") {
                    if language.is_empty() {
                        return Err(unknown());
                    }
                    CallbackAction::Language(LanguageChoice::Preset(language.to_string()))
                } else if let Some(quality) = token.strip_prefix("up_") {
                    if quality.is_empty() {
                        return Err(unknown());
                    }
                    CallbackAction::Upload(quality.to_string())
                } else if let Some(chat) = token.strip_prefix("sndch_") {
                    CallbackAction::SendToChannel(chat.parse().map_err(|_| unknown())?)
                } else {
                    return Err(unknown());
                }
            }
        };
        Ok(action)
    }

    pub fn encode(&self) -> String {
        match self {
            CallbackAction::AdminBroadcast => "admin_broadcast".into(),
            CallbackAction::AdminStats => "admin_stats".into(),
            CallbackAction::AdminAddPremium => "admin_add_premium".into(),
            CallbackAction::AdminRemovePremium => "admin_rem_premium".into(),
            CallbackAction::MyAccount => "my_account".into(),
            CallbackAction::ApiHelp => "api_help".into(),
            CallbackAction::RequestMovie => "request_movie".into(),
            CallbackAction::CancelRequest => "cancel_req".into(),
            CallbackAction::ManualType(kind) => format!("manual_type_{kind}"),
            CallbackAction::Select { kind, id } => format!("sel_{kind}_{id}"),
            CallbackAction::Language(LanguageChoice::Preset(language)) => format!("lang_{language}"),
            CallbackAction::Language(LanguageChoice::Custom) => "lang_custom".into(),
            CallbackAction::Upload(quality) => format!("up_{quality}"),
            CallbackAction::ToggleAutoDetect => "toggle_auto_detect".into(),
            CallbackAction::ToggleBatch => "toggle_batch".into(),
            CallbackAction::BatchSkipSeason => "batch_skip_season".into(),
            CallbackAction::AddCustomButton => "add_custom_btn".into(),
            CallbackAction::SetBadge => "set_badge".into(),
            CallbackAction::BackToPanel => "back_panel".into(),
            CallbackAction::Finish => "proc_final".into(),
            CallbackAction::SendToChannel(chat) => format!("sndch_{chat}"),
            CallbackAction::RepostFull => "repost_full".into(),
            CallbackAction::RepostAlert => "repost_alert".into(),
            CallbackAction::ClosePost => "close_post".into(),
            CallbackAction::Ignore => "ignore".into(),
        }
    }

    /// Actions that only make sense for the bot owner.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            CallbackAction::AdminBroadcast
                | CallbackAction::AdminStats
                | CallbackAction::AdminAddPremium
                | CallbackAction::AdminRemovePremium
        )
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for CallbackAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_tokens_carry_their_payload() {
        assert_eq!(
            CallbackAction::decode("sel_tv_1399").unwrap(),
            CallbackAction::Select {
                kind: MediaKind::Tv,
                id: 1399
            }
        );
        assert_eq!(
            CallbackAction::decode("lang_Dual Audio").unwrap(),
            CallbackAction::Language(LanguageChoice::Preset("Dual Audio".into()))
        );
        assert_eq!(
            CallbackAction::decode("sndch_-1001234").unwrap(),
            CallbackAction::SendToChannel(ChatId(-1001234))
        );
        assert_eq!(
            CallbackAction::decode("up_720p").unwrap(),
            CallbackAction::Upload("720p".into())
        );
    }

    #[test]
    fn fixed_tokens_survive_encoding() {
        for action in [
            CallbackAction::ToggleAutoDetect,
            CallbackAction::Finish,
            CallbackAction::ManualType(MediaKind::Movie),
            CallbackAction::Language(LanguageChoice::Custom),
            CallbackAction::AdminRemovePremium,
            CallbackAction::Ignore,
        ] {
            assert_eq!(CallbackAction::decode(&action.encode()).unwrap(), action);
        }
    }

    #[test]
    fn unknown_or_malformed_tokens_are_rejected() {
        for token in ["", "bogus", "sel_book_1", "sel_movie_x", "up_", "sndch_abc", "manual_type_game"] {
            assert!(CallbackAction::decode(token).is_err(), "{token}");
        }
    }
}
