use std::sync::Arc;

use postdeck_core::conversation::{
    CallbackAction, Command, FileKind, Inbound, InboundEvent, IncomingFile, Sender, StateMachine,
};
use postdeck_model::{MessageRef, UserId};
use teloxide::prelude::*;
use teloxide::types::User;
use tracing::{debug, info};

use super::{MediaHandle, message_ref};

/// Run the long-polling dispatcher until the process is interrupted.
pub async fn run_dispatcher(bot: Bot, machine: Arc<StateMachine>) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    info!("dispatcher starting");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![machine])
        .default_handler(|update| async move {
            debug!(update_id = update.id.0, "unhandled update kind");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn on_message(msg: Message, machine: Arc<StateMachine>) -> ResponseResult<()> {
    if let Some(inbound) = classify_message(&msg) {
        machine.handle(inbound).await;
    }
    Ok(())
}

async fn on_callback(query: CallbackQuery, machine: Arc<StateMachine>) -> ResponseResult<()> {
    if let Some(inbound) = classify_callback(&query) {
        machine.handle(inbound).await;
    }
    Ok(())
}

fn sender_of(user: &User) -> Option<Sender> {
    Some(Sender {
        id: UserId(i64::try_from(user.id.0).ok()?),
        first_name: user.first_name.clone(),
    })
}

/// Private-chat messages only; groups and channels are ignored.
pub fn classify_message(msg: &Message) -> Option<Inbound> {
    if !msg.chat.is_private() {
        return None;
    }
    let sender = sender_of(msg.from.as_ref()?)?;
    let origin = message_ref(msg.chat.id, msg.id);
    let caption = msg.caption().map(str::to_string);

    let file = if let Some(video) = msg.video() {
        Some((FileKind::Video, video.file.id.to_string(), video.file_name.clone()))
    } else if let Some(document) = msg.document() {
        Some((
            FileKind::Document,
            document.file.id.to_string(),
            document.file_name.clone(),
        ))
    } else {
        msg.photo()
            .and_then(|sizes| sizes.last())
            .map(|size| (FileKind::Photo, size.file.id.to_string(), None))
    };

    let event = match file {
        Some((kind, file_id, file_name)) => InboundEvent::File(IncomingFile {
            kind,
            handle: MediaHandle::new(kind, file_id).into_content_handle(),
            file_name,
            caption,
            origin,
        }),
        None => text_event(origin, msg.text().unwrap_or_default()),
    };
    Some(Inbound::new(sender, event))
}

/// Commands are parsed once here; unknown commands and anything that is not
/// text (stickers, polls) reach the core as plain text.
pub fn text_event(message: MessageRef, text: &str) -> InboundEvent {
    match Command::parse(text) {
        Some(command) => InboundEvent::Command { message, command },
        None => InboundEvent::Text {
            message,
            text: text.to_string(),
        },
    }
}

pub fn classify_callback(query: &CallbackQuery) -> Option<Inbound> {
    let sender = sender_of(&query.from)?;
    let action = match query.data.as_deref().map(CallbackAction::decode) {
        Some(Ok(action)) => action,
        Some(Err(e)) => {
            debug!(user = %sender.id, error = %e, "undecodable callback");
            CallbackAction::Ignore
        }
        None => CallbackAction::Ignore,
    };
    let origin = query
        .regular_message()
        .map(|message| message_ref(message.chat.id, message.id));

    Some(Inbound::new(
        sender,
        InboundEvent::Callback {
            callback_id: query.id.to_string(),
            origin,
            action,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use postdeck_model::{ChatId, MessageId};

    fn origin() -> MessageRef {
        MessageRef::new(ChatId(5), MessageId(9))
    }

    #[test]
    fn known_commands_are_parsed() {
        assert_eq!(
            text_event(origin(), "/addchannel -1001234"),
            InboundEvent::Command {
                message: origin(),
                command: Command::AddChannel(Some("-1001234".into())),
            }
        );
    }

    #[test]
    fn unknown_commands_stay_text() {
        assert_eq!(
            text_event(origin(), "/help"),
            InboundEvent::Text {
                message: origin(),
                text: "/help".into(),
            }
        );
    }

    #[test]
    fn non_text_messages_become_empty_text() {
        assert_eq!(
            text_event(origin(), ""),
            InboundEvent::Text {
                message: origin(),
                text: String::new(),
            }
        );
    }
}
