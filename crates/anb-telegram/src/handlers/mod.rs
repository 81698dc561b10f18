//! Telegram update handlers.
//!
//! Each handler is a thin adapter: it turns a Telegram update into a relay
//! event, runs it through the engine, and writes the resulting replies back
//! into the sender's chat. Event handling is serialized per sender so that
//! session transitions never interleave.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use anb_core::{domain::UserId, relay::InboundEvent, relay::OutboundAction};

use crate::router::AppState;

mod callback;
mod commands;
mod photo;
mod text;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let _ = bot;
    let Some(user) = msg.from() else {
        // Channel posts and service updates carry no sender.
        return Ok(());
    };
    if !msg.chat.is_private() {
        return Ok(());
    }
    let sender = UserId(user.id.0 as i64);

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(msg.clone(), state).await;
        }
    }

    // One event per sender at a time.
    let _guard = state.user_locks.lock_user(sender).await;

    if msg.text().is_some() {
        return text::handle_text(msg, state).await;
    }

    if msg.photo().is_some() {
        return photo::handle_photo(msg, state).await;
    }

    let actions = state.engine.handle_event(sender, InboundEvent::Unsupported).await;
    send_actions(&state, sender, actions).await;

    Ok(())
}

/// Writes engine output back to Telegram. Recipient deliveries already
/// happened inside the engine; they are only logged here.
pub(crate) async fn send_actions(state: &AppState, sender: UserId, actions: Vec<OutboundAction>) {
    for action in actions {
        match action {
            OutboundAction::SendToSender(text) => {
                if let Err(e) = state.messenger.send_text(sender, &text).await {
                    tracing::warn!(user = sender.0, error = %e, "failed to reply to sender");
                }
            }
            OutboundAction::SendToRecipient { recipient, payload } => {
                tracing::debug!(
                    recipient = recipient.0,
                    kind = payload.kind().as_str(),
                    "relay delivered"
                );
            }
        }
    }
}
