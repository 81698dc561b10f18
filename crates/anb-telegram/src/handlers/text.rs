use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use anb_core::{domain::UserId, relay::InboundEvent};

use crate::router::AppState;

use super::send_actions;

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let sender = UserId(user.id.0 as i64);
    let content = msg.text().unwrap_or("").to_string();

    let actions = state
        .engine
        .handle_event(sender, InboundEvent::Text { content })
        .await;
    send_actions(&state, sender, actions).await;

    Ok(())
}
