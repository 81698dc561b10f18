use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use anb_core::{domain::UserId, relay::InboundEvent};

use crate::router::AppState;

use super::send_actions;

pub async fn handle_photo(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let sender = UserId(user.id.0 as i64);

    // Sizes are ordered smallest to largest; relay the largest rendition.
    let Some(best) = msg.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };
    let file_id = best.file.id.clone();
    let caption = msg.caption().map(str::to_string);

    let actions = state
        .engine
        .handle_event(sender, InboundEvent::Photo { file_id, caption })
        .await;
    send_actions(&state, sender, actions).await;

    Ok(())
}
