use std::sync::Arc;

use teloxide::{prelude::*, types::CallbackQuery};

use anb_core::{domain::UserId, relay::InboundEvent, texts, token};

use crate::router::AppState;

use super::send_actions;

/// Inline-button presses on delivered relays. Data is `<verb>:<token>` where
/// the token identifies the original sender without revealing them.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let cb_id = q.id.clone();
    let user = q.from.clone();
    let data = q.data.clone().unwrap_or_default();

    if data.is_empty() {
        let _ = bot.answer_callback_query(cb_id).await;
        return Ok(());
    }

    let presser = UserId(user.id.0 as i64);
    let Some((verb, raw_token)) = data.split_once(':') else {
        let _ = bot.answer_callback_query(cb_id).await;
        return Ok(());
    };

    let _guard = state.user_locks.lock_user(presser).await;

    match verb {
        "reply" => {
            let _ = bot.answer_callback_query(cb_id).await;
            let actions = state
                .engine
                .handle_event(
                    presser,
                    InboundEvent::OpenReply {
                        token: raw_token.to_string(),
                    },
                )
                .await;
            send_actions(&state, presser, actions).await;
        }
        "block" => {
            let Ok(target) = token::decode(raw_token) else {
                let _ = bot
                    .answer_callback_query(cb_id)
                    .text(texts::invalid_link().to_string())
                    .await;
                return Ok(());
            };
            match state.store.block(presser, target, None).await {
                Ok(()) => {
                    let _ = bot.answer_callback_query(cb_id).await;
                    tracing::info!(blocker = presser.0, "sender blocked via button");
                    let undo = vec![("🔓 Undo".to_string(), format!("unblock:{raw_token}"))];
                    if let Err(e) = state
                        .messenger
                        .send_text_with_buttons(presser, texts::blocked_sender(), undo)
                        .await
                    {
                        tracing::warn!(user = presser.0, error = %e, "failed to confirm block");
                    }
                }
                Err(e) => {
                    tracing::warn!(blocker = presser.0, error = %e, "failed to record block");
                    let _ = bot
                        .answer_callback_query(cb_id)
                        .text(texts::temporary_failure().to_string())
                        .await;
                }
            }
        }
        "report" => {
            let Ok(target) = token::decode(raw_token) else {
                let _ = bot
                    .answer_callback_query(cb_id)
                    .text(texts::invalid_link().to_string())
                    .await;
                return Ok(());
            };
            match state.store.report(presser, target, None).await {
                Ok(()) => {
                    tracing::info!(reporter = presser.0, "relay reported via button");
                    let _ = bot
                        .answer_callback_query(cb_id)
                        .text(texts::report_received().to_string())
                        .await;
                }
                Err(e) => {
                    tracing::warn!(reporter = presser.0, error = %e, "failed to record report");
                    let _ = bot
                        .answer_callback_query(cb_id)
                        .text(texts::temporary_failure().to_string())
                        .await;
                }
            }
        }
        "unblock" => {
            let Ok(target) = token::decode(raw_token) else {
                let _ = bot
                    .answer_callback_query(cb_id)
                    .text(texts::invalid_link().to_string())
                    .await;
                return Ok(());
            };
            match state.store.unblock(presser, target).await {
                Ok(()) => {
                    let _ = bot
                        .answer_callback_query(cb_id)
                        .text(texts::unblocked_sender().to_string())
                        .await;
                }
                Err(e) => {
                    tracing::warn!(blocker = presser.0, error = %e, "failed to remove block");
                    let _ = bot
                        .answer_callback_query(cb_id)
                        .text(texts::temporary_failure().to_string())
                        .await;
                }
            }
        }
        _ => {
            let _ = bot.answer_callback_query(cb_id).await;
        }
    }

    Ok(())
}
