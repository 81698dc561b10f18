use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use anb_core::{
    domain::{Profile, UserId},
    relay::InboundEvent,
    texts, token,
};

use crate::router::AppState;

use super::send_actions;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let sender = UserId(user.id.0 as i64);
    let (cmd, arg) = parse_command(msg.text().unwrap_or(""));

    let _guard = state.user_locks.lock_user(sender).await;

    match cmd.as_str() {
        "start" => {
            let profile = Profile {
                user_id: sender,
                username: user.username.clone(),
                first_name: Some(user.first_name.clone()),
            };
            if let Err(e) = state.store.register_identity(profile).await {
                tracing::warn!(user = sender.0, error = %e, "failed to register identity");
                reply(&state, sender, texts::temporary_failure()).await;
                return Ok(());
            }

            if arg.is_empty() {
                let link = token::invite_link(&state.cfg.bot_username, sender);
                reply(&state, sender, &texts::welcome(&link)).await;
            } else {
                let actions = state
                    .engine
                    .handle_event(sender, InboundEvent::Open { token: arg })
                    .await;
                send_actions(&state, sender, actions).await;
            }
        }
        "link" => {
            let link = token::invite_link(&state.cfg.bot_username, sender);
            reply(&state, sender, &texts::your_link(&link)).await;
        }
        "stop" => {
            let actions = state.engine.handle_event(sender, InboundEvent::Stop).await;
            send_actions(&state, sender, actions).await;
        }
        "stats" => {
            if !state.cfg.is_admin(sender.0) {
                reply(&state, sender, texts::not_authorized()).await;
                return Ok(());
            }
            match state.store.stats().await {
                Ok(s) => {
                    let text = texts::stats(s.total_users, s.total_relays, s.total_reports);
                    reply(&state, sender, &text).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read stats");
                    reply(&state, sender, texts::temporary_failure()).await;
                }
            }
        }
        "broadcast" => {
            if !state.cfg.is_admin(sender.0) {
                reply(&state, sender, texts::not_authorized()).await;
                return Ok(());
            }
            broadcast(&state, sender, &arg).await;
        }
        "ban" => {
            if !state.cfg.is_admin(sender.0) {
                reply(&state, sender, texts::not_authorized()).await;
                return Ok(());
            }
            set_admin_block(&state, sender, &arg, true).await;
        }
        "unban" => {
            if !state.cfg.is_admin(sender.0) {
                reply(&state, sender, texts::not_authorized()).await;
                return Ok(());
            }
            set_admin_block(&state, sender, &arg, false).await;
        }
        _ => {
            reply(&state, sender, texts::unknown_command()).await;
        }
    }

    Ok(())
}

async fn reply(state: &AppState, user: UserId, text: &str) {
    if let Err(e) = state.messenger.send_text(user, text).await {
        tracing::warn!(user = user.0, error = %e, "failed to reply to sender");
    }
}

async fn broadcast(state: &AppState, admin: UserId, text: &str) {
    if text.is_empty() {
        reply(state, admin, texts::broadcast_usage()).await;
        return;
    }

    let targets = match state.store.all_identities().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(error = %e, "failed to list broadcast targets");
            reply(state, admin, texts::temporary_failure()).await;
            return;
        }
    };

    let body = texts::broadcast_body(text);
    let mut sent = 0u32;
    let mut failed = 0u32;
    for target in targets {
        match state.messenger.send_text(target, &body).await {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                tracing::debug!(user = target.0, error = %e, "broadcast delivery failed");
            }
        }
    }

    tracing::info!(sent, failed, "broadcast finished");
    reply(state, admin, &texts::broadcast_summary(sent, failed)).await;
}

async fn set_admin_block(state: &AppState, admin: UserId, arg: &str, blocked: bool) {
    let usage = if blocked {
        texts::ban_usage()
    } else {
        texts::unban_usage()
    };

    let mut parts = arg.splitn(2, char::is_whitespace);
    let Some(id) = parts.next().and_then(|s| s.parse::<i64>().ok()) else {
        reply(state, admin, usage).await;
        return;
    };
    let reason = parts
        .next()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    match state
        .store
        .set_admin_block(UserId(id), blocked, reason)
        .await
    {
        Ok(()) => {
            let confirmation = if blocked {
                texts::banned(id)
            } else {
                texts::unbanned(id)
            };
            tracing::info!(admin = admin.0, target = id, blocked, "admin block updated");
            reply(state, admin, &confirmation).await;
        }
        Err(e) => {
            tracing::warn!(target = id, error = %e, "failed to update admin block");
            reply(state, admin, texts::temporary_failure()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bot_mention_and_lowercases() {
        assert_eq!(
            parse_command("/Start@AnonBot abc123"),
            ("start".to_string(), "abc123".to_string())
        );
    }

    #[test]
    fn splits_command_from_payload_once() {
        let (cmd, rest) = parse_command("/broadcast hello  world");
        assert_eq!(cmd, "broadcast");
        assert_eq!(rest, "hello  world");
    }

    #[test]
    fn bare_command_has_empty_payload() {
        assert_eq!(parse_command("/link"), ("link".to_string(), String::new()));
    }
}
