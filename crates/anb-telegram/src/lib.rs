//! Telegram adapter (teloxide).
//!
//! Implements the `anb-core` delivery port over the Telegram Bot API. This
//! bot only talks to users in their private chats, so a chat id is always
//! numerically the user's own id.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile},
};

use tokio::time::sleep;

use anb_core::{
    domain::UserId,
    errors::Error,
    ports::{DeliveryPort, RelayPayload},
    Result,
};

pub mod handlers;
pub mod router;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(user_id: UserId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(user_id.0)
    }

    fn map_err(user_id: UserId, e: teloxide::RequestError) -> Error {
        Error::Delivery {
            recipient: user_id.0,
            reason: e.to_string(),
        }
    }

    async fn with_retry<T, Fut>(&self, user_id: UserId, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(user_id, other)),
                },
            }
        }
    }

    /// Plain reply to a user's own chat.
    pub async fn send_text(&self, user_id: UserId, text: &str) -> Result<()> {
        self.with_retry(user_id, || {
            self.bot.send_message(Self::tg_chat(user_id), text.to_string())
        })
        .await?;
        Ok(())
    }

    /// Reply carrying an inline keyboard (single row).
    pub async fn send_text_with_buttons(
        &self,
        user_id: UserId,
        text: &str,
        buttons: Vec<(String, String)>,
    ) -> Result<()> {
        let markup = keyboard_row(buttons);
        self.with_retry(user_id, || {
            self.bot
                .send_message(Self::tg_chat(user_id), text.to_string())
                .reply_markup(markup.clone())
        })
        .await?;
        Ok(())
    }
}

fn keyboard_row(buttons: Vec<(String, String)>) -> InlineKeyboardMarkup {
    let row = buttons
        .into_iter()
        .map(|(label, data)| InlineKeyboardButton::callback(label, data))
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(vec![row])
}

fn relay_keyboard(reply_token: &str) -> InlineKeyboardMarkup {
    keyboard_row(vec![
        (
            "↩️ Reply anonymously".to_string(),
            format!("reply:{reply_token}"),
        ),
        ("🚫 Block sender".to_string(), format!("block:{reply_token}")),
        ("⚠️ Report".to_string(), format!("report:{reply_token}")),
    ])
}

#[async_trait]
impl DeliveryPort for TelegramMessenger {
    async fn deliver(&self, recipient: UserId, payload: RelayPayload) -> Result<()> {
        let markup = payload.reply_token.as_deref().map(relay_keyboard);

        match &payload.photo_file_id {
            Some(file_id) => {
                self.with_retry(recipient, || {
                    let mut req = self
                        .bot
                        .send_photo(Self::tg_chat(recipient), InputFile::file_id(file_id.clone()))
                        .caption(payload.text.clone());
                    if let Some(m) = markup.clone() {
                        req = req.reply_markup(m);
                    }
                    req
                })
                .await?;
            }
            None => {
                self.with_retry(recipient, || {
                    let mut req = self
                        .bot
                        .send_message(Self::tg_chat(recipient), payload.text.clone());
                    if let Some(m) = markup.clone() {
                        req = req.reply_markup(m);
                    }
                    req
                })
                .await?;
            }
        }

        Ok(())
    }
}
