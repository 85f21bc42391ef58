use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use teloxide::{
    prelude::*,
    types::{Message, UpdateKind},
};

use rjb_core::{
    domain::{ChatId, Sender, Update, UpdateId, UserId},
    errors::Error,
    polling::UpdateFeed,
    Result,
};

/// Pull-mode source backed by `getUpdates`.
#[derive(Clone)]
pub struct TelegramFeed {
    bot: Bot,
}

impl TelegramFeed {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl UpdateFeed for TelegramFeed {
    async fn fetch(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        let offset = i32::try_from(offset)
            .map_err(|_| Error::Upstream(format!("update offset {offset} out of range")))?;
        let timeout = u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX);

        let updates = self
            .bot
            .get_updates()
            .offset(offset)
            .timeout(timeout)
            .await
            .map_err(|e| Error::Upstream(format!("getUpdates failed: {e}")))?;

        Ok(updates.into_iter().map(convert).collect())
    }
}

/// Non-message updates come through with empty text so the cursor still moves past them.
fn convert(update: teloxide::types::Update) -> Update {
    let id = UpdateId(i64::from(update.id));
    match update.kind {
        UpdateKind::Message(msg) => from_message(id, &msg),
        _ => Update {
            id,
            chat_id: ChatId(0),
            sender: Sender {
                user_id: UserId(0),
                username: None,
            },
            text: String::new(),
            timestamp: Utc::now(),
        },
    }
}

fn from_message(id: UpdateId, msg: &Message) -> Update {
    let sender = match msg.from() {
        Some(user) => Sender {
            user_id: UserId(user.id.0 as i64),
            username: user.username.clone(),
        },
        None => Sender {
            user_id: UserId(0),
            username: None,
        },
    };

    Update {
        id,
        chat_id: ChatId(msg.chat.id.0),
        sender,
        text: msg.text().unwrap_or_default().to_string(),
        timestamp: msg.date,
    }
}
