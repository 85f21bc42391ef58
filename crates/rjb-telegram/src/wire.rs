//! Lenient serde model of the Telegram `Update` JSON posted to the webhook.
//!
//! Only the fields the bot reads are modelled. Every field defaults when absent,
//! so only a body that is not JSON of the right shape fails to decode.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use rjb_core::{
    domain::{ChatId, Sender, Update, UpdateId, UserId},
    errors::Error,
    Result,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireUpdate {
    pub update_id: i64,
    pub message: Option<WireMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireMessage {
    pub message_id: i64,
    pub from: Option<WireUser>,
    pub chat: WireChat,
    /// Unix seconds.
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireUser {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireChat {
    pub id: i64,
}

impl WireUpdate {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::MalformedInput(format!("update body: {e}")))
    }

    pub fn into_update(self) -> Update {
        let msg = self.message.unwrap_or_default();
        let sender = msg.from.unwrap_or_default();
        Update {
            id: UpdateId(self.update_id),
            chat_id: ChatId(msg.chat.id),
            sender: Sender {
                user_id: UserId(sender.id),
                username: sender.username,
            },
            text: msg.text.unwrap_or_default(),
            timestamp: DateTime::<Utc>::from_timestamp(msg.date, 0).unwrap_or_default(),
        }
    }
}
