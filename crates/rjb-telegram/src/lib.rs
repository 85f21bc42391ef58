//! Telegram adapter (teloxide).
//!
//! Implements the `rjb-core` MessagingPort and UpdateFeed over the Telegram Bot API,
//! plus the axum webhook receiver.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::{prelude::*, types::ParseMode};
use tracing::info;

pub mod feed;
pub mod webhook;
pub mod wire;

pub use feed::TelegramFeed;
pub use teloxide::Bot;

use rjb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, MessagingCapabilities},
    },
    Result,
};

/// Telegram rejects messages above this many characters.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Build a bot whose HTTP client outlives a long poll of `poll_timeout`.
pub fn build_bot(token: &str, poll_timeout: Duration) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(poll_timeout + Duration::from_secs(10))
        .build()
        .map_err(|e| Error::Config(format!("telegram http client: {e}")))?;
    Ok(Bot::with_client(token.to_string(), client))
}

/// Point Telegram at `url` for push delivery.
pub async fn set_webhook(bot: &Bot, url: &str) -> Result<()> {
    let url = reqwest::Url::parse(url)
        .map_err(|e| Error::Config(format!("invalid webhook url {url:?}: {e}")))?;
    bot.set_webhook(url.clone()).await.map_err(setup_err)?;
    info!(%url, "webhook registered");
    Ok(())
}

/// Remove any registered webhook so `getUpdates` works again.
pub async fn delete_webhook(bot: &Bot) -> Result<()> {
    bot.delete_webhook().await.map_err(setup_err)?;
    info!("webhook removed");
    Ok(())
}

fn map_err(e: teloxide::RequestError) -> Error {
    Error::Delivery(format!("telegram error: {e}"))
}

/// Webhook registration is a Bot API call, not an outbound message.
fn setup_err(e: teloxide::RequestError) -> Error {
    Error::Upstream(format!("telegram webhook setup failed: {e}"))
}

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_chat_actions: true,
            max_message_len: TELEGRAM_MAX_MESSAGE_LEN,
        }
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), html.to_string())
            .parse_mode(ParseMode::Html)
            .await
            .map_err(map_err)?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        let tg_action = match action {
            ChatAction::Typing => teloxide::types::ChatAction::Typing,
        };
        self.bot
            .send_chat_action(Self::tg_chat(chat_id), tg_action)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn bot_against(server: &MockServer) -> Bot {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#,
            ))
            .mount(server)
            .await;
        let api = reqwest::Url::parse(&server.uri()).unwrap();
        Bot::new("123:abc").set_api_url(api)
    }

    #[tokio::test]
    async fn webhook_registration_failure_is_upstream() {
        let server = MockServer::start().await;
        let bot = bot_against(&server).await;

        let err = set_webhook(&bot, "https://example.org/api/webhook")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)), "got {err:?}");

        let err = delete_webhook(&bot).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn invalid_webhook_url_is_config_error() {
        let bot = Bot::new("123:abc");
        let err = set_webhook(&bot, "not a url").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
