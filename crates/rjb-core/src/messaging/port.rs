use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{ChatAction, MessagingCapabilities},
    Result,
};

/// Outbound messenger port.
///
/// A non-success response from the platform is returned as `Error::Delivery`
/// carrying the platform's message. Implementations do not retry.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;
}
