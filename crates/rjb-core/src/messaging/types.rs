/// Outgoing "chat action" (typing indicator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_chat_actions: bool,
    /// Hard platform maximum; the chunker limit must stay below it.
    pub max_message_len: usize,
}
