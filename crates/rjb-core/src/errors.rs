/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the dispatcher
/// can decide what the user sees (apology, nothing) and what the caller sees
/// (HTTP status, log line).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("upstream unavailable: {0}")]
    Upstream(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

pub type Result<T> = std::result::Result<T, Error>;
