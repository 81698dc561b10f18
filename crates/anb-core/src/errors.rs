/// Core error type for the bot.
///
/// Adapter crates should map their specific errors into this type so the
/// relay engine can handle failures consistently (user-facing message vs
/// session reset). Policy denials are not errors; see `policy::DenyReason`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("delivery to {recipient} failed: {reason}")]
    Delivery { recipient: i64, reason: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
