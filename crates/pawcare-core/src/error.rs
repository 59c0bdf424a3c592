//! PawCare error types.

/// Errors raised inside PawCare crates.
///
/// The notification subsystem never lets these reach UI callers: storage and
/// surface boundaries log them and degrade to a best-effort result.
#[derive(Debug, thiserror::Error)]
pub enum PawcareError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification surface error: {0}")]
    Surface(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PawcareError>;
