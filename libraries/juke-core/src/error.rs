/// Core error types for the Juke controller
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for the Juke controller
///
/// The taxonomy follows the recovery strategy: `Command` is handled
/// locally with an error flash, `Connection` gets one reconnect at the
/// connection boundary, `UnknownTag` never reaches the player, and only
/// `Hardware` aborts startup.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Player rejected a command (out-of-range seek, unknown URI, ...)
    #[error("player command failed: {0}")]
    Command(String),

    /// Connection to the player lost or refused
    #[error("player connection error: {0}")]
    Connection(String),

    /// Tag payload matched no recognized pattern
    #[error("unknown tag payload: {0}")]
    UnknownTag(String),

    /// Hardware initialization failure (reader or LED strip unavailable)
    #[error("hardware error: {0}")]
    Hardware(String),

    /// Configuration file could not be read or written
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bookmark (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Whether this error is a lost/refused connection, as opposed to a
    /// command the player rejected. Callers use this to decide between
    /// reconnect-and-retry and a plain error flash.
    pub fn is_connection(&self) -> bool {
        matches!(self, CoreError::Connection(_) | CoreError::Io(_))
    }
}
