//! Unified error types for huddlebot.

use thiserror::Error;

/// Result type alias using HuddleError.
pub type Result<T> = std::result::Result<T, HuddleError>;

#[derive(Error, Debug)]
pub enum HuddleError {
    // Store errors — command preconditions
    #[error("Event {0} already created. Cannot override this event.")]
    AlreadyExists(String),

    #[error("Event {0} does not exist.")]
    NotFound(String),

    #[error("This event hasn't been scheduled yet.")]
    EventNotScheduled(String),

    #[error("Only the event author may do that.")]
    Forbidden(String),

    #[error("You need a 'yes' reply to {0} before setting a reminder.")]
    NoAffirmativeReply(String),

    #[error("Unknown reminder unit: {0}. Use: minutes, hours, or days.")]
    InvalidOffsetUnit(String),

    // Store errors — infrastructure
    #[error("Storage error: {0}")]
    Storage(String),

    // Channel errors
    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Channel not connected: {0}")]
    ChannelNotConnected(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl HuddleError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HuddleError::AlreadyExists("Game Night".into());
        assert!(err.to_string().contains("Game Night"));
        assert!(err.to_string().contains("already created"));
    }

    #[test]
    fn test_error_constructors() {
        let e1 = HuddleError::storage("disk full");
        assert!(matches!(e1, HuddleError::Storage(_)));

        let e2 = HuddleError::channel("gateway closed");
        assert!(matches!(e2, HuddleError::Channel(_)));

        let e3 = HuddleError::config("bad toml");
        assert!(matches!(e3, HuddleError::Config(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HuddleError = io_err.into();
        assert!(matches!(err, HuddleError::Io(_)));
    }
}
