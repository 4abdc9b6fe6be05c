//! Error types

use thiserror::Error;

/// Main error type for the assistant
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chat completion error: {0}")]
    ChatCompletion(String),

    #[error("Messaging API error: {0}")]
    Messaging(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
