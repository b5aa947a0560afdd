//! Error types for the chat server
//!
//! Defines application-level errors and outbox send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Application-level errors
///
/// Transport errors are fatal to one session. Business errors are turned
/// into an `ERROR:` line for the offending client.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error: over-long line, bad UTF-8 or socket failure (fatal)
    #[error("Line framing error: {0}")]
    Lines(#[from] LinesCodecError),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Username already registered by a live session
    #[error("Username '{0}' is already taken")]
    NameTaken(String),

    /// No live session with the given username
    #[error("User '{0}' not found")]
    RecipientNotFound(String),

    /// Recipient did not make room in its outbox in time
    #[error("Delivery to '{0}' timed out")]
    DeliveryTimeout(String),

    /// Line did not match the expected command syntax
    #[error("Malformed command: {0}")]
    MalformedCommand(String),
}

/// Outbox send errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The outbox stayed full for the whole write timeout
    #[error("Outbox full, delivery timed out")]
    Timeout,
}
