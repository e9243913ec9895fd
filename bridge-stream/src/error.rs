//! Error types for the bridge-stream crate.

use crate::stream::StreamId;

/// Errors that can occur when talking to stream endpoints.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StreamError {
    /// The router has been detached from its host and its endpoints released
    #[error("Stream endpoints have been released")]
    Detached,

    /// No endpoint is registered under this channel name
    #[error("Unknown stream channel: {0}")]
    UnknownChannel(String),

    /// The operation needs a session-scoped stream
    #[error("{0:?} is not a session-scoped stream")]
    NotSessionScoped(StreamId),
}

/// Convenience type alias for Results using StreamError.
pub type Result<T> = std::result::Result<T, StreamError>;
