use std::fmt;

use thiserror::Error;

/// The failure variants the remote SDK reports through a connection listener.
///
/// These mirror the exception hierarchy of the Spotify App Remote SDK. Anything the
/// bridge does not recognise is carried as [`FailureKind::Other`] with the SDK's own
/// type name so it still shows up in error details.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The remote app dropped the connection
    Disconnected,
    /// The connection was terminated by the remote service
    ConnectionTerminated,
    /// The Spotify app is not installed on the device
    AppNotFound,
    /// Authentication with the remote app failed
    AuthenticationFailed,
    /// The user has not authorized this client
    UserNotAuthorized,
    /// The installed app is too old for a requested feature
    UnsupportedFeatureVersion,
    /// The app is in offline mode
    OfflineMode,
    /// No user is logged into the app
    NotLoggedIn,
    /// The remote service reported an internal error
    RemoteServiceError,
    /// Any failure type not listed above
    Other(String),
}

impl FailureKind {
    /// Name of the failure type as reported by the SDK
    pub fn type_name(&self) -> &str {
        match self {
            FailureKind::Disconnected => "SpotifyDisconnectedException",
            FailureKind::ConnectionTerminated => "SpotifyConnectionTerminatedException",
            FailureKind::AppNotFound => "CouldNotFindSpotifyApp",
            FailureKind::AuthenticationFailed => "AuthenticationFailedException",
            FailureKind::UserNotAuthorized => "UserNotAuthorizedException",
            FailureKind::UnsupportedFeatureVersion => "UnsupportedFeatureVersionException",
            FailureKind::OfflineMode => "OfflineModeException",
            FailureKind::NotLoggedIn => "NotLoggedInException",
            FailureKind::RemoteServiceError => "SpotifyRemoteServiceException",
            FailureKind::Other(name) => name,
        }
    }
}

/// A failure delivered by the remote SDK, either while a connect call is
/// outstanding or after the session is already established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    kind: FailureKind,
    message: Option<String>,
}

impl RemoteFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// A failure that carries no message
    pub fn bare(kind: FailureKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    /// The SDK-provided message, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Human-readable message with the SDK's fallback text applied
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or("Unknown error")
    }

    /// Raw detail string handed to hosts alongside the classified code
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.kind.type_name(), message),
            None => write!(f, "{}", self.kind.type_name()),
        }
    }
}

impl std::error::Error for RemoteFailure {}

/// Error returned by the SDK when a session-scoped command fails
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct RemoteCommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl RemoteCommandError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Errors decoding typed command arguments
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Missing required argument '{0}'")]
    Missing(&'static str),

    #[error("Argument '{name}' must be {expected}")]
    WrongType {
        name: &'static str,
        expected: &'static str,
    },

    #[error("Argument '{name}' has unsupported value {value}")]
    OutOfRange { name: &'static str, value: i64 },
}

/// Result type for session-scoped commands
pub type Result<T> = std::result::Result<T, RemoteCommandError>;
