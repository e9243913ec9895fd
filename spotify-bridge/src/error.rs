use remote_api::{ArgumentError, AuthorizerError, RemoteCommandError};
use serde::Serialize;
use thiserror::Error;

use crate::classifier::FailureCode;

/// Errors reported to callers of the bridge
///
/// Every variant maps to a stable wire `code()` so hosts can forward
/// `{code, message, details}` unchanged.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Client id or redirect URL missing or blank
    #[error("client id or redirectUrl are not set or have invalid format")]
    Validation,

    /// A session-scoped command was called with bad arguments
    #[error("Invalid arguments for {method}: {source}")]
    InvalidArgument {
        method: String,
        #[source]
        source: ArgumentError,
    },

    /// The remote failed while a connect call was outstanding
    #[error("{message}")]
    Connection {
        code: FailureCode,
        message: String,
        detail: String,
    },

    /// Disconnect called without a live session
    #[error("Could not disconnect Spotify remote")]
    NotConnected,

    /// A session-scoped command arrived while no session is connected
    #[error("{method} requires a connected session")]
    SessionUnavailable { method: String },

    /// A single-flight operation was started while another is outstanding
    #[error("Concurrent operations detected: {pending}, {attempted}")]
    ConcurrentOperation { pending: String, attempted: String },

    /// The authorization flow needs a foreground UI and none is attached
    #[error("{method} needs a foreground UI")]
    NoForegroundUi { method: String },

    /// The login screen could not be launched
    #[error("Could not start authorization: {0}")]
    LoginUnavailable(#[from] AuthorizerError),

    /// The login screen reported an error
    #[error("Authentication failed")]
    Authentication { detail: String },

    /// Unknown method, or an authorization outcome the bridge does not handle
    #[error("{method} is not implemented")]
    NotImplemented { method: String },

    /// A session-scoped command failed in the remote app
    #[error(transparent)]
    Remote(#[from] RemoteCommandError),

    /// The bridge was detached before the call resolved
    #[error("{method} was abandoned because the bridge was detached")]
    Detached { method: String },

    /// Attaching requires a tokio runtime
    #[error("No tokio runtime available to host the bridge")]
    NoRuntime,

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BridgeError {
    /// Stable error code sent to hosts
    pub fn code(&self) -> &str {
        match self {
            BridgeError::Validation => "errorConnecting",
            BridgeError::InvalidArgument { .. } => "errorInvalidArgument",
            BridgeError::Connection { code, .. } => code.as_str(),
            BridgeError::NotConnected => "errorDisconnecting",
            BridgeError::SessionUnavailable { .. } => "errorNotConnected",
            BridgeError::ConcurrentOperation { .. } => "errorConcurrentOperation",
            BridgeError::NoForegroundUi { .. } => "errorNoForegroundUi",
            BridgeError::LoginUnavailable(_) | BridgeError::Authentication { .. } => {
                "authenticationTokenError"
            }
            BridgeError::NotImplemented { .. } => "notImplemented",
            BridgeError::Remote(err) => &err.code,
            BridgeError::Detached { .. } => "errorDetached",
            BridgeError::NoRuntime => "errorNoRuntime",
            BridgeError::Configuration(_) => "errorConfiguration",
        }
    }

    /// Human-readable message sent to hosts
    pub fn message(&self) -> String {
        match self {
            BridgeError::Remote(err) => err.message.clone(),
            other => other.to_string(),
        }
    }

    /// Raw details sent to hosts alongside the message
    pub fn details(&self) -> Option<String> {
        match self {
            BridgeError::InvalidArgument { source, .. } => Some(source.to_string()),
            BridgeError::Connection { detail, .. } => Some(detail.clone()),
            BridgeError::NotConnected => Some("Not connected or remote is null".to_string()),
            BridgeError::Authentication { detail } => Some(detail.clone()),
            BridgeError::LoginUnavailable(err) => Some(err.0.clone()),
            BridgeError::Remote(err) => err.details.clone(),
            _ => None,
        }
    }

    /// Whether this is the "not implemented" outcome rather than a real failure
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, BridgeError::NotImplemented { .. })
    }
}

/// Error triple as handed to the host's result callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<&BridgeError> for ReplyError {
    fn from(err: &BridgeError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.message(),
            details: err.details(),
        }
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = BridgeError::Validation;
        assert_eq!(err.code(), "errorConnecting");
        assert_eq!(
            err.message(),
            "client id or redirectUrl are not set or have invalid format"
        );
        assert_eq!(err.details(), None);
    }

    #[test]
    fn test_connection_error_uses_classified_code() {
        let err = BridgeError::Connection {
            code: FailureCode::AppNotFound,
            message: "Spotify is not installed".to_string(),
            detail: "CouldNotFindSpotifyApp: Spotify is not installed".to_string(),
        };
        assert_eq!(err.code(), "CouldNotFindSpotifyApp");
        assert_eq!(err.message(), "Spotify is not installed");
        assert_eq!(
            err.details().as_deref(),
            Some("CouldNotFindSpotifyApp: Spotify is not installed")
        );
    }

    #[test]
    fn test_not_connected_error() {
        let reply = ReplyError::from(&BridgeError::NotConnected);
        assert_eq!(
            reply,
            ReplyError {
                code: "errorDisconnecting".to_string(),
                message: "Could not disconnect Spotify remote".to_string(),
                details: Some("Not connected or remote is null".to_string()),
            }
        );
    }

    #[test]
    fn test_concurrent_operation_message() {
        let err = BridgeError::ConcurrentOperation {
            pending: "getAccessToken".to_string(),
            attempted: "getAccessToken".to_string(),
        };
        assert_eq!(err.code(), "errorConcurrentOperation");
        assert_eq!(
            err.to_string(),
            "Concurrent operations detected: getAccessToken, getAccessToken"
        );
    }

    #[test]
    fn test_remote_error_passes_through() {
        let err: BridgeError = RemoteCommandError::new("playerError", "Nothing to play")
            .with_details("empty queue")
            .into();
        assert_eq!(err.code(), "playerError");
        assert_eq!(err.message(), "Nothing to play");
        assert_eq!(err.details().as_deref(), Some("empty queue"));
    }

    #[test]
    fn test_authentication_codes() {
        let err = BridgeError::Authentication {
            detail: "access_denied".to_string(),
        };
        assert_eq!(err.code(), "authenticationTokenError");
        assert_eq!(err.message(), "Authentication failed");

        let err: BridgeError = AuthorizerError("no activity".to_string()).into();
        assert_eq!(err.code(), "authenticationTokenError");
    }

    #[test]
    fn test_not_implemented() {
        let err = BridgeError::NotImplemented {
            method: "fly".to_string(),
        };
        assert!(err.is_not_implemented());
        assert_eq!(err.code(), "notImplemented");
    }
}
