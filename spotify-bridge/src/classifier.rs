//! Translation of remote failures into stable error codes

use remote_api::{FailureKind, RemoteFailure};

/// Error codes reported for connection failures
///
/// The string forms are part of the host protocol and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCode {
    Disconnected,
    ConnectionTerminated,
    AppNotFound,
    AuthenticationFailed,
    UserNotAuthorized,
    UnsupportedFeatureVersion,
    OfflineMode,
    NotLoggedIn,
    RemoteServiceError,
    /// Any failure without a dedicated code
    Connection,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::Disconnected => "SpotifyDisconnectedException",
            FailureCode::ConnectionTerminated => "SpotifyConnectionTerminatedException",
            FailureCode::AppNotFound => "CouldNotFindSpotifyApp",
            FailureCode::AuthenticationFailed => "AuthenticationFailedException",
            FailureCode::UserNotAuthorized => "UserNotAuthorizedException",
            FailureCode::UnsupportedFeatureVersion => "UnsupportedFeatureVersionException",
            FailureCode::OfflineMode => "OfflineModeException",
            FailureCode::NotLoggedIn => "NotLoggedInException",
            FailureCode::RemoteServiceError => "SpotifyRemoteServiceException",
            FailureCode::Connection => "errorConnection",
        }
    }
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a remote failure to its error code
pub fn classify(failure: &RemoteFailure) -> FailureCode {
    match failure.kind() {
        FailureKind::Disconnected => FailureCode::Disconnected,
        FailureKind::ConnectionTerminated => FailureCode::ConnectionTerminated,
        FailureKind::AppNotFound => FailureCode::AppNotFound,
        FailureKind::AuthenticationFailed => FailureCode::AuthenticationFailed,
        FailureKind::UserNotAuthorized => FailureCode::UserNotAuthorized,
        FailureKind::UnsupportedFeatureVersion => FailureCode::UnsupportedFeatureVersion,
        FailureKind::OfflineMode => FailureCode::OfflineMode,
        FailureKind::NotLoggedIn => FailureCode::NotLoggedIn,
        FailureKind::RemoteServiceError => FailureCode::RemoteServiceError,
        FailureKind::Other(_) => FailureCode::Connection,
    }
}
