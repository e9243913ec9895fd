//! # Remote API
//!
//! The narrow contract between `spotify-bridge` and the remote playback SDK.
//!
//! The bridge owns session lifecycle, authorization single-flight and event
//! routing. Everything it needs from the outside world goes through the traits
//! defined here:
//!
//! - [`RemoteConnector`] starts a connect attempt and reports outcomes as
//!   [`ConnectionUpdate`]s on a channel
//! - [`RemoteHandle`] is the live connection: topic feeds and [`SessionCommand`]s
//! - [`Authorizer`] runs the login screen for the access-token flow
//!
//! Enable the `test-support` feature for scripted in-memory implementations.

pub mod auth;
pub mod command;
pub mod connection;
pub mod error;

#[cfg(feature = "test-support")]
pub mod testing;

pub use auth::{
    parse_scopes, AuthorizationRequest, AuthorizationResponse, Authorizer, AuthorizerError,
    ResponseType,
};
pub use command::{ImageDimension, PodcastPlaybackSpeed, RepeatMode, SessionCommand};
pub use connection::{
    ConnectionListener, ConnectionParams, ConnectionUpdate, RemoteConnector, RemoteHandle,
    SessionTopic,
};
pub use error::{ArgumentError, FailureKind, RemoteCommandError, RemoteFailure};
