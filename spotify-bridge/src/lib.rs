//! # Spotify Bridge
//!
//! Drives a remote Spotify app through one persistent session on behalf of a
//! host application.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use serde_json::json;
//! use spotify_bridge::{BridgeConfig, SpotifyBridge, StreamId};
//!
//! let bridge = SpotifyBridge::attach(Arc::new(connector), BridgeConfig::default())?;
//! let mut status = bridge.connection_status()?;
//! let mut player = bridge.listen(StreamId::PlayerState)?;
//!
//! bridge
//!     .call("connectToSpotify", json!({"clientId": "abc123", "redirectUrl": "app://callback"}))
//!     .await?;
//! println!("{:?}", status.recv().await);
//!
//! bridge.call("play", json!({"spotifyUri": "spotify:track:4uLU6hMCjMI75M1A2tKUQC"})).await?;
//! println!("{:?}", player.recv().await);
//! ```
//!
//! ## Pieces
//!
//! - [`ConnectionManager`]: owns the session and reports connect outcomes
//! - [`PendingOperationTracker`]: allows one access-token flow at a time
//! - [`SubscriptionRouter`]: rewires the five host streams as sessions come and go
//! - [`classify`]: turns remote failures into stable error codes
//! - [`Dispatcher`]: routes method calls by name
//!
//! Every call answers with a [`Reply`]. Await it for a JSON value or a
//! [`BridgeError`] whose `code()`, `message()` and `details()` go back to the
//! host unchanged.

pub mod bridge;
pub mod builder;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod manager;
pub mod pending;
pub mod reply;

pub use bridge::SpotifyBridge;
pub use builder::SpotifyBridgeBuilder;
pub use classifier::{classify, FailureCode};
pub use config::{BridgeConfig, DisconnectedCommandPolicy};
pub use dispatcher::{Arguments, CommandDecoder, CommandRegistry, Dispatcher, MethodCall, Route};
pub use error::{BridgeError, ReplyError, Result};
pub use manager::{ConnectionManager, SessionState};
pub use pending::PendingOperationTracker;
pub use reply::{Reply, ReplySink};

pub use bridge_stream::{ConnectionEvent, EventSubscription, StreamError, StreamId, SubscriptionRouter};
pub use remote_api::{
    AuthorizationRequest, AuthorizationResponse, Authorizer, AuthorizerError, ConnectionParams,
    ConnectionUpdate, FailureKind, RemoteCommandError, RemoteConnector, RemoteFailure,
    RemoteHandle, SessionCommand, SessionTopic,
};

#[cfg(feature = "test-support")]
pub use remote_api::testing;

/// Commonly used types
pub mod prelude {
    pub use crate::{
        BridgeConfig, BridgeError, ConnectionEvent, MethodCall, Reply, SpotifyBridge, StreamId,
    };
}
