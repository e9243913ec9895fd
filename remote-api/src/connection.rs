//! Connection contract with the remote SDK
//!
//! The bridge never talks to the SDK directly. It asks a [`RemoteConnector`] for a
//! connection and receives the outcome as a stream of [`ConnectionUpdate`]s, then
//! drives session-scoped work through the [`RemoteHandle`] carried by the
//! `Connected` update.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::command::SessionCommand;
use crate::error::{RemoteFailure, Result};

/// Parameters for a single connect attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub client_id: String,
    pub redirect_uri: String,
    /// Let the SDK show its own authorization view when needed
    pub show_auth_view: bool,
}

impl ConnectionParams {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            show_auth_view: true,
        }
    }

    pub fn with_auth_view(mut self, show: bool) -> Self {
        self.show_auth_view = show;
        self
    }
}

/// One outcome reported by the connection listener
///
/// A listener may report `Connected` and later `Failed` when an established
/// connection drops.
#[derive(Clone)]
pub enum ConnectionUpdate {
    Connected(Arc<dyn RemoteHandle>),
    Failed(RemoteFailure),
}

impl fmt::Debug for ConnectionUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionUpdate::Connected(handle) => {
                f.debug_tuple("Connected").field(&handle.id()).finish()
            }
            ConnectionUpdate::Failed(failure) => f.debug_tuple("Failed").field(failure).finish(),
        }
    }
}

/// Receiving end of a connection listener
pub type ConnectionListener = mpsc::UnboundedReceiver<ConnectionUpdate>;

/// Live data feeds a connected handle can source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionTopic {
    /// Currently playing context (playlist, album, ...)
    PlayerContext,
    /// Track, position and pause state
    PlayerState,
    /// What the logged in user is allowed to do
    Capabilities,
    /// Login and account status
    UserStatus,
}

impl SessionTopic {
    pub const ALL: [SessionTopic; 4] = [
        SessionTopic::PlayerContext,
        SessionTopic::PlayerState,
        SessionTopic::Capabilities,
        SessionTopic::UserStatus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SessionTopic::PlayerContext => "PlayerContext",
            SessionTopic::PlayerState => "PlayerState",
            SessionTopic::Capabilities => "Capabilities",
            SessionTopic::UserStatus => "UserStatus",
        }
    }
}

/// Starts connection attempts against the remote SDK
pub trait RemoteConnector: Send + Sync + 'static {
    /// Begin an asynchronous connect attempt.
    ///
    /// Returns immediately; outcomes arrive on the returned listener for as long
    /// as the connection lives.
    fn connect(&self, params: ConnectionParams) -> ConnectionListener;
}

/// Opaque reference to an active connection
#[async_trait]
pub trait RemoteHandle: Send + Sync + 'static {
    /// Identifier used only for logging
    fn id(&self) -> String;

    /// Whether the SDK still considers this handle connected
    fn is_connected(&self) -> bool;

    /// Tear down the connection. Calling this more than once is harmless.
    fn disconnect(&self);

    /// Open a feed of opaque payloads for a session topic
    fn subscribe(&self, topic: SessionTopic) -> mpsc::UnboundedReceiver<Value>;

    /// Run a session-scoped command against this connection
    async fn execute(&self, command: SessionCommand) -> Result<Value>;
}
