//! Connection manager
//!
//! Owns the bridge's one session with the remote app. `connect` returns as soon
//! as the attempt is registered; a listener task applies the outcomes the
//! connector reports, rewires the session-scoped streams and resolves the call.
//!
//! Session state and the current remote handle live behind a single lock shared
//! by the dispatch side and the listener task. Every listener carries the
//! generation of the attempt that spawned it, so updates from an attempt that has
//! since been torn down are ignored.

use std::sync::Arc;

use bridge_stream::{ConnectionEvent, SubscriptionRouter};
use parking_lot::Mutex;
use remote_api::{
    ConnectionListener, ConnectionParams, ConnectionUpdate, RemoteConnector, RemoteFailure,
    RemoteHandle,
};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::classifier::{classify, FailureCode};
use crate::error::{BridgeError, Result};
use crate::reply::{Reply, ReplySink};

pub const METHOD_CONNECT: &str = "connectToSpotify";
pub const METHOD_DISCONNECT: &str = "disconnectFromSpotify";

pub const CONNECTED_MESSAGE: &str = "Successfully connected to Spotify.";
pub const DISCONNECTED_MESSAGE: &str = "Successfully disconnected from Spotify.";

/// Lifecycle state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

struct Session {
    state: SessionState,
    handle: Option<Arc<dyn RemoteHandle>>,
    generation: u64,
    listener: Option<JoinHandle<()>>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            handle: None,
            generation: 0,
            listener: None,
        }
    }
}

/// State shared between the manager and its listener tasks
struct Shared {
    session: Mutex<Session>,
    router: Arc<SubscriptionRouter>,
}

impl Shared {
    /// Drop the current handle and listener and invalidate in-flight updates
    fn teardown(&self, session: &mut Session) {
        if let Some(listener) = session.listener.take() {
            listener.abort();
        }
        if let Some(handle) = session.handle.take() {
            tracing::info!("Disconnecting remote handle {}", handle.id());
            handle.disconnect();
        }
        self.router.unbind_session();
        session.generation += 1;
        session.state = SessionState::Disconnected;
    }

    fn on_connected(&self, generation: u64, handle: Arc<dyn RemoteHandle>) -> bool {
        let mut session = self.session.lock();
        if session.generation != generation {
            tracing::warn!(
                "Discarding remote handle {} from superseded connect attempt",
                handle.id()
            );
            handle.disconnect();
            return false;
        }

        if let Some(previous) = session.handle.replace(Arc::clone(&handle)) {
            if previous.id() != handle.id() {
                previous.disconnect();
            }
        }
        session.state = SessionState::Connected;
        self.router.bind_session(&handle);
        self.router
            .publish_connection(ConnectionEvent::connected(CONNECTED_MESSAGE));

        tracing::info!("Connected to remote handle {}", handle.id());
        true
    }

    fn on_connection_lost(&self, generation: u64, code: FailureCode, failure: &RemoteFailure) -> bool {
        let mut session = self.session.lock();
        if session.generation != generation {
            tracing::debug!("Ignoring failure from superseded connection: {}", failure);
            return false;
        }

        if let Some(handle) = session.handle.take() {
            handle.disconnect();
        }
        session.state = SessionState::Disconnected;
        self.router.unbind_session();
        self.router.publish_connection(ConnectionEvent::failed(
            failure.message_or_default(),
            code.as_str(),
            failure.detail(),
        ));

        tracing::warn!("Connection lost ({}): {}", code, failure);
        true
    }

    fn on_connect_failed(&self, generation: u64) -> bool {
        let mut session = self.session.lock();
        if session.generation != generation {
            return false;
        }
        session.state = SessionState::Disconnected;
        true
    }
}

/// Reject blank credentials before anything reaches the remote
pub fn validate_credentials(client_id: &str, redirect_url: &str) -> Result<()> {
    if client_id.trim().is_empty() || redirect_url.trim().is_empty() {
        return Err(BridgeError::Validation);
    }
    Ok(())
}

/// Owns the session and drives connect/disconnect
pub struct ConnectionManager {
    shared: Arc<Shared>,
    connector: Arc<dyn RemoteConnector>,
    runtime: Handle,
    show_auth_view: bool,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn RemoteConnector>,
        router: Arc<SubscriptionRouter>,
        runtime: Handle,
        show_auth_view: bool,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(Session::new()),
                router,
            }),
            connector,
            runtime,
            show_auth_view,
        }
    }

    /// Start a connection to the remote app
    ///
    /// Any existing remote handle is torn down first. The returned reply resolves
    /// with `true` once connected, or with a classified connection error if the
    /// attempt fails before ever connecting. Failures after that are published on
    /// the connection status stream only.
    pub fn connect(&self, client_id: &str, redirect_url: &str) -> Reply {
        if let Err(err) = validate_credentials(client_id, redirect_url) {
            return Reply::ready(Err(err));
        }

        let (sink, reply) = Reply::channel(METHOD_CONNECT);
        let mut session = self.shared.session.lock();

        if session.state == SessionState::Connecting {
            tracing::error!("Rejecting connect: another connect attempt is in flight");
            return Reply::ready(Err(BridgeError::ConcurrentOperation {
                pending: METHOD_CONNECT.to_string(),
                attempted: METHOD_CONNECT.to_string(),
            }));
        }

        self.shared.teardown(&mut session);
        session.state = SessionState::Connecting;
        let generation = session.generation;

        let params = ConnectionParams::new(client_id, redirect_url).with_auth_view(self.show_auth_view);
        tracing::info!("Connecting to Spotify (attempt {})", generation);
        let listener = self.connector.connect(params);

        session.listener = Some(self.runtime.spawn(watch_connection(
            Arc::clone(&self.shared),
            generation,
            listener,
            sink,
        )));

        reply
    }

    /// Tear down the connected session
    ///
    /// Fails with [`BridgeError::NotConnected`] unless a live session exists.
    /// A Connected session whose handle is already dead is still torn down,
    /// without publishing an event.
    pub fn disconnect(&self) -> Result<Value> {
        let mut session = self.shared.session.lock();

        if session.state != SessionState::Connected {
            tracing::debug!("Disconnect rejected in state {:?}", session.state);
            return Err(BridgeError::NotConnected);
        }

        if !session.handle.as_ref().is_some_and(|h| h.is_connected()) {
            tracing::warn!("Remote handle already dropped its connection, clearing session");
            self.shared.teardown(&mut session);
            return Err(BridgeError::NotConnected);
        }

        self.shared.teardown(&mut session);
        self.shared
            .router
            .publish_connection(ConnectionEvent::disconnected(DISCONNECTED_MESSAGE));

        tracing::info!("Disconnected from Spotify");
        Ok(Value::Bool(true))
    }

    pub fn state(&self) -> SessionState {
        self.shared.session.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// The remote handle, only while connected
    pub fn connected_handle(&self) -> Option<Arc<dyn RemoteHandle>> {
        let session = self.shared.session.lock();
        match session.state {
            SessionState::Connected => session.handle.clone(),
            _ => None,
        }
    }

    /// Tear everything down without publishing an event
    pub fn shutdown(&self) {
        let mut session = self.shared.session.lock();
        self.shared.teardown(&mut session);
    }
}

async fn watch_connection(
    shared: Arc<Shared>,
    generation: u64,
    mut listener: ConnectionListener,
    sink: ReplySink,
) {
    let mut sink = Some(sink);
    let mut initially_connected = false;

    while let Some(update) = listener.recv().await {
        match update {
            ConnectionUpdate::Connected(handle) => {
                if !shared.on_connected(generation, handle) {
                    return;
                }
                initially_connected = true;
                if let Some(sink) = sink.take() {
                    let _ = sink.send(Ok(Value::Bool(true)));
                }
            }
            ConnectionUpdate::Failed(failure) => {
                let code = classify(&failure);

                if initially_connected {
                    if !shared.on_connection_lost(generation, code, &failure) {
                        return;
                    }
                    continue;
                }

                if !shared.on_connect_failed(generation) {
                    return;
                }
                tracing::warn!("Connect attempt {} failed ({}): {}", generation, code, failure);
                if let Some(sink) = sink.take() {
                    let _ = sink.send(Err(BridgeError::Connection {
                        code,
                        message: failure.message_or_default().to_string(),
                        detail: failure.detail(),
                    }));
                }
                return;
            }
        }
    }

    if let Some(sink) = sink.take() {
        if shared.on_connect_failed(generation) {
            let _ = sink.send(Err(BridgeError::Connection {
                code: FailureCode::Connection,
                message: "Connection listener closed before reporting an outcome".to_string(),
                detail: String::new(),
            }));
        }
    }
}
