//! Scripted in-memory doubles for the remote SDK.
//!
//! These never touch a real app. Tests drive connection outcomes by hand and
//! inspect what the bridge asked for through the recorded counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::auth::{AuthorizationRequest, Authorizer, AuthorizerError};
use crate::command::SessionCommand;
use crate::connection::{
    ConnectionListener, ConnectionParams, ConnectionUpdate, RemoteConnector, RemoteHandle,
    SessionTopic,
};
use crate::error::{RemoteCommandError, RemoteFailure, Result};

/// Connector whose outcomes are pushed by the test
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    attempts: Arc<Mutex<Vec<ConnectionParams>>>,
    current: Arc<Mutex<Option<mpsc::UnboundedSender<ConnectionUpdate>>>>,
    auto_connect: Arc<AtomicBool>,
    handles: Arc<Mutex<Vec<Arc<ScriptedHandle>>>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector that reports `Connected` as soon as it is asked to connect
    pub fn auto_connecting() -> Self {
        let connector = Self::default();
        connector.auto_connect.store(true, Ordering::Relaxed);
        connector
    }

    /// Number of connect attempts made so far
    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    pub fn last_params(&self) -> Option<ConnectionParams> {
        self.attempts.lock().last().cloned()
    }

    /// Every handle this connector has produced, oldest first
    pub fn handles(&self) -> Vec<Arc<ScriptedHandle>> {
        self.handles.lock().clone()
    }

    /// Report a successful connection on the latest attempt
    pub fn succeed(&self) -> Arc<ScriptedHandle> {
        let handle = Arc::new(ScriptedHandle::new(format!(
            "scripted-{}",
            self.handles.lock().len() + 1
        )));
        self.handles.lock().push(Arc::clone(&handle));
        self.push(ConnectionUpdate::Connected(handle.clone()));
        handle
    }

    /// Report a failure on the latest attempt
    pub fn fail(&self, failure: RemoteFailure) -> bool {
        self.push(ConnectionUpdate::Failed(failure))
    }

    /// Close the latest listener without reporting anything
    pub fn hang_up(&self) {
        self.current.lock().take();
    }

    fn push(&self, update: ConnectionUpdate) -> bool {
        match self.current.lock().as_ref() {
            Some(tx) => tx.send(update).is_ok(),
            None => false,
        }
    }
}

impl RemoteConnector for ScriptedConnector {
    fn connect(&self, params: ConnectionParams) -> ConnectionListener {
        let (tx, rx) = mpsc::unbounded_channel();
        self.attempts.lock().push(params);
        *self.current.lock() = Some(tx);

        if self.auto_connect.load(Ordering::Relaxed) {
            self.succeed();
        }

        rx
    }
}

/// Handle that records what was asked of it
pub struct ScriptedHandle {
    id: String,
    connected: AtomicBool,
    disconnects: AtomicU32,
    keep_feeds: AtomicBool,
    feeds: Mutex<HashMap<SessionTopic, Vec<mpsc::UnboundedSender<Value>>>>,
    executed: Mutex<Vec<SessionCommand>>,
    command_error: Mutex<Option<RemoteCommandError>>,
}

impl ScriptedHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            connected: AtomicBool::new(true),
            disconnects: AtomicU32::new(0),
            keep_feeds: AtomicBool::new(false),
            feeds: Mutex::new(HashMap::new()),
            executed: Mutex::new(Vec::new()),
            command_error: Mutex::new(None),
        }
    }

    /// How many times `disconnect` was called
    pub fn disconnect_count(&self) -> u32 {
        self.disconnects.load(Ordering::Relaxed)
    }

    /// Simulate the SDK losing the connection without telling anyone
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Keep topic feeds open across `disconnect`, like an SDK that never
    /// closes its subscriptions
    pub fn keep_feeds_on_disconnect(&self, keep: bool) {
        self.keep_feeds.store(keep, Ordering::Relaxed);
    }

    /// Number of live subscribers for a topic
    pub fn subscriber_count(&self, topic: SessionTopic) -> usize {
        self.feeds
            .lock()
            .get(&topic)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Push a payload to every subscriber of a topic, returning how many got it
    pub fn emit(&self, topic: SessionTopic, payload: Value) -> usize {
        let mut feeds = self.feeds.lock();
        let Some(senders) = feeds.get_mut(&topic) else {
            return 0;
        };
        senders.retain(|tx| !tx.is_closed());
        senders
            .iter()
            .filter(|tx| tx.send(payload.clone()).is_ok())
            .count()
    }

    pub fn executed(&self) -> Vec<SessionCommand> {
        self.executed.lock().clone()
    }

    /// Make every following command fail with this error
    pub fn fail_commands_with(&self, error: RemoteCommandError) {
        *self.command_error.lock() = Some(error);
    }
}

#[async_trait]
impl RemoteHandle for ScriptedHandle {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Relaxed);
        self.disconnects.fetch_add(1, Ordering::Relaxed);
        if !self.keep_feeds.load(Ordering::Relaxed) {
            self.feeds.lock().clear();
        }
    }

    fn subscribe(&self, topic: SessionTopic) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds.lock().entry(topic).or_default().push(tx);
        rx
    }

    async fn execute(&self, command: SessionCommand) -> Result<Value> {
        let method = command.method();
        self.executed.lock().push(command);

        match self.command_error.lock().clone() {
            Some(error) => Err(error),
            None => Ok(Value::String(format!("{} ok", method))),
        }
    }
}

/// Authorizer that records requests instead of showing a screen
#[derive(Clone, Default)]
pub struct RecordingAuthorizer {
    requests: Arc<Mutex<Vec<AuthorizationRequest>>>,
    refuse: Arc<AtomicBool>,
}

impl RecordingAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<AuthorizationRequest> {
        self.requests.lock().clone()
    }

    /// Make `open_login` fail, as if the screen could not be launched
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::Relaxed);
    }
}

impl Authorizer for RecordingAuthorizer {
    fn open_login(&self, request: AuthorizationRequest) -> std::result::Result<(), AuthorizerError> {
        if self.refuse.load(Ordering::Relaxed) {
            return Err(AuthorizerError("activity not resumed".to_string()));
        }
        self.requests.lock().push(request);
        Ok(())
    }
}
