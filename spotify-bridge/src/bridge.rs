//! The bridge object a host attaches to.
//!
//! `SpotifyBridge` wires the connection manager, the pending-operation tracker,
//! the dispatcher and the subscription router together for one attachment. It
//! is created on attach and torn down on detach; dropping it detaches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridge_stream::{ConnectionEvent, EventSubscription, StreamId, SubscriptionRouter};
use remote_api::{AuthorizationResponse, Authorizer, RemoteConnector};
use serde_json::Value;
use tokio::runtime::Handle;

use crate::builder::SpotifyBridgeBuilder;
use crate::config::BridgeConfig;
use crate::dispatcher::{CommandRegistry, Dispatcher, MethodCall};
use crate::error::{BridgeError, Result};
use crate::manager::{ConnectionManager, SessionState};
use crate::pending::PendingOperationTracker;
use crate::reply::Reply;

/// One attachment of the bridge to a host
pub struct SpotifyBridge {
    config: BridgeConfig,
    router: Arc<SubscriptionRouter>,
    manager: Arc<ConnectionManager>,
    pending: Arc<PendingOperationTracker>,
    dispatcher: Dispatcher,
    detached: AtomicBool,
}

impl SpotifyBridge {
    /// Attach on the current tokio runtime
    ///
    /// Fails with [`BridgeError::NoRuntime`] outside a runtime and with
    /// [`BridgeError::Configuration`] if `config` is invalid.
    pub fn attach(connector: Arc<dyn RemoteConnector>, config: BridgeConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;
        Self::attach_with_runtime(connector, config, runtime)
    }

    /// Attach on an explicit runtime
    pub fn attach_with_runtime(
        connector: Arc<dyn RemoteConnector>,
        config: BridgeConfig,
        runtime: Handle,
    ) -> Result<Self> {
        Self::assemble(connector, config, runtime, CommandRegistry::standard())
    }

    pub fn builder() -> SpotifyBridgeBuilder {
        SpotifyBridgeBuilder::new()
    }

    pub(crate) fn assemble(
        connector: Arc<dyn RemoteConnector>,
        config: BridgeConfig,
        runtime: Handle,
        registry: CommandRegistry,
    ) -> Result<Self> {
        config.validate()?;

        let router = Arc::new(SubscriptionRouter::attach(
            runtime.clone(),
            config.event_buffer_size,
        ));
        let manager = Arc::new(ConnectionManager::new(
            connector,
            Arc::clone(&router),
            runtime.clone(),
            config.show_auth_view,
        ));
        let pending = Arc::new(PendingOperationTracker::new());
        let dispatcher = Dispatcher::new(
            registry,
            Arc::clone(&manager),
            Arc::clone(&pending),
            runtime,
            config.authorization_request_code,
            config.disconnected_command_policy,
        );

        tracing::info!(
            "Spotify bridge attached ({} methods, buffer {})",
            dispatcher.registry().methods().len(),
            config.event_buffer_size
        );

        Ok(Self {
            config,
            router,
            manager,
            pending,
            dispatcher,
            detached: AtomicBool::new(false),
        })
    }

    /// Route a method call
    pub fn dispatch(&self, call: MethodCall) -> Reply {
        if self.is_detached() {
            return Reply::ready(Err(BridgeError::Detached {
                method: call.method,
            }));
        }
        self.dispatcher.dispatch(call)
    }

    /// Route a call given as a method name and a JSON object of arguments
    pub fn call(&self, method: &str, arguments: Value) -> Reply {
        self.dispatch(MethodCall::new(method, arguments))
    }

    /// Make a foreground UI available for the access-token flow
    pub fn attach_ui(&self, ui: Arc<dyn Authorizer>) {
        if self.is_detached() {
            tracing::warn!("Ignoring UI attach on a detached bridge");
            return;
        }
        self.dispatcher.attach_ui(ui);
    }

    pub fn detach_ui(&self) {
        self.dispatcher.detach_ui();
    }

    /// Deliver the result of the login screen
    ///
    /// Returns `true` if the result was consumed. Results carrying another
    /// request code belong to someone else and are left alone.
    pub fn handle_ui_result(&self, request_code: i32, response: AuthorizationResponse) -> bool {
        if request_code != self.config.authorization_request_code {
            return false;
        }
        self.pending.complete(response)
    }

    /// Subscribe to connection status events
    pub fn connection_status(&self) -> bridge_stream::Result<EventSubscription<ConnectionEvent>> {
        self.router.connection_status()
    }

    /// Subscribe to a session-scoped stream
    pub fn listen(&self, stream: StreamId) -> bridge_stream::Result<EventSubscription<Value>> {
        self.router.listen(stream)
    }

    /// Subscribe to a session-scoped stream by its channel name
    pub fn listen_channel(&self, channel: &str) -> bridge_stream::Result<EventSubscription<Value>> {
        self.router.listen(StreamId::from_channel_name(channel)?)
    }

    pub fn session_state(&self) -> SessionState {
        self.manager.state()
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Method of the operation waiting on the login screen, if any
    pub fn pending_operation(&self) -> Option<String> {
        self.pending.pending_method()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn router(&self) -> &Arc<SubscriptionRouter> {
        &self.router
    }

    /// Tear the attachment down
    ///
    /// Disconnects the session, fails a pending access-token call with
    /// `errorDetached`, drops the UI and releases every stream. Calling it again
    /// does nothing.
    pub fn detach(&self) {
        if self.detached.swap(true, Ordering::SeqCst) {
            return;
        }

        self.manager.shutdown();
        self.pending.abandon(|method| BridgeError::Detached {
            method: method.to_string(),
        });
        self.dispatcher.detach_ui();
        self.router.detach();

        tracing::info!("Spotify bridge detached");
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }
}

impl Drop for SpotifyBridge {
    fn drop(&mut self) {
        self.detach();
    }
}
