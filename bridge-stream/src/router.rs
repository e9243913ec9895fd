//! Subscription routing between remote handles and stream endpoints.
//!
//! The `SubscriptionRouter` owns the five stream endpoints of one bridge. The
//! connection status endpoint is fed directly by the bridge for the whole
//! attachment. The four session-scoped endpoints each get a handler while a
//! session is connected: a pump task that forwards one topic feed of the current
//! remote handle into the endpoint. Handlers are replaced on rebind and dropped
//! on unbind; nothing is buffered while no handler is bound.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use remote_api::{RemoteHandle, SessionTopic};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::error::{Result, StreamError};
use crate::event::ConnectionEvent;
use crate::stream::{EventSubscription, StreamId};

/// Forwarding task tying a session topic to an endpoint
struct StreamHandler {
    handle_id: String,
    pump: JoinHandle<()>,
}

impl Drop for StreamHandler {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

struct SessionEndpoint {
    sender: broadcast::Sender<Value>,
    handler: Option<StreamHandler>,
}

/// Endpoints that exist between attach and detach
struct Endpoints {
    connection: broadcast::Sender<ConnectionEvent>,
    session: HashMap<SessionTopic, SessionEndpoint>,
}

/// Routes remote feeds and connection events to host-facing streams
pub struct SubscriptionRouter {
    endpoints: RwLock<Option<Endpoints>>,
    runtime: Handle,
}

impl SubscriptionRouter {
    /// Create the five endpoints and install the connection status handler
    ///
    /// `buffer_size` is the number of events each endpoint keeps for slow
    /// subscribers.
    pub fn attach(runtime: Handle, buffer_size: usize) -> Self {
        let buffer_size = buffer_size.max(1);
        let (connection, _) = broadcast::channel(buffer_size);
        let session = SessionTopic::ALL
            .into_iter()
            .map(|topic| {
                let (sender, _) = broadcast::channel(buffer_size);
                (
                    topic,
                    SessionEndpoint {
                        sender,
                        handler: None,
                    },
                )
            })
            .collect();

        tracing::debug!("Attached {} stream endpoints", StreamId::ALL.len());

        Self {
            endpoints: RwLock::new(Some(Endpoints {
                connection,
                session,
            })),
            runtime,
        }
    }

    /// Release every endpoint
    ///
    /// Handlers are dropped and open subscriptions observe end of stream.
    /// Calling this twice is harmless.
    pub fn detach(&self) {
        if self.endpoints.write().take().is_some() {
            tracing::debug!("Released stream endpoints");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.endpoints.read().is_some()
    }

    /// Bind all four session-scoped streams to a remote handle
    ///
    /// Any handler bound to an earlier handle is replaced.
    pub fn bind_session(&self, handle: &Arc<dyn RemoteHandle>) {
        let mut guard = self.endpoints.write();
        let Some(endpoints) = guard.as_mut() else {
            tracing::warn!("Ignoring session bind for {}: endpoints released", handle.id());
            return;
        };

        for (topic, endpoint) in endpoints.session.iter_mut() {
            let feed = handle.subscribe(*topic);
            let pump = self
                .runtime
                .spawn(pump_feed(*topic, feed, endpoint.sender.clone()));
            endpoint.handler = Some(StreamHandler {
                handle_id: handle.id(),
                pump,
            });
        }

        tracing::debug!("Bound session streams to remote handle {}", handle.id());
    }

    /// Clear the handlers of all four session-scoped streams
    pub fn unbind_session(&self) {
        let mut guard = self.endpoints.write();
        let Some(endpoints) = guard.as_mut() else {
            return;
        };

        let mut cleared = 0;
        for endpoint in endpoints.session.values_mut() {
            if endpoint.handler.take().is_some() {
                cleared += 1;
            }
        }

        if cleared > 0 {
            tracing::debug!("Cleared {} session stream handlers", cleared);
        }
    }

    /// Whether a stream currently has a handler
    ///
    /// Connection status is bound for as long as the router is attached.
    pub fn is_bound(&self, stream: StreamId) -> bool {
        self.bound_handle(stream).is_some()
    }

    /// Identifier of the remote handle feeding a stream
    ///
    /// Connection status reports `"bridge"` while attached.
    pub fn bound_handle(&self, stream: StreamId) -> Option<String> {
        let guard = self.endpoints.read();
        let endpoints = guard.as_ref()?;

        match stream.topic() {
            None => Some("bridge".to_string()),
            Some(topic) => endpoints
                .session
                .get(&topic)?
                .handler
                .as_ref()
                .map(|handler| handler.handle_id.clone()),
        }
    }

    /// Publish a connection event, returning how many subscribers received it
    pub fn publish_connection(&self, event: ConnectionEvent) -> usize {
        let guard = self.endpoints.read();
        let Some(endpoints) = guard.as_ref() else {
            tracing::debug!("Dropping connection event after detach: {:?}", event);
            return 0;
        };

        tracing::debug!(
            "Publishing connection event connected={} code={:?}",
            event.connected,
            event.error_code
        );
        endpoints.connection.send(event).unwrap_or(0)
    }

    /// Subscribe to connection status events
    pub fn connection_status(&self) -> Result<EventSubscription<ConnectionEvent>> {
        let guard = self.endpoints.read();
        let endpoints = guard.as_ref().ok_or(StreamError::Detached)?;
        Ok(EventSubscription::new(
            StreamId::ConnectionStatus,
            endpoints.connection.subscribe(),
        ))
    }

    /// Subscribe to a session-scoped stream
    ///
    /// The subscription may be taken while disconnected; it starts delivering
    /// once a session is bound.
    pub fn listen(&self, stream: StreamId) -> Result<EventSubscription<Value>> {
        let topic = stream.topic().ok_or(StreamError::NotSessionScoped(stream))?;
        let guard = self.endpoints.read();
        let endpoints = guard.as_ref().ok_or(StreamError::Detached)?;
        let endpoint = endpoints
            .session
            .get(&topic)
            .ok_or(StreamError::NotSessionScoped(stream))?;

        Ok(EventSubscription::new(stream, endpoint.sender.subscribe()))
    }
}

impl Drop for SubscriptionRouter {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn pump_feed(
    topic: SessionTopic,
    mut feed: mpsc::UnboundedReceiver<Value>,
    sink: broadcast::Sender<Value>,
) {
    while let Some(payload) = feed.recv().await {
        // No subscribers means nobody is listening right now; the event is dropped.
        let _ = sink.send(payload);
    }
    tracing::debug!("{} feed ended", topic.name());
}
