//! Deferred call results
//!
//! Dispatch never blocks. A call either resolves on the spot (validation errors,
//! disconnect) or hands back a [`Reply`] whose outcome is delivered later from a
//! callback context. Await the reply to get the outcome.

use std::future::IntoFuture;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{BridgeError, Result};

/// Sending half handed to whoever resolves a deferred call
pub type ReplySink = oneshot::Sender<Result<Value>>;

enum ReplyState {
    Ready(Result<Value>),
    Pending {
        method: String,
        rx: oneshot::Receiver<Result<Value>>,
    },
}

/// Outcome of a dispatched call, possibly still in flight
pub struct Reply {
    state: ReplyState,
}

impl Reply {
    pub fn ready(result: Result<Value>) -> Self {
        Self {
            state: ReplyState::Ready(result),
        }
    }

    /// A reply resolved later through the sink paired with `rx`
    pub fn pending(method: impl Into<String>, rx: oneshot::Receiver<Result<Value>>) -> Self {
        Self {
            state: ReplyState::Pending {
                method: method.into(),
                rx,
            },
        }
    }

    /// Create a deferred reply together with its sink
    pub fn channel(method: impl Into<String>) -> (ReplySink, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self::pending(method, rx))
    }

    /// Whether the outcome was already known at dispatch time
    pub fn is_ready(&self) -> bool {
        matches!(self.state, ReplyState::Ready(_))
    }
}

impl IntoFuture for Reply {
    type Output = Result<Value>;
    type IntoFuture = BoxFuture<'static, Result<Value>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            match self.state {
                ReplyState::Ready(result) => result,
                // A dropped sink means the resolver was torn down with the bridge.
                ReplyState::Pending { method, rx } => rx
                    .await
                    .unwrap_or_else(|_| Err(BridgeError::Detached { method })),
            }
        })
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            ReplyState::Ready(result) => f.debug_tuple("Reply::Ready").field(result).finish(),
            ReplyState::Pending { method, .. } => {
                f.debug_struct("Reply::Pending").field("method", method).finish()
            }
        }
    }
}
