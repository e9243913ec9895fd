//! Single-flight guard for operations that leave the bridge
//!
//! The access-token flow hands control to a login screen and resumes when the
//! host delivers the screen's result, possibly on another thread. Only one such
//! operation may be outstanding; a second attempt is an integration error and is
//! rejected outright.

use parking_lot::Mutex;
use remote_api::AuthorizationResponse;
use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::reply::ReplySink;

/// The one operation currently waiting on an external callback
pub struct PendingOperation {
    method: String,
    sink: ReplySink,
}

impl PendingOperation {
    pub fn method(&self) -> &str {
        &self.method
    }
}

/// Holds at most one [`PendingOperation`]
#[derive(Default)]
pub struct PendingOperationTracker {
    slot: Mutex<Option<PendingOperation>>,
}

impl PendingOperationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `method`
    ///
    /// Fails with [`BridgeError::ConcurrentOperation`] if another operation is
    /// pending. The rejected sink is dropped; the caller reports the error directly.
    pub fn start(&self, method: &str, sink: ReplySink) -> Result<()> {
        let mut slot = self.slot.lock();

        if let Some(pending) = slot.as_ref() {
            tracing::error!(
                "Concurrent operations detected: {} is pending, {} rejected",
                pending.method,
                method
            );
            return Err(BridgeError::ConcurrentOperation {
                pending: pending.method.clone(),
                attempted: method.to_string(),
            });
        }

        tracing::debug!("Pending operation started: {}", method);
        *slot = Some(PendingOperation {
            method: method.to_string(),
            sink,
        });
        Ok(())
    }

    /// Resolve the pending operation with an authorization outcome
    ///
    /// Returns `false` if nothing was pending, in which case the outcome is dropped.
    pub fn complete(&self, response: AuthorizationResponse) -> bool {
        let Some(pending) = self.slot.lock().take() else {
            tracing::warn!("Dropping authorization result: no operation pending");
            return false;
        };

        let result = match response {
            AuthorizationResponse::Token { access_token, .. } => Ok(Value::String(access_token)),
            AuthorizationResponse::Error(detail) => Err(BridgeError::Authentication { detail }),
            other => {
                tracing::warn!("Unhandled authorization response for {}: {:?}", pending.method, other);
                Err(BridgeError::NotImplemented {
                    method: pending.method.clone(),
                })
            }
        };

        tracing::debug!(
            "Pending operation {} completed (success={})",
            pending.method,
            result.is_ok()
        );
        if pending.sink.send(result).is_err() {
            tracing::debug!("Caller of {} went away before completion", pending.method);
        }
        true
    }

    /// Clear the slot, failing the pending caller with an error built from its method
    pub fn abandon(&self, make_error: impl FnOnce(&str) -> BridgeError) -> bool {
        let Some(pending) = self.slot.lock().take() else {
            return false;
        };

        let error = make_error(&pending.method);
        tracing::debug!("Pending operation {} abandoned: {}", pending.method, error);
        let _ = pending.sink.send(Err(error));
        true
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Method name of the pending operation, if any
    pub fn pending_method(&self) -> Option<String> {
        self.slot.lock().as_ref().map(|p| p.method().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::Reply;

    const METHOD: &str = "getAccessToken";

    #[tokio::test]
    async fn test_token_resolves_caller() {
        let tracker = PendingOperationTracker::new();
        let (sink, reply) = Reply::channel(METHOD);

        tracker.start(METHOD, sink).unwrap();
        assert_eq!(tracker.pending_method().as_deref(), Some(METHOD));

        assert!(tracker.complete(AuthorizationResponse::Token {
            access_token: "tok".to_string(),
            expires_in: 3600,
        }));
        assert!(!tracker.is_pending());
        assert_eq!(reply.await.unwrap(), Value::String("tok".to_string()));
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let tracker = PendingOperationTracker::new();
        let (first, _first_reply) = Reply::channel(METHOD);
        let (second, _second_reply) = Reply::channel(METHOD);

        tracker.start(METHOD, first).unwrap();
        let err = tracker.start(METHOD, second).unwrap_err();
        assert!(matches!(err, BridgeError::ConcurrentOperation { .. }));
        assert_eq!(tracker.pending_method().as_deref(), Some(METHOD));
    }

    #[tokio::test]
    async fn test_error_response() {
        let tracker = PendingOperationTracker::new();
        let (sink, reply) = Reply::channel(METHOD);
        tracker.start(METHOD, sink).unwrap();

        tracker.complete(AuthorizationResponse::Error("access_denied".to_string()));
        match reply.await {
            Err(BridgeError::Authentication { detail }) => assert_eq!(detail, "access_denied"),
            other => panic!("Expected Authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unrecognized_response_is_not_implemented() {
        let tracker = PendingOperationTracker::new();
        let (sink, reply) = Reply::channel(METHOD);
        tracker.start(METHOD, sink).unwrap();

        tracker.complete(AuthorizationResponse::Code("abc".to_string()));
        assert!(reply.await.unwrap_err().is_not_implemented());
    }

    #[test]
    fn test_completion_without_pending_is_dropped() {
        let tracker = PendingOperationTracker::new();
        assert!(!tracker.complete(AuthorizationResponse::Empty));
    }

    #[tokio::test]
    async fn test_slot_reusable_after_completion() {
        let tracker = PendingOperationTracker::new();
        let (sink, _reply) = Reply::channel(METHOD);
        tracker.start(METHOD, sink).unwrap();
        tracker.complete(AuthorizationResponse::Empty);

        let (sink, _reply) = Reply::channel(METHOD);
        assert!(tracker.start(METHOD, sink).is_ok());
    }

    #[tokio::test]
    async fn test_abandon_fails_caller() {
        let tracker = PendingOperationTracker::new();
        let (sink, reply) = Reply::channel(METHOD);
        tracker.start(METHOD, sink).unwrap();

        assert!(tracker.abandon(|method| BridgeError::Detached {
            method: method.to_string()
        }));
        assert!(!tracker.abandon(|_| BridgeError::NoRuntime));
        assert!(matches!(reply.await, Err(BridgeError::Detached { .. })));
    }
}
