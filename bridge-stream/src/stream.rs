//! Stream identities and the host-side receiving end of an endpoint

use std::time::Duration;

use remote_api::SessionTopic;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::error::{Result, StreamError};

/// The five event streams a bridge exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamId {
    ConnectionStatus,
    PlayerContext,
    PlayerState,
    Capabilities,
    UserStatus,
}

impl StreamId {
    pub const ALL: [StreamId; 5] = [
        StreamId::ConnectionStatus,
        StreamId::PlayerContext,
        StreamId::PlayerState,
        StreamId::Capabilities,
        StreamId::UserStatus,
    ];

    /// Channel name hosts use to address this stream
    pub fn channel_name(&self) -> &'static str {
        match self {
            StreamId::ConnectionStatus => "connection_status_subscription",
            StreamId::PlayerContext => "player_context_subscription",
            StreamId::PlayerState => "player_state_subscription",
            StreamId::Capabilities => "capabilities_subscription",
            StreamId::UserStatus => "user_status_subscription",
        }
    }

    pub fn from_channel_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.channel_name() == name)
            .ok_or_else(|| StreamError::UnknownChannel(name.to_string()))
    }

    /// The session topic feeding this stream, `None` for connection status
    pub fn topic(&self) -> Option<SessionTopic> {
        match self {
            StreamId::ConnectionStatus => None,
            StreamId::PlayerContext => Some(SessionTopic::PlayerContext),
            StreamId::PlayerState => Some(SessionTopic::PlayerState),
            StreamId::Capabilities => Some(SessionTopic::Capabilities),
            StreamId::UserStatus => Some(SessionTopic::UserStatus),
        }
    }

    pub fn is_session_scoped(&self) -> bool {
        self.topic().is_some()
    }
}

impl From<SessionTopic> for StreamId {
    fn from(topic: SessionTopic) -> Self {
        match topic {
            SessionTopic::PlayerContext => StreamId::PlayerContext,
            SessionTopic::PlayerState => StreamId::PlayerState,
            SessionTopic::Capabilities => StreamId::Capabilities,
            SessionTopic::UserStatus => StreamId::UserStatus,
        }
    }
}

/// A host's subscription to one stream endpoint
///
/// Receives every event published after it was created. A subscription outlives
/// session changes: when the session is rebound, events from the new session
/// arrive on the same subscription.
pub struct EventSubscription<T> {
    stream: StreamId,
    rx: broadcast::Receiver<T>,
}

impl<T: Clone> EventSubscription<T> {
    pub(crate) fn new(stream: StreamId, rx: broadcast::Receiver<T>) -> Self {
        Self { stream, rx }
    }

    pub fn stream(&self) -> StreamId {
        self.stream
    }

    /// Wait for the next event
    ///
    /// Returns `None` once the endpoint has been released. Events missed because
    /// this subscriber fell behind are skipped.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "Subscriber on {} lagged, skipped {} events",
                        self.stream.channel_name(),
                        skipped
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take an event if one is ready, without waiting
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next event for at most `timeout`
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<T> {
        tokio::time::timeout(timeout, self.recv()).await.ok().flatten()
    }

    /// Drain everything that is currently buffered
    pub fn drain(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StreamId::ConnectionStatus)]
    #[case(StreamId::PlayerContext)]
    #[case(StreamId::PlayerState)]
    #[case(StreamId::Capabilities)]
    #[case(StreamId::UserStatus)]
    fn test_channel_name_lookup(#[case] id: StreamId) {
        assert_eq!(StreamId::from_channel_name(id.channel_name()).unwrap(), id);
    }

    #[test]
    fn test_unknown_channel() {
        assert_eq!(
            StreamId::from_channel_name("volume_subscription"),
            Err(StreamError::UnknownChannel("volume_subscription".into()))
        );
    }

    #[test]
    fn test_only_connection_status_is_unscoped() {
        let scoped: Vec<_> = StreamId::ALL
            .into_iter()
            .filter(StreamId::is_session_scoped)
            .collect();
        assert_eq!(scoped.len(), 4);
        assert!(!StreamId::ConnectionStatus.is_session_scoped());
        for topic in SessionTopic::ALL {
            assert_eq!(StreamId::from(topic).topic(), Some(topic));
        }
    }

    #[tokio::test]
    async fn test_subscription_try_recv_and_close() {
        let (tx, rx) = broadcast::channel(4);
        let mut sub = EventSubscription::new(StreamId::PlayerState, rx);

        assert!(sub.try_recv().is_none());
        tx.send(1u32).unwrap();
        tx.send(2u32).unwrap();
        assert_eq!(sub.drain(), vec![1, 2]);

        drop(tx);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_subscription_skips_lagged_events() {
        let (tx, rx) = broadcast::channel(2);
        let mut sub = EventSubscription::new(StreamId::PlayerState, rx);

        for i in 0..5u32 {
            tx.send(i).unwrap();
        }
        assert_eq!(sub.recv().await, Some(3));
        assert_eq!(sub.recv().await, Some(4));
    }

    #[tokio::test]
    async fn test_recv_timeout_empty() {
        let (_tx, rx) = broadcast::channel::<u32>(2);
        let mut sub = EventSubscription::new(StreamId::UserStatus, rx);
        assert!(sub.recv_timeout(Duration::from_millis(20)).await.is_none());
    }
}
