//! # Bridge Stream
//!
//! Host-facing event streams for `spotify-bridge`.
//!
//! A bridge exposes five streams:
//!
//! | Stream | Channel name | Fed by |
//! |---|---|---|
//! | [`StreamId::ConnectionStatus`] | `connection_status_subscription` | the bridge itself, for the whole attachment |
//! | [`StreamId::PlayerContext`] | `player_context_subscription` | current remote handle |
//! | [`StreamId::PlayerState`] | `player_state_subscription` | current remote handle |
//! | [`StreamId::Capabilities`] | `capabilities_subscription` | current remote handle |
//! | [`StreamId::UserStatus`] | `user_status_subscription` | current remote handle |
//!
//! The [`SubscriptionRouter`] binds the four session-scoped streams when a
//! session connects and clears them when it leaves the connected state.
//! Host subscriptions survive rebinding.

pub mod error;
pub mod event;
pub mod router;
pub mod stream;

pub use error::{Result, StreamError};
pub use event::ConnectionEvent;
pub use router::SubscriptionRouter;
pub use stream::{EventSubscription, StreamId};
