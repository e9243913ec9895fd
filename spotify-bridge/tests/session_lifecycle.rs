//! Session lifecycle through the public bridge API.
//!
//! Covers connect outcomes, post-connect failures, disconnect and stream
//! rebinding across reconnects.

mod common;

use common::*;
use proptest::prelude::*;
use remote_api::{FailureKind, RemoteFailure, SessionTopic};
use serde_json::{json, Value};
use spotify_bridge::{BridgeConfig, ConnectionEvent, SessionState, StreamId};

const SESSION_STREAMS: [StreamId; 4] = [
    StreamId::PlayerContext,
    StreamId::PlayerState,
    StreamId::Capabilities,
    StreamId::UserStatus,
];

#[tokio::test]
async fn test_connect_example() {
    let mut test = attach_default();

    let reply = test.bridge.call("connectToSpotify", credentials());
    assert_eq!(test.bridge.session_state(), SessionState::Connecting);
    assert!(test.bridge.pending_operation().is_none());

    test.connector.succeed();
    assert_eq!(reply.await.unwrap(), Value::Bool(true));
    assert!(test.bridge.pending_operation().is_none());

    let event = test.status.recv_timeout(EVENT_TIMEOUT).await.unwrap();
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({
            "connected": true,
            "message": "Successfully connected to Spotify.",
            "errorCode": null,
            "errorDetail": null,
        })
    );
    assert_quiet(&mut test.status).await;
    assert_eq!(test.bridge.session_state(), SessionState::Connected);
}

#[tokio::test]
async fn test_streams_are_bound_when_connect_resolves() {
    let test = attach_default();
    let mut player = test.bridge.listen(StreamId::PlayerState).unwrap();

    connect(&test).await;

    for stream in SESSION_STREAMS {
        assert_eq!(
            test.bridge.router().bound_handle(stream).as_deref(),
            Some("scripted-1"),
            "{:?} not bound",
            stream
        );
    }

    let handle = test.connector.handles()[0].clone();
    assert_eq!(handle.emit(SessionTopic::PlayerState, json!({"isPaused": false})), 1);
    assert_eq!(
        player.recv_timeout(EVENT_TIMEOUT).await,
        Some(json!({"isPaused": false}))
    );
}

#[tokio::test]
async fn test_first_time_failure_fails_call_without_event() {
    let mut test = attach_default();

    let reply = test.bridge.call("connectToSpotify", credentials());
    test.connector.fail(RemoteFailure::new(
        FailureKind::AppNotFound,
        "Spotify is not installed",
    ));

    let err = reply.await.unwrap_err();
    assert_eq!(err.code(), "CouldNotFindSpotifyApp");
    assert_eq!(err.message(), "Spotify is not installed");
    assert_eq!(
        err.details().as_deref(),
        Some("CouldNotFindSpotifyApp: Spotify is not installed")
    );

    assert_eq!(test.bridge.session_state(), SessionState::Disconnected);
    assert_quiet(&mut test.status).await;
}

#[tokio::test]
async fn test_unknown_failure_uses_fallback_code() {
    let test = attach_default();

    let reply = test.bridge.call("connectToSpotify", credentials());
    test.connector
        .fail(RemoteFailure::bare(FailureKind::Other("IllegalStateException".to_string())));

    let err = reply.await.unwrap_err();
    assert_eq!(err.code(), "errorConnection");
    assert_eq!(err.message(), "Unknown error");
}

#[tokio::test]
async fn test_failure_after_connect_is_reported_as_event_only() {
    let mut test = attach_default();
    connect(&test).await;
    assert!(test.status.recv_timeout(EVENT_TIMEOUT).await.unwrap().connected);

    test.connector.fail(RemoteFailure::new(
        FailureKind::Disconnected,
        "Connection lost",
    ));

    let event = test.status.recv_timeout(EVENT_TIMEOUT).await.unwrap();
    assert_eq!(
        event,
        ConnectionEvent::failed(
            "Connection lost",
            "SpotifyDisconnectedException",
            "SpotifyDisconnectedException: Connection lost"
        )
    );
    assert_eq!(test.bridge.session_state(), SessionState::Disconnected);
    for stream in SESSION_STREAMS {
        assert!(!test.bridge.router().is_bound(stream));
    }
    assert!(test.bridge.router().is_bound(StreamId::ConnectionStatus));
}

#[tokio::test]
async fn test_disconnect_when_disconnected_fails_without_event() {
    let mut test = attach_default();

    let err = test
        .bridge
        .call("disconnectFromSpotify", Value::Null)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "errorDisconnecting");
    assert_eq!(err.message(), "Could not disconnect Spotify remote");
    assert_quiet(&mut test.status).await;
}

#[tokio::test]
async fn test_connect_disconnect_connect_rebinds_streams() {
    let mut test = attach_default();
    let mut capabilities = test.bridge.listen(StreamId::Capabilities).unwrap();

    connect(&test).await;
    assert!(test.status.recv_timeout(EVENT_TIMEOUT).await.unwrap().connected);

    let result = test
        .bridge
        .call("disconnectFromSpotify", Value::Null)
        .await
        .unwrap();
    assert_eq!(result, Value::Bool(true));
    let event = test.status.recv_timeout(EVENT_TIMEOUT).await.unwrap();
    assert_eq!(
        event,
        ConnectionEvent::disconnected("Successfully disconnected from Spotify.")
    );
    for stream in SESSION_STREAMS {
        assert!(!test.bridge.router().is_bound(stream));
    }

    connect(&test).await;
    for stream in SESSION_STREAMS {
        assert_eq!(
            test.bridge.router().bound_handle(stream).as_deref(),
            Some("scripted-2")
        );
    }

    let handles = test.connector.handles();
    assert_eq!(handles[0].disconnect_count(), 1);
    assert_eq!(handles[1].emit(SessionTopic::Capabilities, json!({"canPlayOnDemand": true})), 1);
    assert_eq!(
        capabilities.recv_timeout(EVENT_TIMEOUT).await,
        Some(json!({"canPlayOnDemand": true}))
    );
}

#[tokio::test]
async fn test_reconnect_tears_down_previous_handle_first() {
    let test = attach_default();
    connect(&test).await;

    let reply = test.bridge.call("connectToSpotify", credentials());
    let handles = test.connector.handles();
    assert_eq!(handles[0].disconnect_count(), 1);
    assert!(!test.bridge.router().is_bound(StreamId::UserStatus));

    test.connector.succeed();
    assert_eq!(reply.await.unwrap(), Value::Bool(true));
    assert_eq!(test.connector.attempt_count(), 2);
    assert_eq!(
        test.bridge.router().bound_handle(StreamId::UserStatus).as_deref(),
        Some("scripted-2")
    );
}

#[tokio::test]
async fn test_nothing_delivered_while_disconnected() {
    let test = attach_default();
    let mut context = test.bridge.listen(StreamId::PlayerContext).unwrap();

    connect(&test).await;
    let stale = test.connector.handles()[0].clone();
    stale.keep_feeds_on_disconnect(true);
    test.bridge
        .call("disconnectFromSpotify", Value::Null)
        .await
        .unwrap();
    assert!(!test.bridge.router().is_bound(StreamId::PlayerContext));

    // The feed outlives the session; only the router's unbind stops delivery.
    stale.emit(SessionTopic::PlayerContext, json!({"title": "late"}));
    assert_quiet(&mut context).await;
}

#[tokio::test]
async fn test_connect_while_connecting_is_rejected() {
    let test = attach_default();

    let first = test.bridge.call("connectToSpotify", credentials());
    let err = test
        .bridge
        .call("connectToSpotify", credentials())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "errorConcurrentOperation");

    test.connector.succeed();
    assert_eq!(first.await.unwrap(), Value::Bool(true));
    assert_eq!(test.connector.attempt_count(), 1);
}

fn blank() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec![' ', '\t', '\n']), 0..4)
        .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_blank_credentials_never_reach_remote(
        blank_value in blank(),
        valid in "[a-z0-9]{1,12}",
        blank_client in any::<bool>(),
    ) {
        tokio_test::block_on(async {
            let test = attach(
                remote_api::testing::ScriptedConnector::new(),
                BridgeConfig::default(),
            );
            let (client_id, redirect_url) = if blank_client {
                (blank_value.clone(), valid.clone())
            } else {
                (valid.clone(), blank_value.clone())
            };

            let reply = test.bridge.call(
                "connectToSpotify",
                json!({"clientId": client_id, "redirectUrl": redirect_url}),
            );
            prop_assert!(reply.is_ready());
            let err = reply.await.unwrap_err();
            prop_assert_eq!(err.code(), "errorConnecting");
            prop_assert_eq!(test.connector.attempt_count(), 0);
            prop_assert_eq!(test.bridge.session_state(), SessionState::Disconnected);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
