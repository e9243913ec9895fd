//! Shared helpers for the spotify-bridge integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use remote_api::testing::{RecordingAuthorizer, ScriptedConnector};
use serde_json::{json, Value};
use spotify_bridge::{BridgeConfig, ConnectionEvent, EventSubscription, SpotifyBridge};

pub const CLIENT_ID: &str = "abc123";
pub const REDIRECT_URL: &str = "app://callback";

/// How long to wait for an event that is expected to arrive
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(1);

/// How long to wait before concluding that no event is coming
pub const QUIET_PERIOD: Duration = Duration::from_millis(50);

pub struct TestBridge {
    pub bridge: SpotifyBridge,
    pub connector: ScriptedConnector,
    pub status: EventSubscription<ConnectionEvent>,
}

pub fn attach(connector: ScriptedConnector, config: BridgeConfig) -> TestBridge {
    let bridge = SpotifyBridge::attach(Arc::new(connector.clone()), config)
        .expect("Failed to attach bridge");
    let status = bridge
        .connection_status()
        .expect("Failed to subscribe to connection status");

    TestBridge {
        bridge,
        connector,
        status,
    }
}

pub fn attach_default() -> TestBridge {
    attach(ScriptedConnector::new(), BridgeConfig::default())
}

pub fn attach_with_ui() -> (TestBridge, RecordingAuthorizer) {
    let test = attach_default();
    let ui = RecordingAuthorizer::new();
    test.bridge.attach_ui(Arc::new(ui.clone()));
    (test, ui)
}

pub fn credentials() -> Value {
    json!({"clientId": CLIENT_ID, "redirectUrl": REDIRECT_URL})
}

/// Connect and wait for the call to resolve
pub async fn connect(test: &TestBridge) {
    let reply = test.bridge.call("connectToSpotify", credentials());
    test.connector.succeed();
    let result = reply.await.expect("Connect failed");
    assert_eq!(result, Value::Bool(true));
}

/// Assert that nothing arrives on a subscription for a short while
pub async fn assert_quiet<T: Clone + std::fmt::Debug>(sub: &mut EventSubscription<T>) {
    if let Some(event) = sub.recv_timeout(QUIET_PERIOD).await {
        panic!("Unexpected event on {:?}: {:?}", sub.stream(), event);
    }
}
