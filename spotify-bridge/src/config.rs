//! Configuration types for the spotify-bridge crate
//!
//! `BridgeConfig` controls how the bridge talks to the remote app and how it
//! treats commands that arrive without a session.

use serde::Deserialize;

use crate::error::{BridgeError, Result};

/// What to do with a session-scoped command when no session is connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectedCommandPolicy {
    /// Fail the call with `errorNotConnected`
    #[default]
    Reject,
    /// Resolve the call with `null` and log a warning
    Ignore,
}

impl std::str::FromStr for DisconnectedCommandPolicy {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(DisconnectedCommandPolicy::Reject),
            "ignore" => Ok(DisconnectedCommandPolicy::Ignore),
            other => Err(BridgeError::Configuration(format!(
                "Unknown disconnected command policy: {}",
                other
            ))),
        }
    }
}

/// Configuration for a SpotifyBridge
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Let the remote SDK show its authorization view while connecting
    /// Default: true
    pub show_auth_view: bool,

    /// Request code that identifies login screen results for the access-token flow
    /// Default: 1337
    pub authorization_request_code: i32,

    /// Events each stream endpoint buffers for slow subscribers
    /// Default: 256
    pub event_buffer_size: usize,

    /// Handling of session-scoped commands without a session
    /// Default: Reject
    pub disconnected_command_policy: DisconnectedCommandPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            show_auth_view: true,
            authorization_request_code: 1337,
            event_buffer_size: 256,
            disconnected_command_policy: DisconnectedCommandPolicy::Reject,
        }
    }
}

impl BridgeConfig {
    /// Create a new BridgeConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a BridgeConfig that silently ignores session-scoped commands
    /// while disconnected, for hosts written against that behaviour
    pub fn lenient() -> Self {
        Self {
            disconnected_command_policy: DisconnectedCommandPolicy::Ignore,
            ..Default::default()
        }
    }

    /// Apply overrides from `SPOTIFY_BRIDGE_*` environment variables
    ///
    /// - `SPOTIFY_BRIDGE_SHOW_AUTH_VIEW`: `true` / `false`
    /// - `SPOTIFY_BRIDGE_AUTH_REQUEST_CODE`: integer
    /// - `SPOTIFY_BRIDGE_EVENT_BUFFER_SIZE`: integer
    /// - `SPOTIFY_BRIDGE_DISCONNECTED_COMMANDS`: `reject` / `ignore`
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `lookup`
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = lookup("SPOTIFY_BRIDGE_SHOW_AUTH_VIEW") {
            self.show_auth_view = parse_var("SPOTIFY_BRIDGE_SHOW_AUTH_VIEW", &value)?;
        }
        if let Some(value) = lookup("SPOTIFY_BRIDGE_AUTH_REQUEST_CODE") {
            self.authorization_request_code = parse_var("SPOTIFY_BRIDGE_AUTH_REQUEST_CODE", &value)?;
        }
        if let Some(value) = lookup("SPOTIFY_BRIDGE_EVENT_BUFFER_SIZE") {
            self.event_buffer_size = parse_var("SPOTIFY_BRIDGE_EVENT_BUFFER_SIZE", &value)?;
        }
        if let Some(value) = lookup("SPOTIFY_BRIDGE_DISCONNECTED_COMMANDS") {
            self.disconnected_command_policy = value.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(BridgeError::Configuration(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BridgeError::Configuration(format!("Invalid value for {}: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert!(config.show_auth_view);
        assert_eq!(config.authorization_request_code, 1337);
        assert_eq!(config.event_buffer_size, 256);
        assert_eq!(
            config.disconnected_command_policy,
            DisconnectedCommandPolicy::Reject
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lenient_preset() {
        assert_eq!(
            BridgeConfig::lenient().disconnected_command_policy,
            DisconnectedCommandPolicy::Ignore
        );
    }

    #[test]
    fn test_zero_buffer_is_invalid() {
        let config = BridgeConfig {
            event_buffer_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BridgeError::Configuration(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SPOTIFY_BRIDGE_SHOW_AUTH_VIEW", "false"),
            ("SPOTIFY_BRIDGE_AUTH_REQUEST_CODE", "42"),
            ("SPOTIFY_BRIDGE_DISCONNECTED_COMMANDS", "Ignore"),
        ]
        .into_iter()
        .collect();

        let config = BridgeConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert!(!config.show_auth_view);
        assert_eq!(config.authorization_request_code, 42);
        assert_eq!(config.event_buffer_size, 256);
        assert_eq!(
            config.disconnected_command_policy,
            DisconnectedCommandPolicy::Ignore
        );
    }

    #[test]
    fn test_bad_override_is_reported() {
        let result = BridgeConfig::default().with_overrides(|key| {
            (key == "SPOTIFY_BRIDGE_EVENT_BUFFER_SIZE").then(|| "lots".to_string())
        });
        match result {
            Err(BridgeError::Configuration(msg)) => {
                assert!(msg.contains("SPOTIFY_BRIDGE_EVENT_BUFFER_SIZE"))
            }
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_partial() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"disconnected_command_policy": "ignore"}"#).unwrap();
        assert_eq!(
            config.disconnected_command_policy,
            DisconnectedCommandPolicy::Ignore
        );
        assert_eq!(config.authorization_request_code, 1337);
    }
}
