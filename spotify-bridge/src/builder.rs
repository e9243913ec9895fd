//! Builder for creating and configuring a SpotifyBridge.
//!
//! # Example
//!
//! ```rust,ignore
//! use spotify_bridge::{DisconnectedCommandPolicy, SpotifyBridge};
//!
//! let bridge = SpotifyBridge::builder()
//!     .with_connector(connector)
//!     .with_event_buffer_size(64)
//!     .with_disconnected_command_policy(DisconnectedCommandPolicy::Ignore)
//!     .build()?;
//! ```

use std::sync::Arc;

use remote_api::{Authorizer, RemoteConnector};
use tokio::runtime::Handle;

use crate::bridge::SpotifyBridge;
use crate::config::{BridgeConfig, DisconnectedCommandPolicy};
use crate::dispatcher::{CommandDecoder, CommandRegistry};
use crate::error::{BridgeError, Result};

/// Builder for a [`SpotifyBridge`]
///
/// # Validation
///
/// `build()` fails when:
/// - no connector was provided
/// - the configuration is invalid
/// - no runtime was given and none is current
pub struct SpotifyBridgeBuilder {
    connector: Option<Arc<dyn RemoteConnector>>,
    config: BridgeConfig,
    registry: CommandRegistry,
    runtime: Option<Handle>,
    ui: Option<Arc<dyn Authorizer>>,
}

impl SpotifyBridgeBuilder {
    /// Create a builder with the default configuration and every standard method
    pub fn new() -> Self {
        Self {
            connector: None,
            config: BridgeConfig::default(),
            registry: CommandRegistry::standard(),
            runtime: None,
            ui: None,
        }
    }

    pub fn with_connector(mut self, connector: Arc<dyn RemoteConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_auth_view(mut self, show_auth_view: bool) -> Self {
        self.config.show_auth_view = show_auth_view;
        self
    }

    pub fn with_authorization_request_code(mut self, request_code: i32) -> Self {
        self.config.authorization_request_code = request_code;
        self
    }

    /// Set how many events each stream buffers for slow subscribers
    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.config.event_buffer_size = size;
        self
    }

    pub fn with_disconnected_command_policy(mut self, policy: DisconnectedCommandPolicy) -> Self {
        self.config.disconnected_command_policy = policy;
        self
    }

    /// Register an extra session-scoped method, or replace a standard one
    pub fn with_command(mut self, method: &'static str, decoder: CommandDecoder) -> Self {
        self.registry.register_command(method, decoder);
        self
    }

    /// Run listener and command tasks on this runtime instead of the current one
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Attach a foreground UI right after building
    pub fn with_ui(mut self, ui: Arc<dyn Authorizer>) -> Self {
        self.ui = Some(ui);
        self
    }

    pub fn build(self) -> Result<SpotifyBridge> {
        let connector = self.connector.ok_or_else(|| {
            BridgeError::Configuration("A remote connector is required".to_string())
        })?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| BridgeError::NoRuntime)?,
        };

        let bridge = SpotifyBridge::assemble(connector, self.config, runtime, self.registry)?;
        if let Some(ui) = self.ui {
            bridge.attach_ui(ui);
        }
        Ok(bridge)
    }
}

impl Default for SpotifyBridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_api::testing::{RecordingAuthorizer, ScriptedConnector};
    use remote_api::SessionCommand;

    #[tokio::test]
    async fn test_build_requires_connector() {
        let result = SpotifyBridgeBuilder::new().build();
        assert!(matches!(result, Err(BridgeError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_build_applies_settings() {
        let bridge = SpotifyBridgeBuilder::new()
            .with_connector(Arc::new(ScriptedConnector::new()))
            .with_auth_view(false)
            .with_authorization_request_code(42)
            .with_event_buffer_size(8)
            .with_disconnected_command_policy(DisconnectedCommandPolicy::Ignore)
            .with_ui(Arc::new(RecordingAuthorizer::new()))
            .build()
            .unwrap();

        let config = bridge.config();
        assert!(!config.show_auth_view);
        assert_eq!(config.authorization_request_code, 42);
        assert_eq!(config.event_buffer_size, 8);
        assert_eq!(
            config.disconnected_command_policy,
            DisconnectedCommandPolicy::Ignore
        );
    }

    #[tokio::test]
    async fn test_extra_command_is_routed() {
        let bridge = SpotifyBridgeBuilder::new()
            .with_connector(Arc::new(ScriptedConnector::new()))
            .with_disconnected_command_policy(DisconnectedCommandPolicy::Ignore)
            .with_command("stop", |_| Ok(SessionCommand::Pause))
            .build()
            .unwrap();

        let result = bridge.call("stop", serde_json::Value::Null).await;
        assert_eq!(result.unwrap(), serde_json::Value::Null);
    }
}
