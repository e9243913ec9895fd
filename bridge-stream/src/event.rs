//! Payload of the connection status stream

use serde::{Deserialize, Serialize};

/// A change in the bridge's connection to the remote app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEvent {
    pub connected: bool,
    pub message: String,
    pub error_code: Option<String>,
    pub error_detail: Option<String>,
}

impl ConnectionEvent {
    pub fn connected(message: impl Into<String>) -> Self {
        Self {
            connected: true,
            message: message.into(),
            error_code: None,
            error_detail: None,
        }
    }

    /// Orderly disconnect, no error attached
    pub fn disconnected(message: impl Into<String>) -> Self {
        Self {
            connected: false,
            message: message.into(),
            error_code: None,
            error_detail: None,
        }
    }

    /// The connection dropped with an error
    pub fn failed(
        message: impl Into<String>,
        error_code: impl Into<String>,
        error_detail: impl Into<String>,
    ) -> Self {
        Self {
            connected: false,
            message: message.into(),
            error_code: Some(error_code.into()),
            error_detail: Some(error_detail.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_code.is_some()
    }
}
