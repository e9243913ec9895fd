//! Authorization round-trip through a foreground UI
//!
//! The access-token flow leaves the bridge entirely: an [`Authorizer`] opens a
//! login screen, and the result comes back later as an [`AuthorizationResponse`]
//! on whatever context the host's UI layer uses.

use thiserror::Error;

/// Kind of credential requested from the authorization service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Token,
    Code,
}

/// Everything the login screen needs to run one authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub response_type: ResponseType,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Matches the eventual UI result back to this request
    pub request_code: i32,
}

impl AuthorizationRequest {
    pub fn token(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        request_code: i32,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            response_type: ResponseType::Token,
            redirect_uri: redirect_uri.into(),
            scopes: Vec::new(),
            request_code,
        }
    }

    /// Set scopes from the comma-separated form hosts send
    pub fn with_scope_list(mut self, scope: Option<&str>) -> Self {
        self.scopes = parse_scopes(scope);
        self
    }
}

/// Split a comma-separated scope string, dropping blanks
pub fn parse_scopes(scope: Option<&str>) -> Vec<String> {
    scope
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Result of the login screen as delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResponse {
    Token { access_token: String, expires_in: u64 },
    Error(String),
    Code(String),
    Empty,
    Unknown,
}

/// Failure to launch the login screen
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to open login screen: {0}")]
pub struct AuthorizerError(pub String);

/// Foreground UI able to run the authorization screen
pub trait Authorizer: Send + Sync + 'static {
    /// Open the login screen. Returns once the screen is launched, not when the
    /// user finishes.
    fn open_login(&self, request: AuthorizationRequest) -> Result<(), AuthorizerError>;
}
