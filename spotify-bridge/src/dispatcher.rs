//! Method dispatch
//!
//! Incoming calls are looked up in a [`CommandRegistry`] that maps each method
//! name to a [`Route`]: connection management, the access-token flow, or a
//! session-scoped command decoded from the call's arguments and forwarded to the
//! connected remote handle.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use remote_api::{
    ArgumentError, AuthorizationRequest, Authorizer, ImageDimension, PodcastPlaybackSpeed,
    RepeatMode, SessionCommand,
};
use serde_json::{Map, Value};
use tokio::runtime::Handle;

use crate::config::DisconnectedCommandPolicy;
use crate::error::BridgeError;
use crate::manager::{validate_credentials, ConnectionManager, METHOD_CONNECT, METHOD_DISCONNECT};
use crate::pending::PendingOperationTracker;
use crate::reply::Reply;

pub const METHOD_GET_ACCESS_TOKEN: &str = "getAccessToken";

const PARAM_CLIENT_ID: &str = "clientId";
const PARAM_REDIRECT_URL: &str = "redirectUrl";
const PARAM_SCOPE: &str = "scope";
const PARAM_SPOTIFY_URI: &str = "spotifyUri";
const PARAM_IMAGE_URI: &str = "imageUri";
const PARAM_IMAGE_DIMENSION: &str = "imageDimension";
const PARAM_POSITIONED_MS: &str = "positionedMilliseconds";
const PARAM_RELATIVE_MS: &str = "relativeMilliseconds";
const PARAM_PODCAST_SPEED: &str = "podcastPlaybackSpeed";
const PARAM_TRACK_INDEX: &str = "trackIndex";
const PARAM_REPEAT_MODE: &str = "repeatMode";
const PARAM_SHUFFLE: &str = "shuffle";

/// Named arguments of a method call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// String argument, `None` if absent, null or not a string
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn required_str(&self, name: &'static str) -> Result<String, ArgumentError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Err(ArgumentError::Missing(name)),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(ArgumentError::WrongType {
                name,
                expected: "a string",
            }),
        }
    }

    pub fn required_i64(&self, name: &'static str) -> Result<i64, ArgumentError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Err(ArgumentError::Missing(name)),
            Some(value) => value.as_i64().ok_or(ArgumentError::WrongType {
                name,
                expected: "an integer",
            }),
        }
    }

    pub fn required_bool(&self, name: &'static str) -> Result<bool, ArgumentError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Err(ArgumentError::Missing(name)),
            Some(value) => value.as_bool().ok_or(ArgumentError::WrongType {
                name,
                expected: "a boolean",
            }),
        }
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Value> for Arguments {
    /// Objects become named arguments; anything else means no arguments
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

/// A method name with its arguments, as received from the host
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Arguments,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: impl Into<Arguments>) -> Self {
        Self {
            method: method.into(),
            arguments: arguments.into(),
        }
    }

    /// A call without arguments
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Arguments::new())
    }
}

/// Builds a session command from call arguments
pub type CommandDecoder = fn(&Arguments) -> Result<SessionCommand, ArgumentError>;

/// Where a method is handled
#[derive(Clone, Copy)]
pub enum Route {
    Connect,
    Disconnect,
    GetAccessToken,
    Session(CommandDecoder),
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Connect => f.write_str("Connect"),
            Route::Disconnect => f.write_str("Disconnect"),
            Route::GetAccessToken => f.write_str("GetAccessToken"),
            Route::Session(_) => f.write_str("Session"),
        }
    }
}

/// Lookup table from method name to route
pub struct CommandRegistry {
    routes: HashMap<&'static str, Route>,
}

impl CommandRegistry {
    /// An empty registry
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Registry with every method the bridge supports
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        registry.register(METHOD_CONNECT, Route::Connect);
        registry.register(METHOD_DISCONNECT, Route::Disconnect);
        registry.register(METHOD_GET_ACCESS_TOKEN, Route::GetAccessToken);

        registry.register_command("getCrossfadeState", |_| Ok(SessionCommand::GetCrossfadeState));
        registry.register_command("getPlayerState", |_| Ok(SessionCommand::GetPlayerState));
        registry.register_command("play", |args| {
            Ok(SessionCommand::Play {
                spotify_uri: args.required_str(PARAM_SPOTIFY_URI)?,
            })
        });
        registry.register_command("pause", |_| Ok(SessionCommand::Pause));
        registry.register_command("queueTrack", |args| {
            Ok(SessionCommand::QueueTrack {
                spotify_uri: args.required_str(PARAM_SPOTIFY_URI)?,
            })
        });
        registry.register_command("resume", |_| Ok(SessionCommand::Resume));
        registry.register_command("seekTo", |args| {
            Ok(SessionCommand::SeekTo {
                positioned_ms: args.required_i64(PARAM_POSITIONED_MS)?,
            })
        });
        registry.register_command("seekToRelativePosition", |args| {
            Ok(SessionCommand::SeekToRelativePosition {
                relative_ms: args.required_i64(PARAM_RELATIVE_MS)?,
            })
        });
        registry.register_command("setPodcastPlaybackSpeed", |args| {
            Ok(SessionCommand::SetPodcastPlaybackSpeed {
                speed: PodcastPlaybackSpeed::try_from(args.required_i64(PARAM_PODCAST_SPEED)?)?,
            })
        });
        registry.register_command("skipNext", |_| Ok(SessionCommand::SkipNext));
        registry.register_command("skipPrevious", |_| Ok(SessionCommand::SkipPrevious));
        registry.register_command("skipToIndex", |args| {
            Ok(SessionCommand::SkipToIndex {
                spotify_uri: args.required_str(PARAM_SPOTIFY_URI)?,
                track_index: args.required_i64(PARAM_TRACK_INDEX)?,
            })
        });
        registry.register_command("toggleShuffle", |_| Ok(SessionCommand::ToggleShuffle));
        registry.register_command("setShuffle", |args| {
            Ok(SessionCommand::SetShuffle {
                shuffle: args.required_bool(PARAM_SHUFFLE)?,
            })
        });
        registry.register_command("toggleRepeat", |_| Ok(SessionCommand::ToggleRepeat));
        registry.register_command("setRepeatMode", |args| {
            Ok(SessionCommand::SetRepeatMode {
                repeat_mode: RepeatMode::try_from(args.required_i64(PARAM_REPEAT_MODE)?)?,
            })
        });
        registry.register_command("isSpotifyAppActive", |_| Ok(SessionCommand::IsSpotifyAppActive));
        registry.register_command("addToLibrary", |args| {
            Ok(SessionCommand::AddToLibrary {
                spotify_uri: args.required_str(PARAM_SPOTIFY_URI)?,
            })
        });
        registry.register_command("removeFromLibrary", |args| {
            Ok(SessionCommand::RemoveFromLibrary {
                spotify_uri: args.required_str(PARAM_SPOTIFY_URI)?,
            })
        });
        registry.register_command("getCapabilities", |_| Ok(SessionCommand::GetCapabilities));
        registry.register_command("getLibraryState", |args| {
            Ok(SessionCommand::GetLibraryState {
                spotify_uri: args.required_str(PARAM_SPOTIFY_URI)?,
            })
        });
        registry.register_command("getImage", |args| {
            Ok(SessionCommand::GetImage {
                image_uri: args.required_str(PARAM_IMAGE_URI)?,
                dimension: ImageDimension::try_from(args.required_i64(PARAM_IMAGE_DIMENSION)?)?,
            })
        });

        registry
    }

    /// Register or replace a route
    pub fn register(&mut self, method: &'static str, route: Route) {
        if self.routes.insert(method, route).is_some() {
            tracing::debug!("Replaced route for {}", method);
        }
    }

    pub fn register_command(&mut self, method: &'static str, decoder: CommandDecoder) {
        self.register(method, Route::Session(decoder));
    }

    pub fn route(&self, method: &str) -> Option<Route> {
        self.routes.get(method).copied()
    }

    /// All registered method names
    pub fn methods(&self) -> Vec<&'static str> {
        let mut methods: Vec<_> = self.routes.keys().copied().collect();
        methods.sort_unstable();
        methods
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Routes method calls to the component that handles them
pub struct Dispatcher {
    registry: CommandRegistry,
    manager: Arc<ConnectionManager>,
    pending: Arc<PendingOperationTracker>,
    ui: RwLock<Option<Arc<dyn Authorizer>>>,
    runtime: Handle,
    authorization_request_code: i32,
    disconnected_policy: DisconnectedCommandPolicy,
}

impl Dispatcher {
    pub fn new(
        registry: CommandRegistry,
        manager: Arc<ConnectionManager>,
        pending: Arc<PendingOperationTracker>,
        runtime: Handle,
        authorization_request_code: i32,
        disconnected_policy: DisconnectedCommandPolicy,
    ) -> Self {
        Self {
            registry,
            manager,
            pending,
            ui: RwLock::new(None),
            runtime,
            authorization_request_code,
            disconnected_policy,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Make a foreground UI available to the access-token flow
    pub fn attach_ui(&self, ui: Arc<dyn Authorizer>) {
        *self.ui.write() = Some(ui);
        tracing::debug!("Foreground UI attached");
    }

    pub fn detach_ui(&self) {
        if self.ui.write().take().is_some() {
            tracing::debug!("Foreground UI detached");
        }
    }

    pub fn has_ui(&self) -> bool {
        self.ui.read().is_some()
    }

    /// Route one call. Never blocks; the reply may resolve later.
    pub fn dispatch(&self, call: MethodCall) -> Reply {
        let MethodCall { method, arguments } = call;

        let Some(route) = self.registry.route(&method) else {
            tracing::debug!("No route for method {}", method);
            return Reply::ready(Err(BridgeError::NotImplemented { method }));
        };

        tracing::debug!("Dispatching {} via {:?}", method, route);
        match route {
            Route::Connect => self.manager.connect(
                arguments.str(PARAM_CLIENT_ID).unwrap_or_default(),
                arguments.str(PARAM_REDIRECT_URL).unwrap_or_default(),
            ),
            Route::Disconnect => Reply::ready(self.manager.disconnect()),
            Route::GetAccessToken => self.get_access_token(&arguments),
            Route::Session(decode) => self.forward(method, decode, &arguments),
        }
    }

    fn get_access_token(&self, arguments: &Arguments) -> Reply {
        let Some(ui) = self.ui.read().clone() else {
            tracing::error!("{} called without a foreground UI", METHOD_GET_ACCESS_TOKEN);
            return Reply::ready(Err(BridgeError::NoForegroundUi {
                method: METHOD_GET_ACCESS_TOKEN.to_string(),
            }));
        };

        let client_id = arguments.str(PARAM_CLIENT_ID).unwrap_or_default();
        let redirect_url = arguments.str(PARAM_REDIRECT_URL).unwrap_or_default();
        if let Err(err) = validate_credentials(client_id, redirect_url) {
            return Reply::ready(Err(err));
        }

        let (sink, reply) = Reply::channel(METHOD_GET_ACCESS_TOKEN);
        if let Err(err) = self.pending.start(METHOD_GET_ACCESS_TOKEN, sink) {
            return Reply::ready(Err(err));
        }

        let request =
            AuthorizationRequest::token(client_id, redirect_url, self.authorization_request_code)
                .with_scope_list(arguments.str(PARAM_SCOPE));
        tracing::info!("Opening login screen with {} scopes", request.scopes.len());

        if let Err(err) = ui.open_login(request) {
            tracing::warn!("Login screen could not be opened: {}", err);
            self.pending.abandon(move |_| BridgeError::LoginUnavailable(err));
        }

        reply
    }

    fn forward(&self, method: String, decode: CommandDecoder, arguments: &Arguments) -> Reply {
        let Some(handle) = self.manager.connected_handle() else {
            return match self.disconnected_policy {
                DisconnectedCommandPolicy::Reject => {
                    tracing::warn!("Rejecting {}: not connected", method);
                    Reply::ready(Err(BridgeError::SessionUnavailable { method }))
                }
                DisconnectedCommandPolicy::Ignore => {
                    tracing::warn!("Ignoring {}: not connected", method);
                    Reply::ready(Ok(Value::Null))
                }
            };
        };

        let command = match decode(arguments) {
            Ok(command) => command,
            Err(source) => {
                return Reply::ready(Err(BridgeError::InvalidArgument { method, source }));
            }
        };

        let (sink, reply) = Reply::channel(method);
        self.runtime.spawn(async move {
            let result = handle.execute(command).await.map_err(BridgeError::from);
            let _ = sink.send(result);
        });
        reply
    }
}
