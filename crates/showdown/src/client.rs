//! `Client` builder, command surface, and connection lifecycle.
//!
//! This is the entry point for talking to a server. It ties together all
//! the layers: transport → protocol → session → rooms, with the receive
//! loop, the output drain, and any embedder jobs running as one task
//! group per connection.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use showdown_interval::{from_fn, TaskGroup};
use showdown_protocol::{normalize_id, DEFAULT_ROOM};
use showdown_room::{Room, RoomConfig, RoomRegistry};
use showdown_session::{
    AuthSession, AuthState, Challenge, CredentialExchange, Credentials, LoginResponse,
    ReplayStore, ServerAddress, ServerResolver, StaticResolver,
};
use showdown_transport::{Connection, Connector};
use tokio::sync::Mutex;

use crate::handler::Receiver;
use crate::output::{Drain, OutputItem, OutputQueue};
use crate::{ClientConfig, Hooks, ShowdownError};

type TaskFn =
    Arc<dyn Fn(Client) -> LocalBoxFuture<'static, Result<(), ShowdownError>> + Send + Sync>;

/// An embedder job run on a fixed interval for as long as a connection
/// lives.
#[derive(Clone)]
struct PeriodicTask {
    name: String,
    interval: Duration,
    work: TaskFn,
}

/// Per-connection protocol state, guarded by one lock.
pub(crate) struct SessionState {
    pub(crate) auth: AuthSession,
    pub(crate) rooms: RoomRegistry,
}

/// State shared by every clone of a [`Client`].
pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) url: String,
    pub(crate) state: Mutex<SessionState>,
    pub(crate) output: OutputQueue,
    credentials: Option<Arc<dyn CredentialExchange>>,
    replays: Option<Arc<dyn ReplayStore>>,
    tasks: Vec<PeriodicTask>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`Client`].
///
/// # Example
///
/// ```rust,ignore
/// use showdown::prelude::*;
///
/// let client = Client::builder()
///     .name("Ash")
///     .password("pikachu")
///     .every("ladder", Duration::from_secs(30), |client| async move {
///         client.query_battles("gen9ou", None);
///         Ok(())
///     })
///     .build()
///     .await?;
/// client.run(&mut MyHooks).await
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
    resolver: Option<Box<dyn ServerResolver>>,
    credentials: Option<Arc<dyn CredentialExchange>>,
    replays: Option<Option<Arc<dyn ReplayStore>>>,
    tasks: Vec<PeriodicTask>,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            resolver: None,
            credentials: None,
            replays: None,
            tasks: Vec::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    pub fn server_id(mut self, server_id: impl Into<String>) -> Self {
        self.config.server_id = server_id.into();
        self
    }

    pub fn autologin(mut self, autologin: bool) -> Self {
        self.config.autologin = autologin;
        self
    }

    pub fn max_room_logs(mut self, max_room_logs: usize) -> Self {
        self.config.max_room_logs = max_room_logs;
        self
    }

    pub fn per_command_delay(mut self, delay: Duration) -> Self {
        self.config.per_command_delay = delay;
        self
    }

    pub fn message_limit(mut self, limit: usize) -> Self {
        self.config.message_limit = limit;
        self
    }

    /// Sets how the server id is turned into an address.
    pub fn resolver(mut self, resolver: impl ServerResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Connects to `address` without resolving the server id.
    pub fn address(self, address: ServerAddress) -> Self {
        self.resolver(StaticResolver(address))
    }

    /// Sets the service that trades credentials for an identity assertion.
    pub fn credential_exchange(mut self, exchange: impl CredentialExchange + 'static) -> Self {
        self.credentials = Some(Arc::new(exchange));
        self
    }

    /// Sets where replays from `savereplay` responses are uploaded.
    pub fn replay_store(mut self, store: impl ReplayStore + 'static) -> Self {
        self.replays = Some(Some(Arc::new(store)));
        self
    }

    /// Drops `savereplay` responses instead of uploading them.
    pub fn no_replay_store(mut self) -> Self {
        self.replays = Some(None);
        self
    }

    /// Runs `work` every `interval` while connected.
    ///
    /// The interval is measured from the start of the previous run. An
    /// error returned by `work` ends the connection.
    pub fn every<F, Fut>(mut self, name: impl Into<String>, interval: Duration, work: F) -> Self
    where
        F: Fn(Client) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ShowdownError>> + 'static,
    {
        let work: TaskFn = Arc::new(move |client| work(client).boxed_local());
        self.tasks.push(PeriodicTask {
            name: name.into(),
            interval,
            work,
        });
        self
    }

    /// Validates the configuration and resolves the server address.
    ///
    /// Resolution happens exactly once; every connection made by the
    /// returned client uses the same URL.
    pub async fn build(self) -> Result<Client, ShowdownError> {
        let config = self.config;
        let auth = AuthSession::new(
            Credentials::from_parts(&config.name, &config.password),
            config.autologin,
        );
        auth.validate()?;

        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => default_resolver()?,
        };
        let address = resolver.resolve(&config.server_id).await?;
        let url = address.websocket_url();
        tracing::info!(server_id = %config.server_id, %url, "client configured");

        let credentials = self.credentials.or_else(|| {
            default_action_client(&config.server_id).map(|c| c as Arc<dyn CredentialExchange>)
        });
        let replays = match self.replays {
            Some(replays) => replays,
            None => default_action_client(&config.server_id).map(|c| c as Arc<dyn ReplayStore>),
        };

        let rooms = RoomRegistry::new(RoomConfig::with_max_logs(config.max_room_logs));
        Ok(Client {
            shared: Arc::new(Shared {
                config,
                url,
                state: Mutex::new(SessionState { auth, rooms }),
                output: OutputQueue::new(),
                credentials,
                replays,
                tasks: self.tasks,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
fn default_resolver() -> Result<Box<dyn ServerResolver>, ShowdownError> {
    Ok(Box::new(showdown_session::HttpServerResolver::new()))
}

#[cfg(not(feature = "http"))]
fn default_resolver() -> Result<Box<dyn ServerResolver>, ShowdownError> {
    Err(ShowdownError::Config("no server resolver or address configured".into()))
}

#[cfg(feature = "http")]
fn default_action_client(server_id: &str) -> Option<Arc<showdown_session::ActionClient>> {
    let client = if server_id == crate::config::DEFAULT_SERVER_ID {
        showdown_session::ActionClient::new()
    } else {
        showdown_session::ActionClient::for_server(server_id)
    };
    Some(Arc::new(client))
}

#[cfg(not(feature = "http"))]
fn default_action_client(_server_id: &str) -> Option<Arc<NoActionClient>> {
    None
}

#[cfg(not(feature = "http"))]
enum NoActionClient {}

#[cfg(not(feature = "http"))]
impl CredentialExchange for NoActionClient {
    fn login<'a>(
        &'a self,
        _request: &'a showdown_session::LoginRequest,
    ) -> futures_util::future::BoxFuture<'a, Result<LoginResponse, showdown_session::SessionError>>
    {
        match *self {}
    }
}

#[cfg(not(feature = "http"))]
impl ReplayStore for NoActionClient {
    fn save(
        &self,
        _replay: Value,
    ) -> futures_util::future::BoxFuture<'_, Result<(), showdown_session::SessionError>> {
        match *self {}
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Handle to a showdown client.
///
/// Cheap to clone; every clone shares the same rooms, login state, and
/// output queue. Commands only enqueue and never wait for the network, so
/// they can be called from hooks, periodic tasks, or other tasks.
///
/// One connection is driven at a time by [`run`](Self::run) (or one of its
/// variants). Reconnecting is a matter of calling it again.
#[derive(Clone)]
pub struct Client {
    pub(crate) shared: Arc<Shared>,
}

impl Client {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// The account name, as configured.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// The WebSocket URL resolved at build time.
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    // -- snapshots ----------------------------------------------------------

    /// A copy of room `room_id`, if the client is in it.
    pub async fn room(&self, room_id: &str) -> Option<Room> {
        self.shared.state.lock().await.rooms.get(room_id).cloned()
    }

    /// Ids of every room the client is in.
    pub async fn room_ids(&self) -> Vec<String> {
        let state = self.shared.state.lock().await;
        let mut ids: Vec<String> = state.rooms.ids().map(str::to_string).collect();
        ids.sort();
        ids
    }

    pub async fn auth_state(&self) -> AuthState {
        self.shared.state.lock().await.auth.state()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.shared.state.lock().await.auth.is_logged_in()
    }

    /// The challenge from the current connection, once received.
    pub async fn challenge(&self) -> Option<Challenge> {
        self.shared.state.lock().await.auth.challenge().cloned()
    }

    // -- login --------------------------------------------------------------

    /// Logs in with the configured credentials and the current challenge,
    /// then queues the identity command.
    ///
    /// Called automatically on challenge when `autologin` is set. A
    /// rejected login is returned as an error and not retried.
    pub async fn login(&self) -> Result<LoginResponse, ShowdownError> {
        let exchange = self
            .shared
            .credentials
            .clone()
            .ok_or_else(|| ShowdownError::Config("no credential exchange configured".into()))?;

        let request = self.shared.state.lock().await.auth.begin_login()?;
        tracing::info!(name = %request.name, "logging in");

        let response = match exchange.login(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.shared.state.lock().await.auth.abort_login();
                tracing::warn!(error = %e, "credential exchange failed");
                return Err(e.into());
            }
        };

        let command = self.shared.state.lock().await.auth.complete_login(&response)?;
        tracing::info!(name = %request.name, "login accepted");
        self.enqueue(OutputItem::single(command));
        Ok(response)
    }

    // -- commands -----------------------------------------------------------

    /// Queues a raw output item.
    pub fn enqueue(&self, item: OutputItem) {
        self.shared.output.push(item);
    }

    fn command(&self, command: String) {
        self.enqueue(OutputItem::single(command));
    }

    /// Applies the content length policy.
    ///
    /// Content over the limit is an error in strict mode and is truncated
    /// (with a warning) otherwise. Length is counted in characters.
    pub fn clean_content(&self, content: &str, strict: bool) -> Result<String, ShowdownError> {
        let limit = self.shared.config.message_limit;
        let len = content.chars().count();
        if len <= limit {
            return Ok(content.to_string());
        }
        if strict {
            return Err(ShowdownError::ContentTooLong { len, limit });
        }
        tracing::warn!(len, limit, "message content too long, truncating");
        Ok(content.chars().take(limit).collect())
    }

    pub fn join(&self, room_id: &str) {
        self.command(format!("|/join {}", room_target(room_id)));
    }

    pub fn leave(&self, room_id: &str) {
        self.command(format!("{}|/leave", room_target(room_id)));
    }

    /// Posts `content` in a room.
    pub fn say(&self, room_id: &str, content: &str, strict: bool) -> Result<(), ShowdownError> {
        let content = self.clean_content(content, strict)?;
        self.command(format!("{}|{content}", room_target(room_id)));
        Ok(())
    }

    /// Sends a private message to `user`.
    pub fn private_message(
        &self,
        user: &str,
        content: &str,
        strict: bool,
    ) -> Result<(), ShowdownError> {
        let content = self.clean_content(content, strict)?;
        self.command(format!("|/msg {}, {content}", normalize_id(user)));
        Ok(())
    }

    pub fn set_avatar(&self, avatar: &str) {
        self.command(format!("|/avatar {avatar}"));
    }

    /// Sets the team used for the next challenge or search.
    pub fn upload_team(&self, team: &str) {
        self.command(format!("|/utm {team}"));
    }

    /// Asks the server to validate `team` (or the current team) for
    /// `format_id`.
    pub fn validate_team(&self, team: Option<&str>, format_id: &str) {
        self.enqueue(OutputItem::batch([
            format!("|/utm {}", team.unwrap_or("null")),
            format!("|/vtm {}", normalize_id(format_id)),
        ]));
    }

    /// Enters the ladder queue for `format_id`.
    pub fn search_battles(&self, team: Option<&str>, format_id: &str) {
        self.enqueue(OutputItem::batch([
            format!("|/utm {}", team.unwrap_or("null")),
            format!("|/search {}", normalize_id(format_id)),
        ]));
    }

    pub fn cancel_search(&self) {
        self.command("|/cancelsearch".to_string());
    }

    pub fn forfeit(&self, battle_id: &str) {
        self.command(format!("{battle_id}|/forfeit"));
    }

    /// Asks for a replay of `battle_id`. The server answers with a
    /// `savereplay` query response, which is handed to the replay store.
    pub fn save_replay(&self, battle_id: &str) {
        self.command(format!("{battle_id}|/savereplay"));
    }

    /// Requests the room list (`rooms` query response).
    pub fn query_rooms(&self) {
        self.command("|/cmd rooms".to_string());
    }

    /// Requests ongoing battles in a tier (`roomlist` query response).
    pub fn query_battles(&self, tier: &str, min_elo: Option<u32>) {
        let tier = normalize_id(tier);
        match min_elo {
            Some(elo) => self.command(format!("|/cmd roomlist {tier}, {elo}")),
            None => self.command(format!("|/cmd roomlist {tier}")),
        }
    }

    /// Requests details about a user (`userdetails` query response).
    pub fn request_user_details(&self, user: &str) {
        self.command(format!("|/cmd userdetails {}", normalize_id(user)));
    }

    pub fn request_room_auth(&self, room_id: &str) {
        self.command(format!("{room_id}|/roomauth"));
    }

    // -- replays ------------------------------------------------------------

    /// Hands a replay to the replay store without waiting for it.
    pub(crate) fn store_replay(&self, replay: Value) {
        let Some(store) = self.shared.replays.clone() else {
            tracing::debug!("no replay store configured, replay dropped");
            return;
        };
        tokio::spawn(async move {
            match store.save(replay).await {
                Ok(()) => tracing::info!("replay uploaded"),
                Err(e) => tracing::warn!(error = %e, "replay upload failed"),
            }
        });
    }

    // -- connection ---------------------------------------------------------

    /// Connects over WebSocket and runs until the connection ends.
    pub async fn run<H: Hooks>(&self, hooks: &mut H) -> Result<(), ShowdownError> {
        self.connect_with(&showdown_transport::WebSocketConnector, hooks)
            .await
    }

    /// Connects with `connector` and runs until the connection ends.
    pub async fn connect_with<K, H>(
        &self,
        connector: &K,
        hooks: &mut H,
    ) -> Result<(), ShowdownError>
    where
        K: Connector,
        H: Hooks,
    {
        tracing::info!(url = %self.shared.url, "connecting");
        let conn = connector.connect(&self.shared.url).await?;
        self.run_on(conn, hooks).await
    }

    /// Runs the client over an already open connection.
    ///
    /// Starts the receive loop, the output drain, and every periodic task.
    /// Returns when the first of them finishes: `Ok` if the server closed
    /// the connection, the error otherwise. All the others are cancelled
    /// and the connection is closed before this returns.
    pub async fn run_on<C, H>(&self, conn: C, hooks: &mut H) -> Result<(), ShowdownError>
    where
        C: Connection,
        H: Hooks,
    {
        let conn_id = conn.id();
        {
            let mut state = self.shared.state.lock().await;
            state.auth.validate()?;
            state.auth.on_connected();
            state.rooms.clear();
        }
        tracing::info!(%conn_id, url = %self.shared.url, "connection open");

        let result = {
            let mut group = TaskGroup::new();
            group
                .register("receiver", Duration::ZERO, Receiver::new(&conn, self, hooks))
                .register(
                    "sender",
                    Duration::ZERO,
                    Drain::new(&conn, &self.shared.output, self.shared.config.per_command_delay),
                );
            for task in &self.shared.tasks {
                let client = self.clone();
                let work = Arc::clone(&task.work);
                group.register(
                    task.name.clone(),
                    task.interval,
                    from_fn(move || {
                        let run = work(client.clone());
                        async move { run.await.map(|()| ControlFlow::Continue(())) }
                    }),
                );
            }

            match group.run().await {
                Some(exit) => {
                    tracing::info!(
                        %conn_id,
                        task = %exit.task,
                        cancelled = ?exit.cancelled,
                        "connection tasks stopped"
                    );
                    exit.result
                }
                None => Ok(()),
            }
        };

        if let Err(e) = conn.close().await {
            tracing::debug!(%conn_id, error = %e, "close failed");
        }
        self.shared.state.lock().await.auth.on_disconnected();

        match &result {
            Ok(()) => tracing::info!(%conn_id, "connection closed"),
            Err(e) => tracing::warn!(%conn_id, error = %e, "connection failed"),
        }
        result
    }
}

/// The lobby is addressed with an empty room id on the way out.
fn room_target(room_id: &str) -> &str {
    if normalize_id(room_id) == DEFAULT_ROOM {
        ""
    } else {
        room_id
    }
}
