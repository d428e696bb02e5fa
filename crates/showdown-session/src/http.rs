//! HTTP implementations of the session collaborators, via `reqwest`.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    parse_action_response, CredentialExchange, LoginRequest, LoginResponse,
    ReplayStore, ServerAddress, ServerResolver, SessionError,
};

/// Directory of per-server JSON descriptors (`{base}/{id}.json`).
pub const DEFAULT_SERVERS_URL: &str = "https://pokemonshowdown.com/servers";

/// Action endpoint used for logins and replay uploads.
pub const DEFAULT_ACTION_URL: &str = "https://play.pokemonshowdown.com/action.php";

fn http_error(e: reqwest::Error) -> SessionError {
    SessionError::Http(Box::new(e))
}

// ---------------------------------------------------------------------------
// Server resolution
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ServerInfo {
    host: String,
    port: u16,
}

/// Looks servers up in the public server directory.
#[derive(Debug, Clone)]
pub struct HttpServerResolver {
    http: reqwest::Client,
    base_url: String,
}

impl HttpServerResolver {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_SERVERS_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for HttpServerResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerResolver for HttpServerResolver {
    fn resolve<'a>(
        &'a self,
        server_id: &'a str,
    ) -> BoxFuture<'a, Result<ServerAddress, SessionError>> {
        async move {
            let url = format!("{}/{}.json", self.base_url.trim_end_matches('/'), server_id);
            tracing::debug!(%url, "resolving server");
            let info: ServerInfo = self
                .http
                .get(&url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(http_error)?
                .json()
                .await
                .map_err(http_error)?;
            let address = ServerAddress::sockjs(info.host, info.port);
            tracing::info!(server_id, url = %address.websocket_url(), "server resolved");
            Ok(address)
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Action endpoint: login and replay upload
// ---------------------------------------------------------------------------

/// Client for the action endpoint, which answers `]`-prefixed JSON.
#[derive(Debug, Clone)]
pub struct ActionClient {
    http: reqwest::Client,
    action_url: String,
}

impl ActionClient {
    pub fn new() -> Self {
        Self::with_action_url(DEFAULT_ACTION_URL)
    }

    /// Action endpoint scoped to a non-default server.
    pub fn for_server(server_id: &str) -> Self {
        Self::with_action_url(format!(
            "https://play.pokemonshowdown.com/~~{server_id}/action.php"
        ))
    }

    pub fn with_action_url(action_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            action_url: action_url.into(),
        }
    }

    async fn post(&self, form: &[(String, String)]) -> Result<String, SessionError> {
        self.http
            .post(&self.action_url)
            .form(form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(http_error)?
            .text()
            .await
            .map_err(http_error)
    }
}

impl Default for ActionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialExchange for ActionClient {
    fn login<'a>(
        &'a self,
        request: &'a LoginRequest,
    ) -> BoxFuture<'a, Result<LoginResponse, SessionError>> {
        async move {
            let form = [
                ("act".to_string(), "login".to_string()),
                ("name".to_string(), request.name.clone()),
                ("pass".to_string(), request.password.clone()),
                ("challstr".to_string(), request.challenge.combined()),
            ];
            let body = self.post(&form).await?;
            let raw = parse_action_response(&body)?;
            Ok(LoginResponse::from_value(raw))
        }
        .boxed()
    }
}

impl ReplayStore for ActionClient {
    fn save(&self, replay: Value) -> BoxFuture<'_, Result<(), SessionError>> {
        async move {
            let mut form = vec![("act".to_string(), "uploadreplay".to_string())];
            if let Value::Object(fields) = replay {
                for (key, value) in fields {
                    let value = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    form.push((key, value));
                }
            }
            let body = self.post(&form).await?;
            tracing::debug!(response = %body.trim(), "replay uploaded");
            Ok(())
        }
        .boxed()
    }
}
