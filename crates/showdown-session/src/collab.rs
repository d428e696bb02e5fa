//! External collaborators of the session.
//!
//! The client never talks HTTP itself. Resolving a server id to an
//! address, trading a challenge for an identity assertion, and uploading
//! replays are delegated to these traits. The futures are boxed so the
//! client can hold collaborators as trait objects.

use futures_util::future::BoxFuture;
use serde::Deserialize;
use serde_json::Value;

use crate::{Challenge, ServerAddress, SessionError};

/// Resolves a human-readable server id to a connection address.
pub trait ServerResolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        server_id: &'a str,
    ) -> BoxFuture<'a, Result<ServerAddress, SessionError>>;
}

/// Everything the credential exchange needs for one login.
#[derive(Clone)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
    pub challenge: Challenge,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// The credential exchange's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    /// Whether the exchange accepted the credentials.
    pub success: bool,
    /// Proof of identity to present back to the server.
    pub assertion: Option<String>,
    /// The full response document.
    pub raw: Value,
}

#[derive(Deserialize)]
struct LoginFields {
    #[serde(default)]
    actionsuccess: bool,
    #[serde(default)]
    assertion: Option<String>,
}

impl LoginResponse {
    /// Reads the success flag and assertion out of a response document.
    /// Missing fields count as failure.
    pub fn from_value(raw: Value) -> Self {
        let fields = LoginFields::deserialize(&raw).unwrap_or(LoginFields {
            actionsuccess: false,
            assertion: None,
        });
        Self {
            success: fields.actionsuccess,
            assertion: fields.assertion,
            raw,
        }
    }
}

/// Trades credentials plus a challenge for an identity assertion.
pub trait CredentialExchange: Send + Sync {
    fn login<'a>(
        &'a self,
        request: &'a LoginRequest,
    ) -> BoxFuture<'a, Result<LoginResponse, SessionError>>;
}

/// Persists a replay handed over by a `savereplay` query response.
pub trait ReplayStore: Send + Sync {
    fn save(&self, replay: Value) -> BoxFuture<'_, Result<(), SessionError>>;
}

/// Decodes an action endpoint body: a `]` followed by a JSON document.
pub fn parse_action_response(body: &str) -> Result<Value, SessionError> {
    let Some(json) = body.strip_prefix(']') else {
        return Err(SessionError::UnexpectedResponse(
            body.chars().take(64).collect(),
        ));
    };
    Ok(serde_json::from_str(json)?)
}
