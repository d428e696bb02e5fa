//! The login handshake as a state machine.
//!
//! ```text
//!   Disconnected ──(connect)──→ Connected ──(challenge)──→ Challenged
//!        ↑                                                  │     ↑
//!        │                                    (begin_login) │     │ (rejected / failed)
//!        │                                                  ↓     │
//!        └──────(disconnect, from any state)──────── Authenticating
//!                                                           │
//!                                          (complete_login) ↓
//!                                                        LoggedIn
//! ```
//!
//! `Connected` and `Challenged` are resting states for anonymous clients.
//! This type does no I/O: the caller runs the credential exchange between
//! [`AuthSession::begin_login`] and [`AuthSession::complete_login`].

use std::fmt;

use crate::{LoginRequest, LoginResponse, SessionError};

/// Where the connection is in the login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Disconnected,
    Connected,
    /// A challenge has been received; logging in is possible.
    Challenged,
    /// The credential exchange is in flight.
    Authenticating,
    LoggedIn,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Challenged => "challenged",
            Self::Authenticating => "authenticating",
            Self::LoggedIn => "logged in",
        })
    }
}

/// The opaque pair the server hands out for a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub key_id: String,
    pub token: String,
}

impl Challenge {
    pub fn new(key_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            token: token.into(),
        }
    }

    /// The combined `key_id|token` form the credential exchange expects.
    pub fn combined(&self) -> String {
        format!("{}|{}", self.key_id, self.token)
    }
}

/// Account name and password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub name: String,
    pub password: String,
}

impl Credentials {
    /// Returns `None` unless both parts are non-empty.
    pub fn from_parts(name: &str, password: &str) -> Option<Self> {
        if name.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            password: password.to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login state for one connection.
#[derive(Debug, Clone)]
pub struct AuthSession {
    state: AuthState,
    challenge: Option<Challenge>,
    credentials: Option<Credentials>,
    autologin: bool,
}

impl AuthSession {
    pub fn new(credentials: Option<Credentials>, autologin: bool) -> Self {
        Self {
            state: AuthState::Disconnected,
            challenge: None,
            credentials,
            autologin,
        }
    }

    /// Fails with [`SessionError::MissingCredentials`] when auto-login is
    /// requested without credentials. Checked before connecting.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.autologin && self.credentials.is_none() {
            return Err(SessionError::MissingCredentials);
        }
        Ok(())
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn autologin(&self) -> bool {
        self.autologin
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == AuthState::LoggedIn
    }

    /// The transport is open.
    pub fn on_connected(&mut self) {
        self.state = AuthState::Connected;
        self.challenge = None;
    }

    /// Records the server's challenge. Returns whether an automatic login
    /// should start now.
    pub fn on_challenge(
        &mut self,
        key_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<bool, SessionError> {
        self.challenge = Some(Challenge::new(key_id, token));
        if self.state != AuthState::LoggedIn {
            self.state = AuthState::Challenged;
        }
        if !self.autologin {
            return Ok(false);
        }
        self.validate()?;
        Ok(true)
    }

    /// Starts a login, returning what to hand the credential exchange.
    pub fn begin_login(&mut self) -> Result<LoginRequest, SessionError> {
        let challenge = self
            .challenge
            .clone()
            .ok_or(SessionError::ChallengeNotReceived)?;
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(SessionError::MissingCredentials)?;
        if self.state == AuthState::Authenticating {
            return Err(SessionError::InvalidState(self.state));
        }

        self.state = AuthState::Authenticating;
        Ok(LoginRequest {
            name: credentials.name.clone(),
            password: credentials.password.clone(),
            challenge,
        })
    }

    /// Finishes a login with the exchange's answer. On success returns
    /// the identity command to send to the server.
    pub fn complete_login(&mut self, response: &LoginResponse) -> Result<String, SessionError> {
        let name = self
            .credentials
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_default();

        match (&response.assertion, response.success) {
            (Some(assertion), true) => {
                self.state = AuthState::LoggedIn;
                Ok(format!("|/trn {name},0,{assertion}"))
            }
            _ => {
                self.state = AuthState::Challenged;
                Err(SessionError::LoginRejected {
                    name,
                    raw: response.raw.to_string(),
                })
            }
        }
    }

    /// The exchange itself failed; fall back to the challenged state.
    pub fn abort_login(&mut self) {
        if self.state == AuthState::Authenticating {
            self.state = AuthState::Challenged;
        }
    }

    /// The transport closed. The challenge dies with the connection.
    pub fn on_disconnected(&mut self) {
        self.state = AuthState::Disconnected;
        self.challenge = None;
    }
}
