//! Error types for the session layer.

/// Errors that can occur while authenticating or talking to the
/// out-of-band collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Auto-login was requested but no name and password are configured.
    #[error(
        "cannot log in without a name and password; disable auto-login to stay anonymous"
    )]
    MissingCredentials,

    /// A login was attempted before the server sent its challenge.
    #[error("cannot log in: no challenge has been received yet")]
    ChallengeNotReceived,

    /// A login is already in flight. Logging in again once logged in is
    /// allowed and switches the identity.
    #[error("cannot log in while {0}")]
    InvalidState(crate::AuthState),

    /// The credential exchange answered, but refused the login.
    #[error("failed to log in as {name:?}; raw login result: {raw}")]
    LoginRejected {
        /// The name the login was attempted for.
        name: String,
        /// The response body exactly as received.
        raw: String,
    },

    /// A collaborator answered with something that is not the expected
    /// `]`-prefixed JSON document.
    #[error("unexpected response: {0:?}")]
    UnexpectedResponse(String),

    /// A collaborator's JSON could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// The HTTP request itself failed.
    #[error("http request failed: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),
}
