//! Unified error type for the showdown client.

use showdown_protocol::ProtocolError;
use showdown_session::SessionError;
use showdown_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each wrapped variant generates `From`
/// impls, so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ShowdownError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A decode error: the server sent something unreadable.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An authentication or collaborator error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Outbound content exceeded the length limit in strict mode.
    #[error("message content is {len} characters long, limit is {limit}")]
    ContentTooLong { len: usize, limit: usize },

    /// The client was built or used with an unusable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A hook or periodic task failed.
    #[error("hook failed: {0}")]
    Hook(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ShowdownError {
    /// Wraps any error raised by user code in a hook or periodic task.
    pub fn hook<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Hook(err.into())
    }
}
