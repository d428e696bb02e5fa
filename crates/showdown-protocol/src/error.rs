//! Error types for the protocol layer.
//!
//! Every variant here is a *decode error*: the peer sent something this
//! client cannot interpret. The receive loop treats them as fatal, which
//! ends the connection.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame is neither the connect sentinel nor an array frame.
    ///
    /// Holds (a prefix of) the offending frame for diagnostics.
    #[error("unexpected frame: {0:?}")]
    UnexpectedFrame(String),

    /// The frame looked like an array frame but its JSON body did not
    /// decode into a list of strings.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// Encoding an outbound frame failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// An event is missing a parameter its type requires.
    #[error("malformed {kind} event: missing parameter {index}")]
    MalformedEvent {
        /// The event type, e.g. `challstr`.
        kind: String,
        /// Zero-based index of the missing parameter.
        index: usize,
    },
}
