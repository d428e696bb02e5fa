//! Session authentication for the showdown client.
//!
//! This crate handles everything about *who* the client is:
//!
//! 1. **Handshake state** — tracking the challenge the server sends and
//!    driving the login state machine ([`AuthSession`])
//! 2. **Collaborators** — the out-of-band services the handshake relies
//!    on, behind traits so they can be swapped or mocked:
//!    [`ServerResolver`], [`CredentialExchange`], [`ReplayStore`]
//! 3. **HTTP implementations** of those traits (feature `http`, on by
//!    default)
//!
//! # How it fits in the stack
//!
//! ```text
//! Client (above)  ← feeds challenge events in, sends the identity command out
//!     ↕
//! Session layer (this crate)  ← login state + collaborators
//!     ↕
//! HTTP (beside)  ← credential exchange, server lookup, replay upload
//! ```

mod address;
mod auth;
mod collab;
mod error;
#[cfg(feature = "http")]
mod http;

pub use address::{ServerAddress, StaticResolver};
pub use auth::{AuthSession, AuthState, Challenge, Credentials};
pub use collab::{
    parse_action_response, CredentialExchange, LoginRequest, LoginResponse,
    ReplayStore, ServerResolver,
};
pub use error::SessionError;
#[cfg(feature = "http")]
pub use http::{ActionClient, HttpServerResolver, DEFAULT_ACTION_URL, DEFAULT_SERVERS_URL};
