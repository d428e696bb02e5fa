//! Embedder callbacks.
//!
//! Every hook runs inside the receive loop, in arrival order, and may
//! enqueue commands through the [`Client`] it is given. A hook that
//! returns an error ends the connection.

use showdown_protocol::Event;
use showdown_room::Room;
use showdown_session::LoginResponse;

use crate::{ChatMessage, Client, PrivateMessage, QueryResponse, ShowdownError};

/// Reactions to server traffic. Every method defaults to doing nothing.
///
/// Room hooks receive a snapshot of the room taken after the event was
/// applied; the live registry is never locked while a hook runs.
///
/// # Example
///
/// ```rust,ignore
/// struct Greeter;
///
/// impl Hooks for Greeter {
///     async fn on_room_init(
///         &mut self,
///         client: &Client,
///         room: &Room,
///     ) -> Result<(), ShowdownError> {
///         client.say(room.id(), "hello!", false)
///     }
/// }
/// ```
pub trait Hooks {
    /// The transport is open (the server's connect frame arrived).
    async fn on_connect(&mut self, _client: &Client) -> Result<(), ShowdownError> {
        Ok(())
    }

    /// An automatic login went through.
    async fn on_login(
        &mut self,
        _client: &Client,
        _response: &LoginResponse,
    ) -> Result<(), ShowdownError> {
        Ok(())
    }

    /// The client joined a room.
    async fn on_room_init(&mut self, _client: &Client, _room: &Room) -> Result<(), ShowdownError> {
        Ok(())
    }

    /// The client left a room. `room` is its final state.
    async fn on_room_deinit(
        &mut self,
        _client: &Client,
        _room: &Room,
    ) -> Result<(), ShowdownError> {
        Ok(())
    }

    async fn on_query_response(
        &mut self,
        _client: &Client,
        _response: &QueryResponse,
    ) -> Result<(), ShowdownError> {
        Ok(())
    }

    async fn on_chat_message(
        &mut self,
        _client: &Client,
        _message: &ChatMessage,
    ) -> Result<(), ShowdownError> {
        Ok(())
    }

    async fn on_private_message(
        &mut self,
        _client: &Client,
        _message: &PrivateMessage,
    ) -> Result<(), ShowdownError> {
        Ok(())
    }

    /// Every event, after the specific hook for it (if any) has run.
    async fn on_receive(
        &mut self,
        _client: &Client,
        _room_id: &str,
        _event: &Event,
    ) -> Result<(), ShowdownError> {
        Ok(())
    }
}

/// Hooks that ignore everything.
impl Hooks for () {}
