//! Values handed to hooks for chat, private messages, and query results.

use serde_json::Value;
use showdown_protocol::{Event, ProtocolError};
use showdown_room::User;

/// A chat line posted in a room (`c` or `c:` events).
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub room_id: String,
    pub author: User,
    pub content: String,
    /// Server timestamp, present on `c:` lines.
    pub timestamp: Option<i64>,
}

impl ChatMessage {
    pub(crate) fn from_event(room_id: &str, event: &Event) -> Result<Self, ProtocolError> {
        Ok(Self {
            room_id: room_id.to_string(),
            author: User::new(event.param(0)?),
            content: event.rest(1),
            timestamp: event.timestamp,
        })
    }
}

/// A private message (`|pm|sender|recipient|content`).
///
/// Messages the client sent itself are echoed back by the server and are
/// delivered here too; compare `author` with the client's own id to skip
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateMessage {
    pub author: User,
    pub recipient: User,
    pub content: String,
}

impl PrivateMessage {
    pub(crate) fn from_event(event: &Event) -> Result<Self, ProtocolError> {
        Ok(Self {
            author: User::new(event.param(0)?),
            recipient: User::new(event.param(1)?),
            content: event.rest(2),
        })
    }

    /// Whether the message was written by `user_id` (compared normalized).
    pub fn is_from(&self, user_id: &str) -> bool {
        self.author.id() == showdown_protocol::normalize_id(user_id)
    }
}

/// A structured answer to a `/cmd` query (`|queryresponse|kind|json`).
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub kind: String,
    pub data: Value,
}

impl QueryResponse {
    pub(crate) fn from_event(event: &Event) -> Result<Self, ProtocolError> {
        let kind = event.param(0)?.to_string();
        let data = serde_json::from_str(&event.rest(1)).map_err(ProtocolError::Decode)?;
        Ok(Self { kind, data })
    }
}
