//! Client configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default server id.
pub const DEFAULT_SERVER_ID: &str = "showdown";

/// Everything a [`Client`](crate::Client) is configured with.
///
/// Fields missing from a deserialized config take their defaults.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Account name. Empty for an anonymous client.
    pub name: String,
    /// Account password. Empty for an anonymous client.
    pub password: String,
    /// Server to connect to, e.g. `showdown`.
    pub server_id: String,
    /// Log in automatically once the server sends its challenge.
    pub autologin: bool,
    /// Raw event lines kept per room.
    pub max_room_logs: usize,
    /// Pause after each outbound frame, per command bundled in it.
    pub per_command_delay: Duration,
    /// Longest chat or private message content, in characters.
    pub message_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            password: String::new(),
            server_id: DEFAULT_SERVER_ID.to_string(),
            autologin: true,
            max_room_logs: 5000,
            per_command_delay: Duration::from_millis(500),
            message_limit: 300,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("server_id", &self.server_id)
            .field("autologin", &self.autologin)
            .field("max_room_logs", &self.max_room_logs)
            .field("per_command_delay", &self.per_command_delay)
            .field("message_limit", &self.message_limit)
            .finish()
    }
}
