//! Room configuration.

use serde::{Deserialize, Serialize};

/// Configuration shared by every room a session creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// How many raw event lines each room keeps. The oldest line is
    /// evicted once the log is full. `0` disables logging.
    pub max_logs: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { max_logs: 5000 }
    }
}

impl RoomConfig {
    /// Creates a config with the given log capacity.
    pub fn with_max_logs(max_logs: usize) -> Self {
        Self { max_logs }
    }
}
