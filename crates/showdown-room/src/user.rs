//! User records.

use std::fmt;
use std::hash::{Hash, Hasher};

use showdown_protocol::normalize_id;

/// A user as seen in a room roster or a message.
///
/// Two users are equal when their ids match, whatever decoration their
/// display names carry.
#[derive(Debug, Clone, Eq)]
pub struct User {
    id: String,
    name: String,
}

impl User {
    /// Builds a user from a raw protocol name such as `"+Zarel"`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: normalize_id(&name),
            name,
        }
    }

    /// The normalized id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The display name exactly as the server sent it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `name` is this user's current display name, verbatim.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name == name
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
