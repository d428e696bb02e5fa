//! Room state and the event fold that drives it.

use std::collections::{HashMap, VecDeque};

use showdown_protocol::{normalize_id, parse_event, Event};

use crate::{Battle, RoomConfig, User};

/// What kind of room this is, decided by its `init` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomKind {
    /// A chat room.
    Chat,
    /// A battle room with its match metadata.
    Battle(Battle),
}

impl RoomKind {
    /// Maps the parameter of an `init` event to a room kind.
    ///
    /// `battle` creates a battle; anything else is treated as chat.
    pub fn from_init(kind: &str) -> Self {
        match kind {
            "battle" => Self::Battle(Battle::default()),
            _ => Self::Chat,
        }
    }
}

/// One joined room, built up from the events the server sends for it.
#[derive(Debug, Clone)]
pub struct Room {
    id: String,
    title: Option<String>,
    logs: VecDeque<String>,
    max_logs: usize,
    users: HashMap<String, User>,
    kind: RoomKind,
}

impl Room {
    /// Creates an empty room.
    pub fn new(id: impl Into<String>, kind: RoomKind, config: &RoomConfig) -> Self {
        Self {
            id: id.into(),
            title: None,
            logs: VecDeque::with_capacity(config.max_logs.min(256)),
            max_logs: config.max_logs,
            users: HashMap::new(),
            kind,
        }
    }

    /// Creates an empty chat room.
    pub fn chat(id: impl Into<String>, config: &RoomConfig) -> Self {
        Self::new(id, RoomKind::Chat, config)
    }

    /// Creates an empty battle room.
    pub fn battle(id: impl Into<String>, config: &RoomConfig) -> Self {
        Self::new(id, RoomKind::Battle(Battle::default()), config)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Raw event lines, oldest first.
    pub fn logs(&self) -> impl Iterator<Item = &str> {
        self.logs.iter().map(String::as_str)
    }

    /// Current occupants keyed by user id.
    pub fn users(&self) -> &HashMap<String, User> {
        &self.users
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn kind(&self) -> &RoomKind {
        &self.kind
    }

    /// The battle state, if this is a battle room.
    pub fn battle_state(&self) -> Option<&Battle> {
        match &self.kind {
            RoomKind::Battle(battle) => Some(battle),
            RoomKind::Chat => None,
        }
    }

    pub fn is_battle(&self) -> bool {
        matches!(self.kind, RoomKind::Battle(_))
    }

    /// Records a raw line in the log, then folds it into the room state.
    pub fn add_content(&mut self, line: &str) {
        self.push_log(line);
        self.apply_event(&parse_event(line));
    }

    /// Folds an already-parsed event into the room state.
    pub fn apply_event(&mut self, event: &Event) {
        self.apply(&event.kind, &event.params);
    }

    /// Folds one event into the room state.
    ///
    /// Unknown event types are ignored. Events missing a parameter their
    /// type needs are skipped with a debug log.
    pub fn apply<S: AsRef<str>>(&mut self, kind: &str, params: &[S]) {
        let param = |i: usize| params.get(i).map(AsRef::as_ref);

        match (kind, param(0)) {
            ("title", Some(title)) => self.title = Some(title.to_string()),
            ("users", Some(roster)) => {
                // The first entry is the occupant count.
                for entry in roster.split(',').skip(1) {
                    self.add_user(entry);
                }
            }
            ("n", Some(name)) => match param(1) {
                Some(old_id) => {
                    self.remove_user(old_id);
                    self.add_user(name);
                }
                None => self.skip(kind),
            },
            ("l", Some(name)) => {
                self.remove_user(name);
            }
            ("j", Some(name)) => self.add_user(name),
            ("title" | "users" | "n" | "l" | "j", None) => self.skip(kind),
            _ => {}
        }

        if let RoomKind::Battle(battle) = &mut self.kind {
            battle.apply(&self.id, kind, params);
        }
    }

    /// Adds (or replaces) the occupant named by a raw protocol name.
    pub fn add_user(&mut self, name: &str) {
        let user = User::new(name);
        self.users.insert(user.id().to_string(), user);
    }

    /// Removes the occupant whose id matches `name` once normalized.
    pub fn remove_user(&mut self, name: &str) -> Option<User> {
        self.users.remove(&normalize_id(name))
    }

    fn push_log(&mut self, line: &str) {
        if self.max_logs == 0 {
            return;
        }
        while self.logs.len() >= self.max_logs {
            self.logs.pop_front();
        }
        self.logs.push_back(line.to_string());
    }

    fn skip(&self, kind: &str) {
        tracing::debug!(room_id = %self.id, kind, "event missing parameters, skipped");
    }
}

impl PartialEq for Room {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Room {}
