//! The session-owned map of joined rooms.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::{Room, RoomConfig, RoomKind};

/// Owns every room the session has been told about.
///
/// Rooms are created by `init` events and dropped by `deinit` events;
/// nothing else inserts or removes entries.
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    config: RoomConfig,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Creates (or re-creates) room `id` with the kind named by its `init`
    /// event, replacing any previous state under the same id.
    pub fn init(&mut self, id: &str, kind: &str) -> &mut Room {
        let room = Room::new(id, RoomKind::from_init(kind), &self.config);
        match self.rooms.entry(id.to_string()) {
            Entry::Occupied(mut slot) => {
                tracing::debug!(room_id = id, kind, "room re-initialized, previous state dropped");
                slot.insert(room);
                slot.into_mut()
            }
            Entry::Vacant(slot) => {
                tracing::info!(room_id = id, kind, "room initialized");
                slot.insert(room)
            }
        }
    }

    /// Removes room `id`, returning its final state.
    pub fn deinit(&mut self, id: &str) -> Option<Room> {
        let room = self.rooms.remove(id);
        if room.is_some() {
            tracing::info!(room_id = id, rooms = self.rooms.len(), "room deinitialized");
        }
        room
    }

    /// Logs `line` in room `id` and folds it into that room's state.
    /// Lines for rooms that were never initialized are ignored.
    pub fn route(&mut self, id: &str, line: &str) -> bool {
        match self.rooms.get_mut(id) {
            Some(room) => {
                room.add_content(line);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rooms.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Drops every room. Called when a new connection starts.
    pub fn clear(&mut self) {
        self.rooms.clear();
    }
}
