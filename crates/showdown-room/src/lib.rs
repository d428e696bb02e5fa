//! Room and battle state for the showdown client.
//!
//! Rooms are not actors here: each one is a plain value folded forward
//! by the events the server sends for it. The session owns every room
//! through a [`RoomRegistry`] and is the only thing that mutates them.
//!
//! # Key types
//!
//! - [`User`] — a display name plus its normalized id
//! - [`Room`] — title, occupancy, and a bounded event log
//! - [`Battle`] — the battle-specific part of a room (players, tier, outcome)
//! - [`RoomRegistry`] — the owned `room id → Room` map
//! - [`RoomConfig`] — per-room settings (log capacity)

mod battle;
mod config;
mod registry;
mod room;
mod user;

pub use battle::{Battle, Outcome, PlayerSlot};
pub use config::RoomConfig;
pub use registry::RoomRegistry;
pub use room::{Room, RoomKind};
pub use user::User;
